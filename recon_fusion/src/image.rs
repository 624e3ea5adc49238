//! Images consumed by a reconstruction pass.

use recon_core::{decode_depth, encode_depth, VoxelClass};

use crate::error::{FusionError, Result};

/// Integer pixel position, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl PixelCoord {
    /// Create a new PixelCoord.
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Row-major image (`[y * width + x]`).
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: u32,
    height: u32,
    pixels: Vec<T>,
}

/// Four-channel fixed-point encoded depth.
pub type EncodedDepthImage = Image<[f32; 4]>;

/// Per-pixel Live / Reference / Empty labels.
pub type ClassificationImage = Image<VoxelClass>;

impl<T: Clone + Default> Image<T> {
    /// Create an image filled with `T::default()`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![T::default(); width as usize * height as usize],
        }
    }
}

impl<T> Image<T> {
    /// Wrap an existing pixel buffer.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<T>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(FusionError::PixelBufferLength {
                expected,
                got: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True if the image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Pixel at `coord`, if inside.
    #[inline]
    pub fn get(&self, coord: PixelCoord) -> Option<&T> {
        if coord.x < self.width && coord.y < self.height {
            self.pixels.get(coord.y as usize * self.width as usize + coord.x as usize)
        } else {
            None
        }
    }

    /// Overwrite the pixel at `coord`; out-of-range writes are ignored.
    #[inline]
    pub fn set(&mut self, coord: PixelCoord, value: T) {
        if coord.x < self.width && coord.y < self.height {
            let idx = coord.y as usize * self.width as usize + coord.x as usize;
            self.pixels[idx] = value;
        }
    }

    /// Raw pixel buffer.
    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }
}

impl Image<VoxelClass> {
    /// Decode a colour classification image (red > 0 is Reference,
    /// blue > 0 is Live).
    pub fn from_rgba(width: u32, height: u32, rgba: &[[f32; 4]]) -> Result<Self> {
        Self::from_pixels(
            width,
            height,
            rgba.iter().copied().map(VoxelClass::from_rgba).collect(),
        )
    }

    /// Class at `coord`; Empty outside the image.
    #[inline]
    pub fn class_at(&self, coord: PixelCoord) -> VoxelClass {
        self.get(coord).copied().unwrap_or_default()
    }

    /// Number of pixels carrying `class`.
    pub fn count(&self, class: VoxelClass) -> usize {
        self.pixels.iter().filter(|c| **c == class).count()
    }
}

impl Image<[f32; 4]> {
    /// Encode a row-major buffer of world-unit depths.
    pub fn from_depths(width: u32, height: u32, depths: &[f32], depth_factor: f32) -> Result<Self> {
        Self::from_pixels(
            width,
            height,
            depths.iter().map(|&d| encode_depth(d, depth_factor)).collect(),
        )
    }

    /// Decoded depth at `coord`, if inside.
    #[inline]
    pub fn depth_at(&self, coord: PixelCoord, depth_factor: f32) -> Option<f32> {
        self.get(coord).map(|&rgba| decode_depth(rgba, depth_factor))
    }
}

/// One frame of sensor input: two depth images and the classification
/// that selects between them.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFrame {
    /// Depth seen by the live sensor.
    pub live: EncodedDepthImage,
    /// Depth of the reference reconstruction.
    pub reference: EncodedDepthImage,
    /// Difference classification.
    pub classification: ClassificationImage,
}

impl SensorFrame {
    /// Bundle three images, checking that their sizes agree.
    pub fn new(
        live: EncodedDepthImage,
        reference: EncodedDepthImage,
        classification: ClassificationImage,
    ) -> Result<Self> {
        let frame = Self {
            live,
            reference,
            classification,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Check that both depth images match the classification size.
    pub fn validate(&self) -> Result<()> {
        let expected = self.classification.dimensions();
        for (name, image) in [("live", &self.live), ("reference", &self.reference)] {
            if image.dimensions() != expected {
                return Err(FusionError::ImageSizeMismatch {
                    image: name,
                    expected,
                    got: image.dimensions(),
                });
            }
        }
        Ok(())
    }

    /// `(width, height)` of the frame.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.classification.dimensions()
    }

    /// Depth image selected by a class: Live reads the live image, anything
    /// else the reference image.
    #[inline]
    pub fn depth_for(&self, class: VoxelClass) -> &EncodedDepthImage {
        match class {
            VoxelClass::Live => &self.live,
            VoxelClass::Reference | VoxelClass::Empty => &self.reference,
        }
    }

    /// Measured depth at a pixel for the given class.
    #[inline]
    pub fn measured_depth(
        &self,
        class: VoxelClass,
        coord: PixelCoord,
        depth_factor: f32,
    ) -> Option<f32> {
        self.depth_for(class).depth_at(coord, depth_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::DEFAULT_DEPTH_FACTOR;

    #[test]
    fn test_image_access() {
        let mut image: ClassificationImage = Image::new(4, 3);
        image.set(PixelCoord::new(3, 2), VoxelClass::Live);
        image.set(PixelCoord::new(4, 0), VoxelClass::Live);
        assert_eq!(image.class_at(PixelCoord::new(3, 2)), VoxelClass::Live);
        assert_eq!(image.class_at(PixelCoord::new(9, 9)), VoxelClass::Empty);
        assert_eq!(image.count(VoxelClass::Live), 1);
        assert_eq!(image.pixels()[11], VoxelClass::Live);
    }

    #[test]
    fn test_buffer_length_checked() {
        let err = EncodedDepthImage::from_pixels(2, 2, vec![[0.0; 4]; 3]).unwrap_err();
        assert!(matches!(
            err,
            FusionError::PixelBufferLength {
                expected: 4,
                got: 3
            }
        ));
    }

    #[test]
    fn test_from_rgba() {
        let rgba = [[1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.5, 1.0], [0.0; 4], [0.2, 0.0, 0.9, 1.0]];
        let image = ClassificationImage::from_rgba(2, 2, &rgba).unwrap();
        assert_eq!(image.count(VoxelClass::Reference), 2);
        assert_eq!(image.count(VoxelClass::Live), 1);
        assert_eq!(image.count(VoxelClass::Empty), 1);
    }

    #[test]
    fn test_frame_selects_depth() {
        let live = EncodedDepthImage::from_depths(1, 1, &[1.5], DEFAULT_DEPTH_FACTOR).unwrap();
        let reference = EncodedDepthImage::from_depths(1, 1, &[4.0], DEFAULT_DEPTH_FACTOR).unwrap();
        let frame = SensorFrame::new(live, reference, Image::new(1, 1)).unwrap();
        let p = PixelCoord::new(0, 0);
        let d = frame.measured_depth(VoxelClass::Live, p, DEFAULT_DEPTH_FACTOR).unwrap();
        assert!((d - 1.5).abs() < 1e-3);
        let d = frame.measured_depth(VoxelClass::Reference, p, DEFAULT_DEPTH_FACTOR).unwrap();
        assert!((d - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_frame_size_mismatch() {
        let err = SensorFrame::new(Image::new(2, 2), Image::new(2, 3), Image::new(2, 2)).unwrap_err();
        assert!(matches!(
            err,
            FusionError::ImageSizeMismatch {
                image: "reference",
                ..
            }
        ));
    }
}
