//! Monte Carlo selection of pixels that carry a surface.

use rand::Rng;
use recon_core::VoxelClass;

use crate::image::{ClassificationImage, PixelCoord};

/// Default number of draws before a sample is given up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

/// Result of one sample draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A non-Empty pixel was found.
    Accepted {
        /// The selected pixel.
        pixel: PixelCoord,
        /// Its class.
        class: VoxelClass,
        /// Draws used, including the successful one.
        attempts: u32,
    },
    /// Every draw hit an Empty pixel.
    Dropped {
        /// Draws used.
        attempts: u32,
    },
}

impl SampleOutcome {
    /// Draws consumed by this sample.
    #[inline]
    pub fn attempts(&self) -> u32 {
        match *self {
            SampleOutcome::Accepted { attempts, .. } | SampleOutcome::Dropped { attempts } => {
                attempts
            }
        }
    }
}

/// Draws uniformly random pixels, rejecting Empty ones up to a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarloSampler {
    max_attempts: u32,
}

impl MonteCarloSampler {
    /// Create a sampler giving up after `max_attempts` draws per sample.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Draw cap per sample.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw one sample.
    pub fn draw<R: Rng + ?Sized>(&self, image: &ClassificationImage, rng: &mut R) -> SampleOutcome {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return SampleOutcome::Dropped { attempts: 0 };
        }

        for attempt in 1..=self.max_attempts {
            let pixel = PixelCoord::new(rng.gen_range(0..width), rng.gen_range(0..height));
            let class = image.class_at(pixel);
            if !class.is_empty() {
                return SampleOutcome::Accepted {
                    pixel,
                    class,
                    attempts: attempt,
                };
            }
        }
        SampleOutcome::Dropped {
            attempts: self.max_attempts,
        }
    }
}

impl Default for MonteCarloSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_empty_image_exhausts_attempts() {
        let image = ClassificationImage::new(16, 16);
        let mut rng = StdRng::seed_from_u64(7);
        let outcome = MonteCarloSampler::default().draw(&image, &mut rng);
        assert_eq!(outcome, SampleOutcome::Dropped { attempts: 1000 });
    }

    #[test]
    fn test_full_image_accepts_first_draw() {
        let mut image = ClassificationImage::new(1, 1);
        image.set(PixelCoord::new(0, 0), VoxelClass::Reference);
        let mut rng = StdRng::seed_from_u64(7);
        let outcome = MonteCarloSampler::new(3).draw(&image, &mut rng);
        assert_eq!(
            outcome,
            SampleOutcome::Accepted {
                pixel: PixelCoord::new(0, 0),
                class: VoxelClass::Reference,
                attempts: 1
            }
        );
    }

    #[test]
    fn test_sparse_image_finds_pixel() {
        let mut image = ClassificationImage::new(8, 8);
        image.set(PixelCoord::new(5, 2), VoxelClass::Live);
        let mut rng = StdRng::seed_from_u64(1);
        match MonteCarloSampler::default().draw(&image, &mut rng) {
            SampleOutcome::Accepted { pixel, class, attempts } => {
                assert_eq!(pixel, PixelCoord::new(5, 2));
                assert_eq!(class, VoxelClass::Live);
                assert!(attempts >= 1 && attempts <= 1000);
            }
            // 1 in 64 per draw: a thousand misses is practically impossible.
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_zero_sized_image() {
        let image = ClassificationImage::new(0, 5);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            MonteCarloSampler::default().draw(&image, &mut rng).attempts(),
            0
        );
    }
}
