//! Truncated signed distance samples and the RGBA depth codec.

/// Weights applied to the four channels of an encoded depth pixel.
pub const DEPTH_DECODE_WEIGHTS: [f32; 4] = [
    1.0,
    1.0 / 255.0,
    1.0 / (255.0 * 255.0),
    1.0 / (255.0 * 255.0 * 255.0),
];

/// Default multiplier from decoded `[0, 1)` depth to world units.
pub const DEFAULT_DEPTH_FACTOR: f32 = 1000.0;

/// TSDF shaping parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TsdfParams {
    /// Saturation value for points well in front of the surface.
    pub max: f32,
    /// Slope of the linear band around the surface.
    pub slope: f32,
    /// Half-width of the band in which a voxel counts as surface.
    pub threshold: f32,
}

impl TsdfParams {
    /// Create a new parameter set.
    #[inline]
    pub const fn new(max: f32, slope: f32, threshold: f32) -> Self {
        Self {
            max,
            slope,
            threshold,
        }
    }

    /// Truncation distance `max / slope`.
    #[inline]
    pub fn truncation(&self) -> f32 {
        self.max / self.slope
    }

    /// Truncated signed distance for a voxel at image-plane distance
    /// `dist_exact` when the sensor measured `dist_measured`.
    ///
    /// ```
    /// use recon_core::{TsdfParams, TsdfSample};
    ///
    /// let params = TsdfParams::new(1.0, 2.0, 0.5);
    /// assert_eq!(params.sample(0.0, 5.0), TsdfSample::Value(1.0));
    /// assert_eq!(params.sample(5.0, 0.0), TsdfSample::OutOfRange);
    /// ```
    pub fn sample(&self, dist_exact: f32, dist_measured: f32) -> TsdfSample {
        let d = dist_exact - dist_measured;
        let trunc = self.truncation();
        if d <= -trunc {
            TsdfSample::Value(self.max)
        } else if d >= trunc {
            TsdfSample::OutOfRange
        } else {
            TsdfSample::Value(-self.slope * d)
        }
    }
}

impl Default for TsdfParams {
    fn default() -> Self {
        Self::new(1.0, 2.0, 0.5)
    }
}

/// Outcome of a TSDF evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TsdfSample {
    /// A sample to fold into the voxel.
    Value(f32),
    /// The voxel lies too far behind the measured surface; leave it alone.
    OutOfRange,
}

impl TsdfSample {
    /// The sample value, if any.
    #[inline]
    pub fn value(self) -> Option<f32> {
        match self {
            TsdfSample::Value(v) => Some(v),
            TsdfSample::OutOfRange => None,
        }
    }

    /// True for [`TsdfSample::OutOfRange`].
    #[inline]
    pub fn is_out_of_range(self) -> bool {
        matches!(self, TsdfSample::OutOfRange)
    }
}

/// Decode a 4-channel fixed-point depth pixel into world units.
#[inline]
pub fn decode_depth(rgba: [f32; 4], depth_factor: f32) -> f32 {
    let mut v = 0.0;
    for (c, w) in rgba.iter().zip(DEPTH_DECODE_WEIGHTS) {
        v += c * w;
    }
    v * depth_factor
}

/// Encode a depth in world units as a 4-channel pixel, inverse of
/// [`decode_depth`]. Depths outside `[0, depth_factor)` are clamped.
pub fn encode_depth(depth: f32, depth_factor: f32) -> [f32; 4] {
    let v = (depth / depth_factor).clamp(0.0, 1.0 - f32::EPSILON);
    let frac = |x: f32| x - libm::floorf(x);
    let mut enc = [
        frac(v),
        frac(v * 255.0),
        frac(v * 255.0 * 255.0),
        frac(v * 255.0 * 255.0 * 255.0),
    ];
    // Remove from each channel the part carried by the next one.
    for i in 0..3 {
        enc[i] -= enc[i + 1] / 255.0;
    }
    enc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_and_linearity() {
        let p = TsdfParams::new(1.0, 2.0, 0.5);
        assert_eq!(p.truncation(), 0.5);
        assert_eq!(p.sample(0.0, 0.5), TsdfSample::Value(1.0));
        assert_eq!(p.sample(0.0, 3.0), TsdfSample::Value(1.0));
        assert!(p.sample(1.0, 0.5).is_out_of_range());
        let v = p.sample(1.0, 1.1).value().unwrap_or(f32::NAN);
        assert!((v - 0.2).abs() < 1e-5);
        let v = p.sample(1.1, 1.0).value().unwrap_or(f32::NAN);
        assert!((v + 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_concrete_scenario() {
        let p = TsdfParams::new(1.0, 2.0, 0.5);
        let v = p.sample(1.0, 1.3).value().unwrap_or(f32::NAN);
        assert!((v - 0.6).abs() < 1e-5);
        assert!(v >= p.threshold);
    }

    #[test]
    fn test_decode_weights() {
        assert_eq!(decode_depth([0.5, 0.0, 0.0, 0.0], 1000.0), 500.0);
        let d = decode_depth([0.0, 1.0, 0.0, 0.0], 255.0);
        assert!((d - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_encode_decode() {
        for depth in [0.0, 0.75, 1.3, 4.2, 17.0, 250.0] {
            let enc = encode_depth(depth, DEFAULT_DEPTH_FACTOR);
            assert!(enc.iter().all(|&c| c > -1e-6 && c <= 1.0));
            let back = decode_depth(enc, DEFAULT_DEPTH_FACTOR);
            assert!((back - depth).abs() < 1e-3, "{} -> {}", depth, back);
        }
    }
}
