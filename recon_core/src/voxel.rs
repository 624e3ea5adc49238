//! Voxel record and the running-mean fold rule.

/// Surface label carried by a voxel and by classification pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VoxelClass {
    /// No surface.
    #[default]
    Empty,
    /// Surface observed by the live sensor.
    Live,
    /// Surface already present in the reference reconstruction.
    Reference,
}

impl VoxelClass {
    /// Decode a classification pixel: red > 0 is Reference, otherwise
    /// blue > 0 is Live, otherwise Empty.
    #[inline]
    pub fn from_rgba(rgba: [f32; 4]) -> Self {
        if rgba[0] > 0.0 {
            VoxelClass::Reference
        } else if rgba[2] > 0.0 {
            VoxelClass::Live
        } else {
            VoxelClass::Empty
        }
    }

    /// True for [`VoxelClass::Empty`].
    #[inline]
    pub const fn is_empty(self) -> bool {
        matches!(self, VoxelClass::Empty)
    }
}

/// One cell of a voxel block.
///
/// `value` is the running mean of every TSDF sample folded in. A voxel with
/// `updates == 0` always has `value == 0.0` and class Empty.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Voxel {
    /// Running mean of TSDF samples.
    pub value: f32,
    /// Number of samples folded in.
    pub updates: u32,
    /// Frame index of the most recent fold (0 = never).
    pub last_update_frame: u64,
    /// Current classification.
    pub class: VoxelClass,
}

impl Voxel {
    /// A fresh, zeroed voxel.
    pub const EMPTY: Self = Self {
        value: 0.0,
        updates: 0,
        last_update_frame: 0,
        class: VoxelClass::Empty,
    };

    /// Whether the voxel counts toward its block's active count.
    #[inline]
    pub const fn is_active(&self) -> bool {
        !self.class.is_empty()
    }

    /// Fold one TSDF sample into the running mean and reclassify.
    ///
    /// If the new mean lies strictly inside `(-threshold, threshold)` the
    /// voxel takes `proposed`, otherwise it becomes Empty. Returns the change
    /// in active state: `+1`, `-1` or `0`.
    ///
    /// ```
    /// use recon_core::{Voxel, VoxelClass};
    ///
    /// let mut v = Voxel::EMPTY;
    /// assert_eq!(v.fold(0.1, VoxelClass::Live, 0.5, 1), 1);
    /// assert_eq!(v.fold(0.1, VoxelClass::Reference, 0.5, 2), 0);
    /// assert_eq!(v.class, VoxelClass::Reference);
    /// ```
    pub fn fold(&mut self, sample: f32, proposed: VoxelClass, threshold: f32, frame: u64) -> i32 {
        let was_active = self.is_active();
        let n = self.updates as f32;
        self.value = (self.value * n + sample) / (n + 1.0);
        self.updates += 1;
        self.last_update_frame = frame;

        self.class = if -threshold < self.value && self.value < threshold {
            proposed
        } else {
            VoxelClass::Empty
        };

        self.is_active() as i32 - was_active as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_voxel_is_zero() {
        let v = Voxel::default();
        assert_eq!(v, Voxel::EMPTY);
        assert_eq!(v.value, 0.0);
        assert_eq!(v.updates, 0);
        assert!(!v.is_active());
    }

    #[test]
    fn test_running_mean() {
        let mut v = Voxel::EMPTY;
        for frame in 1..=10 {
            v.fold(0.25, VoxelClass::Live, 0.5, frame);
        }
        assert!((v.value - 0.25).abs() < 1e-6);
        assert_eq!(v.updates, 10);
        assert_eq!(v.last_update_frame, 10);

        let mut w = Voxel::EMPTY;
        w.fold(1.0, VoxelClass::Live, 0.5, 1);
        w.fold(0.0, VoxelClass::Live, 0.5, 2);
        assert!((w.value - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_delta_table() {
        // Empty -> in band: +1
        let mut v = Voxel::EMPTY;
        assert_eq!(v.fold(0.0, VoxelClass::Live, 0.5, 1), 1);
        // non-Empty -> in band: 0
        assert_eq!(v.fold(0.0, VoxelClass::Reference, 0.5, 2), 0);
        assert_eq!(v.class, VoxelClass::Reference);
        // non-Empty -> out of band: -1
        let mut v = Voxel::EMPTY;
        v.fold(0.4, VoxelClass::Live, 0.5, 1);
        assert_eq!(v.fold(1.0, VoxelClass::Live, 0.5, 2), -1);
        assert_eq!(v.class, VoxelClass::Empty);
        // Empty -> out of band: 0
        let mut v = Voxel::EMPTY;
        assert_eq!(v.fold(0.9, VoxelClass::Live, 0.5, 1), 0);
        assert_eq!(v.class, VoxelClass::Empty);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut v = Voxel::EMPTY;
        assert_eq!(v.fold(0.5, VoxelClass::Live, 0.5, 1), 0);
        let mut v = Voxel::EMPTY;
        assert_eq!(v.fold(-0.5, VoxelClass::Live, 0.5, 1), 0);
        let mut v = Voxel::EMPTY;
        assert_eq!(v.fold(-0.49, VoxelClass::Live, 0.5, 1), 1);
    }

    #[test]
    fn test_class_from_rgba() {
        assert_eq!(VoxelClass::from_rgba([1.0, 0.0, 0.0, 1.0]), VoxelClass::Reference);
        assert_eq!(VoxelClass::from_rgba([0.0, 0.0, 1.0, 1.0]), VoxelClass::Live);
        assert_eq!(VoxelClass::from_rgba([1.0, 0.0, 1.0, 1.0]), VoxelClass::Reference);
        assert_eq!(VoxelClass::from_rgba([0.0, 1.0, 0.0, 1.0]), VoxelClass::Empty);
    }
}
