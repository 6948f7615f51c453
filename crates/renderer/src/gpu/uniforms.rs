use bytemuck::{Pod, Zeroable};
use winit::dpi::PhysicalSize;

/// Mirrors the `PointParams` std140 block.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PointUniforms {
    /// xy: sprite half extent in clip space, z: trail weight, w: sprite size in pixels.
    pub shape: [f32; 4],
    pub sensitivity: f32,
    pub angle: f32,
    pub padding: [f32; 2],
}

unsafe impl Zeroable for PointUniforms {}
unsafe impl Pod for PointUniforms {}

impl PointUniforms {
    pub fn new(point_size: f32, sensitivity: f32, trails: bool, size: PhysicalSize<u32>) -> Self {
        let mut uniforms = Self {
            shape: [0.0, 0.0, if trails { 1.0 } else { 0.0 }, point_size],
            sensitivity,
            angle: 0.0,
            padding: [0.0; 2],
        };
        uniforms.set_surface(size);
        uniforms
    }

    /// Recomputes the clip-space sprite extent so points keep their pixel size.
    pub fn set_surface(&mut self, size: PhysicalSize<u32>) {
        let point_size = self.shape[3];
        self.shape[0] = point_size / size.width.max(1) as f32;
        self.shape[1] = point_size / size.height.max(1) as f32;
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(std::mem::size_of::<PointUniforms>(), 32);
        assert_eq!(std::mem::align_of::<PointUniforms>(), 16);
    }

    #[test]
    fn half_extent_tracks_surface_size() {
        let mut uniforms =
            PointUniforms::new(13.0, 10.0 / 255.0, true, PhysicalSize::new(900, 750));
        assert!((uniforms.shape[0] - 13.0 / 900.0).abs() < 1e-7);
        assert!((uniforms.shape[1] - 13.0 / 750.0).abs() < 1e-7);
        assert_eq!(uniforms.shape[2], 1.0);

        uniforms.set_surface(PhysicalSize::new(1800, 1500));
        assert!((uniforms.shape[0] - 13.0 / 1800.0).abs() < 1e-7);
    }

    #[test]
    fn zero_sized_surface_does_not_divide_by_zero() {
        let uniforms = PointUniforms::new(32.0, 0.4, false, PhysicalSize::new(0, 0));
        assert!(uniforms.shape.iter().all(|value| value.is_finite()));
        assert_eq!(uniforms.shape[2], 0.0);
    }
}
