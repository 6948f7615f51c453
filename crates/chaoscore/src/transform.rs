use chaosconfig::ViewportConfig;

/// Affine map from attractor space into clip-space coordinates, derived once per preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    min_x: f64,
    min_y: f64,
    scale_x: f64,
    scale_y: f64,
    y_offset: f64,
}

impl ScreenTransform {
    pub fn from_viewport(view: &ViewportConfig) -> Self {
        let min_y = view.min_y * view.aspect;
        let max_y = view.max_y * view.aspect;
        Self {
            min_x: view.min_x,
            min_y,
            scale_x: 2.0 * view.extent_x / (view.max_x - view.min_x),
            scale_y: view.extent_y / (max_y - min_y),
            y_offset: view.y_offset,
        }
    }

    pub fn apply(&self, [x, y]: [f64; 2]) -> [f32; 2] {
        let sx = (x - self.min_x + 0.5) * self.scale_x;
        let sy = (y - self.min_y + 0.5) * self.scale_y + self.y_offset;
        [sx as f32, sy as f32]
    }

    pub fn scale(&self) -> [f64; 2] {
        [self.scale_x, self.scale_y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> ViewportConfig {
        ViewportConfig {
            min_x: 0.5,
            min_y: 1.1,
            max_x: 3.0,
            max_y: 2.975,
            extent_x: 0.7,
            extent_y: 1.35,
            aspect: 1.0,
            y_offset: 0.5,
        }
    }

    #[test]
    fn derives_scales_from_extents() {
        let transform = ScreenTransform::from_viewport(&viewport());
        let [sx, sy] = transform.scale();
        assert!((sx - 0.56).abs() < 1e-12);
        assert!((sy - 0.72).abs() < 1e-12);
    }

    #[test]
    fn maps_min_corner_to_half_step() {
        let transform = ScreenTransform::from_viewport(&viewport());
        let [x, y] = transform.apply([0.5, 1.1]);
        assert!((x - 0.28).abs() < 1e-6);
        assert!((y - (0.36 + 0.5)).abs() < 1e-6);
    }

    #[test]
    fn aspect_scales_y_bounds() {
        let mut view = viewport();
        view.aspect = 2.0;
        let transform = ScreenTransform::from_viewport(&view);
        let [_, sy] = transform.scale();
        assert!((sy - 0.36).abs() < 1e-12);
    }
}
