use crate::camera::Camera;

/// Something with pixel dimensions that follow the window.
pub trait OutputSurface {
    fn resize(&mut self, width: u32, height: u32);
}

/// Current output dimensions. Zero-sized windows are stored as 1x1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub aspect: f32,
    pub pixel_ratio: f64,
}

impl ViewportState {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            aspect: width as f32 / height as f32,
            pixel_ratio,
        }
    }
}

/// Applies window size changes to the camera and the output surface.
#[derive(Debug, Clone)]
pub struct ViewportReconciler {
    state: ViewportState,
}

impl ViewportReconciler {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            state: ViewportState::new(width, height, pixel_ratio),
        }
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    /// Returns `false` when the size is unchanged and nothing was touched.
    pub fn on_resize(
        &mut self,
        width: u32,
        height: u32,
        camera: &mut Camera,
        surface: &mut impl OutputSurface,
    ) -> bool {
        let next = ViewportState::new(width, height, self.state.pixel_ratio);
        if next == self.state {
            tracing::trace!(width, height, "resize to current size ignored");
            return false;
        }
        self.state = next;
        camera.set_aspect(next.aspect);
        surface.resize(next.width, next.height);
        tracing::debug!(width = next.width, height = next.height, aspect = next.aspect, "viewport resized");
        true
    }

    pub fn on_scale_factor(&mut self, pixel_ratio: f64) {
        if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            self.state.pixel_ratio = pixel_ratio;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeSurface {
        size: (u32, u32),
        calls: usize,
    }

    impl OutputSurface for FakeSurface {
        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.calls += 1;
        }
    }

    #[test]
    fn resize_updates_camera_and_surface() {
        let mut reconciler = ViewportReconciler::new(800, 600, 1.0);
        let mut camera = Camera::default();
        let mut surface = FakeSurface::default();

        assert!(reconciler.on_resize(1920, 1080, &mut camera, &mut surface));
        assert_eq!(surface.size, (1920, 1080));
        assert!((camera.projection.aspect - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(reconciler.state().width, 1920);
    }

    #[test]
    fn identical_resizes_equal_one() {
        let mut reconciler = ViewportReconciler::new(800, 600, 1.0);
        let mut camera = Camera::default();
        let mut surface = FakeSurface::default();

        reconciler.on_resize(1024, 512, &mut camera, &mut surface);
        let (state, cam) = (*reconciler.state(), camera);
        assert!(!reconciler.on_resize(1024, 512, &mut camera, &mut surface));
        assert_eq!(*reconciler.state(), state);
        assert_eq!(camera, cam);
        assert_eq!(surface.calls, 1);
    }

    #[test]
    fn minimized_window_keeps_finite_aspect() {
        let mut reconciler = ViewportReconciler::new(800, 600, 1.0);
        let mut camera = Camera::default();
        let mut surface = FakeSurface::default();
        reconciler.on_resize(0, 0, &mut camera, &mut surface);
        assert_eq!(surface.size, (1, 1));
        assert_eq!(camera.projection.aspect, 1.0);
    }

    #[test]
    fn scale_factor_updates_pixel_ratio_only() {
        let mut reconciler = ViewportReconciler::new(800, 600, 1.0);
        reconciler.on_scale_factor(2.0);
        reconciler.on_scale_factor(f64::NAN);
        assert_eq!(reconciler.state().pixel_ratio, 2.0);
        assert_eq!(reconciler.state().width, 800);
    }
}
