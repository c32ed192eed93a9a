//! Camera for the fixed-size 2D scene

use glam::{Mat4, Vec2, Vec4};

use crate::canvas;

/// Maps the logical canvas (origin top-left, y down) onto the window.
///
/// The canvas keeps its aspect ratio and is centred inside the drawable area,
/// which is the window minus an optional strip reserved on the right for UI.
#[derive(Debug, Clone)]
pub struct SceneCamera {
    pub logical_size: Vec2,
    pub window_size: Vec2,
    pub reserved_right: f32,
}

impl SceneCamera {
    pub fn new(window_width: f32, window_height: f32) -> Self {
        Self {
            logical_size: Vec2::new(canvas::WIDTH, canvas::HEIGHT),
            window_size: Vec2::new(window_width, window_height),
            reserved_right: 0.0,
        }
    }

    pub fn resize(&mut self, window_width: f32, window_height: f32) {
        self.window_size = Vec2::new(window_width, window_height);
    }

    /// Pixels per logical unit
    pub fn scale(&self) -> f32 {
        let available = self.available_area();
        (available.x / self.logical_size.x)
            .min(available.y / self.logical_size.y)
            .max(f32::EPSILON)
    }

    /// Top-left corner of the canvas in window pixels
    pub fn origin(&self) -> Vec2 {
        let available = self.available_area();
        (available - self.logical_size * self.scale()) * 0.5
    }

    fn available_area(&self) -> Vec2 {
        Vec2::new(
            (self.window_size.x - self.reserved_right).max(1.0),
            self.window_size.y.max(1.0),
        )
    }

    /// Logical canvas → clip space
    pub fn view_projection(&self) -> Mat4 {
        let scale = self.scale();
        let origin = self.origin();
        let w = self.window_size.x.max(1.0);
        let h = self.window_size.y.max(1.0);

        Mat4::from_cols(
            Vec4::new(2.0 * scale / w, 0.0, 0.0, 0.0),
            Vec4::new(0.0, -2.0 * scale / h, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(2.0 * origin.x / w - 1.0, 1.0 - 2.0 * origin.y / h, 0.0, 1.0),
        )
    }
}

/// Camera uniform data for shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// x: pixels per logical unit, y: elapsed seconds, zw unused
    pub params: [f32; 4],
}

impl CameraUniform {
    pub fn from_scene_camera(camera: &SceneCamera, elapsed: f32) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            params: [camera.scale(), elapsed, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraUniform, SceneCamera};
    use glam::Vec4;

    fn project(camera: &SceneCamera, x: f32, y: f32) -> (f32, f32) {
        let clip = camera.view_projection() * Vec4::new(x, y, 0.0, 1.0);
        (clip.x, clip.y)
    }

    #[test]
    fn canvas_fills_matching_window() {
        let camera = SceneCamera::new(800.0, 560.0);
        let (x0, y0) = project(&camera, 0.0, 0.0);
        let (x1, y1) = project(&camera, 800.0, 560.0);
        assert!((x0 + 1.0).abs() < 1e-5 && (y0 - 1.0).abs() < 1e-5);
        assert!((x1 - 1.0).abs() < 1e-5 && (y1 + 1.0).abs() < 1e-5);
    }

    #[test]
    fn wide_window_letterboxes_horizontally() {
        let camera = SceneCamera::new(1600.0, 560.0);
        assert!((camera.scale() - 1.0).abs() < 1e-5);
        assert!((camera.origin().x - 400.0).abs() < 1e-3);
        let (x0, _) = project(&camera, 0.0, 0.0);
        assert!((x0 + 0.5).abs() < 1e-5);
    }

    #[test]
    fn uniform_bytes_match_the_shader_layout() {
        let camera = SceneCamera::new(1600.0, 1120.0);
        let uniform = CameraUniform::from_scene_camera(&camera, 3.5);
        // mat4x4<f32> followed by vec4<f32>
        assert_eq!(bytemuck::bytes_of(&uniform).len(), 80);
        assert_eq!(uniform.params, [2.0, 3.5, 0.0, 0.0]);
        assert_eq!(uniform.view_proj, camera.view_projection().to_cols_array_2d());
    }

    #[test]
    fn reserved_strip_shifts_canvas_left() {
        let mut camera = SceneCamera::new(1100.0, 560.0);
        camera.reserved_right = 300.0;
        assert!((camera.scale() - 1.0).abs() < 1e-5);
        assert!(camera.origin().x.abs() < 1e-3);
    }
}
