use glam::Vec3;

use crate::scene::{NORD0, nord_rgba};

#[derive(Debug, Clone)]
pub struct DesktopCubeConfig {
    pub target_fps: u32,
    /// Degrees added to both rotation angles every frame.
    pub rotation_step: f32,
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub clear_color: [f32; 4],
    pub msaa_samples: u32,
    pub window_title: &'static str,
    /// Stop after this many frames. Production runs leave it unset.
    pub max_frames: Option<u64>,
}

impl Default for DesktopCubeConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            rotation_step: 0.5,
            fov_y_degrees: 50.0,
            z_near: 0.1,
            z_far: 10.0,
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            clear_color: nord_rgba(NORD0),
            msaa_samples: 4,
            window_title: "OPENGL DESKTOP",
            max_frames: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_desktop_window() {
        let config = DesktopCubeConfig::default();
        assert_eq!(config.window_title, "OPENGL DESKTOP");
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.msaa_samples, 4);
        assert!(config.max_frames.is_none());
    }
}
