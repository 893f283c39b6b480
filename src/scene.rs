use glam::Mat4;

use crate::config::DesktopCubeConfig;
use crate::monitor::{MonitorInfo, Viewport};

pub const NORD0: u32 = 0x2E3440;
pub const NORD9: u32 = 0x81A1C1;
pub const NORD10: u32 = 0x5E81AC;
pub const NORD11: u32 = 0xBF616A;
pub const NORD12: u32 = 0xD08770;

pub const fn nord_rgba(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
        1.0,
    ]
}

pub const CUBE_VERTICES: [[f32; 3]; 8] = [
    [-1.0, -1.0, 1.0],  // bottom left front
    [1.0, -1.0, 1.0],   // bottom right front
    [1.0, -1.0, -1.0],  // bottom right back
    [-1.0, -1.0, -1.0], // bottom left back
    [-1.0, 1.0, 1.0],   // top left front
    [1.0, 1.0, 1.0],    // top right front
    [1.0, 1.0, -1.0],   // top right back
    [-1.0, 1.0, -1.0],  // top left back
];

pub const CUBE_COLORS: [[f32; 4]; 8] = [
    nord_rgba(NORD9),
    nord_rgba(NORD10),
    nord_rgba(NORD11),
    nord_rgba(NORD12),
    nord_rgba(NORD9),
    nord_rgba(NORD10),
    nord_rgba(NORD11),
    nord_rgba(NORD12),
];

/// Quad faces: bottom, top, left, right, front, back.
pub const CUBE_FACES: [[u16; 4]; 6] = [
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [0, 4, 7, 3],
    [1, 5, 6, 2],
    [0, 1, 5, 4],
    [3, 7, 6, 2],
];

pub const CUBE_INDEX_COUNT: u32 = (CUBE_FACES.len() * 6) as u32;

/// Splits every quad `a b c d` into the triangles `a b c` and `a c d`.
pub fn triangulated_indices() -> [u16; CUBE_INDEX_COUNT as usize] {
    let mut out = [0u16; CUBE_INDEX_COUNT as usize];
    for (face, [a, b, c, d]) in CUBE_FACES.iter().copied().enumerate() {
        out[face * 6..face * 6 + 6].copy_from_slice(&[a, b, c, a, c, d]);
    }
    out
}

/// Orientation shared by every monitor within a frame, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
}

impl Rotation {
    pub fn advance(&mut self, step: f32) {
        self.x = (self.x + step) % 360.0;
        self.y = (self.y + step) % 360.0;
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_rotation_x(self.x.to_radians()) * Mat4::from_rotation_y(self.y.to_radians())
    }
}

/// What the backend needs to draw the cube on one monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorDraw {
    pub viewport: Viewport,
    pub mvp: Mat4,
}

pub fn projection(config: &DesktopCubeConfig, monitor: &MonitorInfo) -> Mat4 {
    Mat4::perspective_rh(
        config.fov_y_degrees.to_radians(),
        monitor.aspect(),
        config.z_near,
        config.z_far,
    )
}

pub fn view(config: &DesktopCubeConfig) -> Mat4 {
    Mat4::look_at_rh(config.eye, config.target, config.up)
}

pub fn monitor_draw(
    config: &DesktopCubeConfig,
    monitor: &MonitorInfo,
    rotation: &Rotation,
) -> MonitorDraw {
    MonitorDraw {
        viewport: monitor.viewport(),
        mvp: projection(config, monitor) * view(config) * rotation.model(),
    }
}

pub fn frame_draws(
    config: &DesktopCubeConfig,
    monitors: &[MonitorInfo],
    rotation: &Rotation,
) -> Vec<MonitorDraw> {
    monitors
        .iter()
        .map(|monitor| monitor_draw(config, monitor, rotation))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn rotation_returns_to_start_after_full_period() {
        let mut rotation = Rotation { x: 12.5, y: 0.0 };
        let start = rotation;
        for _ in 0..720 {
            rotation.advance(0.5);
        }
        assert!((rotation.x - start.x).abs() < 1e-4);
        assert!((rotation.y - start.y).abs() < 1e-4);
    }

    #[test]
    fn rotation_stays_below_360() {
        let mut rotation = Rotation { x: 359.75, y: 359.5 };
        rotation.advance(0.5);
        assert!((rotation.x - 0.25).abs() < 1e-4);
        assert_eq!(rotation.y, 0.0);
    }

    #[test]
    fn triangulation_keeps_face_order_and_bounds() {
        let indices = triangulated_indices();
        assert_eq!(indices.len(), 36);
        assert_eq!(&indices[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&indices[30..], &[3, 7, 6, 3, 6, 2]);
        assert!(indices.iter().all(|i| (*i as usize) < CUBE_VERTICES.len()));
    }

    #[test]
    fn every_quad_references_four_distinct_vertices() {
        for face in CUBE_FACES {
            let mut sorted = face;
            sorted.sort_unstable();
            assert!(sorted.windows(2).all(|w| w[0] != w[1]), "{face:?}");
        }
    }

    #[test]
    fn palette_converts_hex_channels() {
        assert_eq!(nord_rgba(0xFF0080), [1.0, 0.0, 128.0 / 255.0, 1.0]);
        let nord0 = nord_rgba(NORD0);
        assert!((nord0[0] - 46.0 / 255.0).abs() < 1e-6);
        assert_eq!(CUBE_COLORS[0], CUBE_COLORS[4]);
    }

    #[test]
    fn cube_centre_lands_in_the_middle_of_the_viewport() {
        let config = DesktopCubeConfig::default();
        let monitor = MonitorInfo::new(0, 0, 1920, 1080);
        let draw = monitor_draw(&config, &monitor, &Rotation { x: 33.0, y: 71.5 });
        let clip = draw.mvp * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
        assert!((clip.w - config.eye.distance(config.target)).abs() < 1e-4);
    }

    #[test]
    fn all_monitors_share_the_frame_rotation() {
        let config = DesktopCubeConfig::default();
        let monitors = [
            MonitorInfo::new(0, 0, 1920, 1080),
            MonitorInfo::new(1920, 0, 1920, 1080),
        ];
        let draws = frame_draws(&config, &monitors, &Rotation { x: 10.0, y: 20.0 });
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].mvp, draws[1].mvp);
        assert_ne!(draws[0].viewport, draws[1].viewport);
    }
}
