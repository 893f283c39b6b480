/// One physical screen as reported by Xinerama, in root-window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorInfo {
    pub x_org: i16,
    pub y_org: i16,
    pub width: u16,
    pub height: u16,
}

impl MonitorInfo {
    pub fn new(x_org: i16, y_org: i16, width: u16, height: u16) -> Self {
        Self {
            x_org,
            y_org,
            width,
            height,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            x: i32::from(self.x_org),
            y: i32::from(self.y_org),
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }

    pub fn aspect(&self) -> f32 {
        f32::from(self.width) / f32::from(self.height.max(1))
    }
}

/// Size of the window that covers every monitor.
///
/// Width is the sum of all widths, height the tallest monitor. This only lines up
/// for side-by-side layouts; stacked or mixed arrangements end up clipped.
pub fn desktop_extent(monitors: &[MonitorInfo]) -> (u32, u32) {
    monitors.iter().fold((0u32, 0u32), |(width, height), m| {
        (width + u32::from(m.width), height.max(u32::from(m.height)))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Intersects the viewport with a `width` x `height` target anchored at the origin.
    ///
    /// Returns `None` when nothing of the viewport is left.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Viewport> {
        let x0 = i64::from(self.x).max(0);
        let y0 = i64::from(self.y).max(0);
        let x1 = (i64::from(self.x) + i64::from(self.width)).min(i64::from(width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).min(i64::from(height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Viewport {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_of_single_monitor_is_its_size() {
        let monitors = [MonitorInfo::new(0, 0, 2560, 1440)];
        assert_eq!(desktop_extent(&monitors), (2560, 1440));
    }

    #[test]
    fn extent_sums_widths_and_takes_tallest_height() {
        let monitors = [
            MonitorInfo::new(0, 0, 1920, 1080),
            MonitorInfo::new(1920, 0, 2560, 1440),
            MonitorInfo::new(4480, 0, 1280, 1024),
        ];
        assert_eq!(desktop_extent(&monitors), (1920 + 2560 + 1280, 1440));
    }

    #[test]
    fn extent_keeps_max_height_for_stacked_layout() {
        // Known limitation: vertical stacking is not summed.
        let monitors = [
            MonitorInfo::new(0, 0, 1920, 1080),
            MonitorInfo::new(0, 1080, 1920, 1080),
        ];
        assert_eq!(desktop_extent(&monitors), (3840, 1080));
    }

    #[test]
    fn viewport_and_aspect_follow_the_monitor_alone() {
        let primary = MonitorInfo::new(0, 0, 1920, 1080);
        let lists = [
            vec![primary],
            vec![primary, MonitorInfo::new(1920, 0, 1280, 1024)],
            vec![MonitorInfo::new(-800, 0, 800, 600), primary],
        ];
        for list in &lists {
            let m = list.iter().find(|m| **m == primary).copied().unwrap();
            assert_eq!(
                m.viewport(),
                Viewport {
                    x: 0,
                    y: 0,
                    width: 1920,
                    height: 1080
                }
            );
            assert!((m.aspect() - 1920.0 / 1080.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn clip_keeps_inside_viewport_untouched() {
        let vp = MonitorInfo::new(1920, 0, 1280, 1024).viewport();
        assert_eq!(vp.clip_to(3200, 1080), Some(vp));
    }

    #[test]
    fn clip_trims_overhang() {
        let vp = MonitorInfo::new(0, 0, 1920, 1200).viewport();
        let clipped = vp.clip_to(1920, 1080).unwrap();
        assert_eq!(clipped.height, 1080);
        assert_eq!(clipped.width, 1920);
    }

    #[test]
    fn clip_drops_viewport_outside_target() {
        let vp = MonitorInfo::new(0, 1080, 1920, 1080).viewport();
        assert_eq!(vp.clip_to(3840, 1080), None);
    }
}
