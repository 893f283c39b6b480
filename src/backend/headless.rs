use crate::backend::DesktopBackend;
use crate::config::DesktopCubeConfig;
use crate::error::{RenderError, Result};
use crate::monitor::MonitorInfo;
use crate::scene::MonitorDraw;

/// Backend that never touches a display server.
///
/// Reports one 1920x1080 monitor and only counts the work it is handed.
#[derive(Default)]
pub struct HeadlessBackend {
    bootstrapped: bool,
    frames: u64,
    draws: u64,
}

impl HeadlessBackend {
    #[cfg(test)]
    pub fn counters(&self) -> (u64, u64) {
        (self.frames, self.draws)
    }
}

impl DesktopBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn bootstrap(&mut self, _config: &DesktopCubeConfig) -> Result<()> {
        self.bootstrapped = true;
        log::info!("[backend:{}] bootstrap ok", self.name());
        Ok(())
    }

    fn discover_monitors(&mut self) -> Result<Vec<MonitorInfo>> {
        if !self.bootstrapped {
            return Err(RenderError::Enumeration(
                "backend not bootstrapped".to_string(),
            ));
        }
        Ok(vec![MonitorInfo::new(0, 0, 1920, 1080)])
    }

    fn render_frame(&mut self, draws: &[MonitorDraw]) -> Result<()> {
        if !self.bootstrapped {
            return Err(RenderError::Surface("backend not bootstrapped".to_string()));
        }
        self.frames += 1;
        self.draws += draws.len() as u64;
        if self.frames % 600 == 0 {
            log::debug!(
                "[backend:{}] frame={} draws={}",
                self.name(),
                self.frames,
                self.draws
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Rotation, frame_draws};

    #[test]
    fn refuses_work_before_bootstrap() {
        let mut backend = HeadlessBackend::default();
        assert!(matches!(
            backend.discover_monitors(),
            Err(RenderError::Enumeration(_))
        ));
        assert!(backend.render_frame(&[]).is_err());
    }

    #[test]
    fn counts_frames_and_draws() {
        let config = DesktopCubeConfig::default();
        let mut backend = HeadlessBackend::default();
        backend.bootstrap(&config).unwrap();
        let monitors = backend.discover_monitors().unwrap();
        let draws = frame_draws(&config, &monitors, &Rotation::default());
        backend.render_frame(&draws).unwrap();
        backend.render_frame(&draws).unwrap();
        assert_eq!(backend.counters(), (2, 2));
    }
}
