use std::thread;
use std::time::Instant;

use crate::backend::DesktopBackend;
use crate::config::DesktopCubeConfig;
use crate::error::Result;
use crate::monitor::MonitorInfo;
use crate::scene::{Rotation, frame_draws};
use crate::scheduler::FrameScheduler;
use crate::shutdown::ShutdownFlag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Stopping,
}

pub struct RenderRuntime {
    config: DesktopCubeConfig,
    backend: Box<dyn DesktopBackend>,
    monitors: Vec<MonitorInfo>,
    scheduler: FrameScheduler,
    shutdown: ShutdownFlag,
    rotation: Rotation,
    frames: u64,
}

impl RenderRuntime {
    pub fn new(
        config: DesktopCubeConfig,
        backend: Box<dyn DesktopBackend>,
        shutdown: ShutdownFlag,
    ) -> Self {
        let scheduler = FrameScheduler::new(config.target_fps);
        Self {
            config,
            backend,
            monitors: Vec::new(),
            scheduler,
            shutdown,
            rotation: Rotation::default(),
            frames: 0,
        }
    }

    pub fn bootstrap(&mut self) -> Result<()> {
        log::info!(
            "[desktop-cube] bootstrap: target_fps={} fov={} msaa={}x max_frames={:?}",
            self.config.target_fps,
            self.config.fov_y_degrees,
            self.config.msaa_samples,
            self.config.max_frames
        );
        self.backend.bootstrap(&self.config)?;
        self.monitors = self.backend.discover_monitors()?;
        log::info!(
            "[desktop-cube] backend={} monitors={}",
            self.backend.name(),
            self.monitors.len()
        );
        for (index, monitor) in self.monitors.iter().enumerate() {
            log::info!(
                "[desktop-cube] monitor={} {}x{}+{}+{}",
                index,
                monitor.width,
                monitor.height,
                monitor.x_org,
                monitor.y_org
            );
        }
        Ok(())
    }

    fn next_state(&self) -> LoopState {
        if self.shutdown.is_requested() {
            return LoopState::Stopping;
        }
        match self.config.max_frames {
            Some(max) if self.frames >= max => LoopState::Stopping,
            _ => LoopState::Running,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        log::debug!(
            "[desktop-cube] scheduler frame_budget={:?}",
            self.scheduler.frame_budget()
        );

        while self.next_state() == LoopState::Running {
            let frame_start = Instant::now();

            self.rotation.advance(self.config.rotation_step);
            let draws = frame_draws(&self.config, &self.monitors, &self.rotation);
            self.backend.render_frame(&draws)?;
            self.frames += 1;
            if self.frames % 600 == 0 {
                log::debug!("[desktop-cube] frame={}", self.frames);
            }

            let sleep = self.scheduler.sleep_after(frame_start.elapsed());
            if !sleep.is_zero() {
                thread::sleep(sleep);
            }
        }

        if self.shutdown.is_requested() {
            log::info!(
                "[desktop-cube] shutdown requested after {} frames",
                self.frames
            );
        } else {
            log::info!("[desktop-cube] reached max_frames={}, exiting loop", self.frames);
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
