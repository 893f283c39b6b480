#[cfg(any(test, not(feature = "x11-desktop")))]
pub mod headless;
#[cfg(feature = "x11-desktop")]
mod x11_desktop;

use crate::config::DesktopCubeConfig;
use crate::error::Result;
use crate::monitor::MonitorInfo;
use crate::scene::MonitorDraw;

pub trait DesktopBackend {
    fn name(&self) -> &'static str;
    /// Acquires the display, window and rendering context. Fails fast; whatever was
    /// acquired before the failure is released before this returns.
    fn bootstrap(&mut self, config: &DesktopCubeConfig) -> Result<()>;
    fn discover_monitors(&mut self) -> Result<Vec<MonitorInfo>>;
    /// Clears, draws one cube per entry in `draws`, presents and flushes.
    fn render_frame(&mut self, draws: &[MonitorDraw]) -> Result<()>;
}

pub fn create_default_backend() -> Box<dyn DesktopBackend> {
    #[cfg(feature = "x11-desktop")]
    {
        return Box::new(x11_desktop::X11DesktopBackend::default());
    }

    #[cfg(not(feature = "x11-desktop"))]
    {
        Box::new(headless::HeadlessBackend::default())
    }
}
