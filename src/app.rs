use crate::backend::create_default_backend;
use crate::config::DesktopCubeConfig;
use crate::error::Result;
use crate::runtime::RenderRuntime;
use crate::shutdown::{ShutdownFlag, register_signal_handlers};

pub fn run() -> Result<()> {
    let shutdown = ShutdownFlag::new();
    register_signal_handlers(&shutdown)?;

    let cfg = DesktopCubeConfig::default();
    let mut runtime = RenderRuntime::new(cfg, create_default_backend(), shutdown);
    runtime.bootstrap()?;
    runtime.run()
}
