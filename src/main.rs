mod app;
mod backend;
mod config;
mod error;
mod logging;
mod monitor;
mod runtime;
mod scene;
mod scheduler;
mod shutdown;

fn main() {
    logging::init_logging();
    if let Err(err) = app::run() {
        eprintln!("desktop-cube: {err}");
        std::process::exit(1);
    }
}
