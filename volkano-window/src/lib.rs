pub mod config;
pub mod engine;
pub mod event;
pub mod runner;
pub mod surface;

pub use config::{ConfigError, EngineConfig, WindowConfig};
pub use engine::{Engine, EngineError};
pub use event::{EventTranslator, SurfaceEvent};
pub use runner::run;
pub use surface::WindowSurface;

pub const LOG_TARGET: &str = "engine";

/// Registers the log categories of every crate the engine is built from.
pub fn register_log_categories() {
    volkano_log::register_category(LOG_TARGET, log::LevelFilter::Info);
    volkano_render::register_log_categories();
    volkano_fs::register_log_categories();
}
