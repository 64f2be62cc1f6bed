//! The renderer core: adapter selection, the presentation chain, the
//! graphics pipeline and the per-frame state machine, all driven through
//! the [`volkano_rhi`] GPU seam.

pub mod config;
pub mod device_context;
pub mod error;
pub mod frame;
pub mod mesh;
pub mod pipeline_cache;
pub mod presentation;
pub mod renderer;
pub mod surface;

pub use config::{Backend, RendererConfig};
pub use device_context::{DeviceContext, QueueFamilyIndices};
pub use error::{QueueRole, RendererError};
pub use frame::{FrameOutcome, FrameState};
pub use mesh::{Mesh, Vertex};
pub use presentation::{PresentationChain, RebuildOutcome};
pub use renderer::{GpuRenderer, NullRenderer, Renderer};
pub use surface::SurfaceProvider;

pub const LOG_TARGET: &str = "renderer";

/// Registers the log categories owned by the renderer.
pub fn register_log_categories() {
    volkano_log::register_category(LOG_TARGET, log::LevelFilter::Info);
    volkano_log::register_category(volkano_rhi::LOG_TARGET, log::LevelFilter::Info);
}
