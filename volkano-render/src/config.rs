use std::path::PathBuf;

use volkano_rhi::NO_TIMEOUT;

/// Which renderer the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Vulkan,
    /// Renders nothing. Useful headless and in tests.
    Null,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub backend: Backend,
    /// Directory shader paths are resolved against.
    pub asset_root: PathBuf,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub clear_color: [f32; 4],
    /// Use mailbox presentation when the surface supports it, FIFO otherwise.
    pub prefer_mailbox: bool,
    /// Upper bound for fence waits and image acquisition. `None` waits forever.
    pub frame_timeout_ms: Option<u64>,
    /// Enable the Khronos validation layer when it is installed.
    pub validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Vulkan,
            asset_root: PathBuf::from("."),
            vertex_shader: PathBuf::from("shaders/triangle.vert.spv"),
            fragment_shader: PathBuf::from("shaders/triangle.frag.spv"),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            prefer_mailbox: true,
            frame_timeout_ms: Some(5000),
            validation: cfg!(debug_assertions),
        }
    }
}

impl RendererConfig {
    pub fn frame_timeout_ns(&self) -> u64 {
        match self.frame_timeout_ms {
            Some(ms) => ms.saturating_mul(1_000_000),
            None => NO_TIMEOUT,
        }
    }
}
