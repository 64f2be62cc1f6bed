use std::path::PathBuf;

use volkano_fs::FsError;
use volkano_rhi::{ErrorClass, GpuError};

use crate::LOG_TARGET;

/// A role a queue family can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueRole {
    Graphics,
    Present,
    Compute,
    Transfer,
}

impl std::fmt::Display for QueueRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            QueueRole::Graphics => "graphics",
            QueueRole::Present => "present",
            QueueRole::Compute => "compute",
            QueueRole::Transfer => "transfer",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("no suitable gpu adapter was found")]
    NoSuitableDevice,
    #[error("adapter {adapter} is missing device extensions {missing}")]
    MissingDeviceExtensions { adapter: String, missing: String },
    #[error("no queue family supports the {0} role")]
    MissingQueueFamily(QueueRole),
    #[error("the surface reports no supported formats")]
    NoSurfaceFormats,
    #[error("failed to read shader: {0}")]
    Shader(#[from] FsError),
    #[error("invalid spir-v in {path}: {reason}")]
    InvalidShader { path: PathBuf, reason: String },
    #[error("the surface went out of date during {operation}")]
    SurfaceOutOfDate { operation: &'static str },
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
    #[error("{operation} failed: {source}")]
    Fatal {
        operation: &'static str,
        source: GpuError,
    },
    #[error("{operation} violated an invariant: {message}")]
    Invariant {
        operation: &'static str,
        message: String,
    },
    #[error("the renderer is not initialized")]
    NotInitialized,
}

impl RendererError {
    /// Classifies a failed GPU call made while performing `operation`.
    pub fn from_gpu(operation: &'static str, error: GpuError) -> Self {
        match error.class() {
            ErrorClass::Recoverable => Self::SurfaceOutOfDate { operation },
            ErrorClass::Timeout => Self::Timeout { operation },
            ErrorClass::Fatal => Self::Fatal {
                operation,
                source: error,
            },
            ErrorClass::Invariant => Self::invariant(operation, error.to_string()),
        }
    }

    pub fn invariant(operation: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!(target: LOG_TARGET, "invariant violated during {operation}: {message}");
        Self::Invariant { operation, message }
    }

    /// Whether the render loop can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SurfaceOutOfDate { .. })
    }

    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }
}

pub(crate) trait GpuResultExt<T> {
    fn context(self, operation: &'static str) -> Result<T, RendererError>;
}

impl<T> GpuResultExt<T> for Result<T, GpuError> {
    fn context(self, operation: &'static str) -> Result<T, RendererError> {
        self.map_err(|error| RendererError::from_gpu(operation, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_classifies_gpu_errors() {
        let error = Err::<(), _>(GpuError::DeviceLost).context("submit").unwrap_err();
        assert!(matches!(
            error,
            RendererError::Fatal {
                operation: "submit",
                source: GpuError::DeviceLost
            }
        ));
        assert!(error.is_fatal());

        let error = Err::<(), _>(GpuError::Timeout).context("wait").unwrap_err();
        assert!(matches!(error, RendererError::Timeout { operation: "wait" }));

        let error = Err::<(), _>(GpuError::OutOfDate).context("acquire").unwrap_err();
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_unexpected_results_become_invariant_violations() {
        let error = Err::<(), _>(GpuError::Unexpected(ash::vk::Result::ERROR_UNKNOWN))
            .context("present")
            .unwrap_err();

        assert!(matches!(error, RendererError::Invariant { operation: "present", .. }));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RendererError::MissingQueueFamily(QueueRole::Present).to_string(),
            "no queue family supports the present role"
        );
        assert_eq!(
            RendererError::Timeout {
                operation: "wait for in-flight fence"
            }
            .to_string(),
            "wait for in-flight fence timed out"
        );
    }
}
