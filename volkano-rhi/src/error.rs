use ash::vk;

/// How a failed GPU call should be handled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The surface changed under the swapchain. Rebuilding it recovers.
    Recoverable,
    /// The device or surface is gone, or memory ran out.
    Fatal,
    /// A bounded wait expired.
    Timeout,
    /// A result the renderer never expects to see.
    Invariant,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GpuError {
    #[error("the swapchain is out of date")]
    OutOfDate,
    #[error("the device was lost")]
    DeviceLost,
    #[error("the surface was lost")]
    SurfaceLost,
    #[error("out of host memory")]
    OutOfHostMemory,
    #[error("out of device memory")]
    OutOfDeviceMemory,
    #[error("initialization failed")]
    InitializationFailed,
    #[error("the wait timed out")]
    Timeout,
    #[error("missing layer or extension: {0}")]
    MissingLayerOrExtension(String),
    #[error("failed to load the vulkan library: {0}")]
    Loading(String),
    #[error("failed to allocate gpu memory: {0}")]
    Allocation(String),
    #[error("invalid window handle: {0}")]
    WindowHandle(String),
    #[error("unexpected vulkan result: {0}")]
    Unexpected(vk::Result),
}

impl GpuError {
    /// Maps a raw Vulkan error code.
    pub fn from_vk(result: vk::Result) -> Self {
        match result {
            vk::Result::ERROR_OUT_OF_DATE_KHR => Self::OutOfDate,
            vk::Result::ERROR_DEVICE_LOST => Self::DeviceLost,
            vk::Result::ERROR_SURFACE_LOST_KHR => Self::SurfaceLost,
            vk::Result::ERROR_OUT_OF_HOST_MEMORY => Self::OutOfHostMemory,
            vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => Self::OutOfDeviceMemory,
            vk::Result::ERROR_INITIALIZATION_FAILED => Self::InitializationFailed,
            vk::Result::TIMEOUT | vk::Result::NOT_READY => Self::Timeout,
            vk::Result::ERROR_LAYER_NOT_PRESENT
            | vk::Result::ERROR_EXTENSION_NOT_PRESENT
            | vk::Result::ERROR_FEATURE_NOT_PRESENT => {
                Self::MissingLayerOrExtension(result.to_string())
            }
            other => Self::Unexpected(other),
        }
    }

    /// Classifies the error.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::OutOfDate => ErrorClass::Recoverable,
            Self::Timeout => ErrorClass::Timeout,
            Self::Unexpected(_) => ErrorClass::Invariant,
            Self::DeviceLost
            | Self::SurfaceLost
            | Self::OutOfHostMemory
            | Self::OutOfDeviceMemory
            | Self::InitializationFailed
            | Self::MissingLayerOrExtension(_)
            | Self::Loading(_)
            | Self::Allocation(_)
            | Self::WindowHandle(_) => ErrorClass::Fatal,
        }
    }
}

impl From<vk::Result> for GpuError {
    fn from(result: vk::Result) -> Self {
        Self::from_vk(result)
    }
}

impl From<ash::LoadingError> for GpuError {
    fn from(error: ash::LoadingError) -> Self {
        Self::Loading(error.to_string())
    }
}

impl From<gpu_allocator::AllocationError> for GpuError {
    fn from(error: gpu_allocator::AllocationError) -> Self {
        match error {
            gpu_allocator::AllocationError::OutOfMemory => Self::OutOfDeviceMemory,
            other => Self::Allocation(other.to_string()),
        }
    }
}

impl From<raw_window_handle::HandleError> for GpuError {
    fn from(error: raw_window_handle::HandleError) -> Self {
        Self::WindowHandle(error.to_string())
    }
}
