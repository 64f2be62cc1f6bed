//! Swapchain negotiation and the rebuild protocol.

use ash::vk;
use volkano_rhi::{
    ColorSpace, Extent2D, Format, GpuDevice, GpuError, PresentMode, SurfaceCapabilities,
    SurfaceFormat, SurfaceInfo, SwapchainCreateInfo,
};

use crate::{
    LOG_TARGET,
    error::{GpuResultExt, RendererError},
};

pub const PREFERRED_FORMAT: Format = vk::Format::B8G8R8A8_SRGB;
pub const PREFERRED_COLOR_SPACE: ColorSpace = vk::ColorSpaceKHR::SRGB_NONLINEAR;

pub fn choose_surface_format(formats: &[SurfaceFormat]) -> Result<SurfaceFormat, RendererError> {
    formats
        .iter()
        .find(|format| {
            format.format == PREFERRED_FORMAT && format.color_space == PREFERRED_COLOR_SPACE
        })
        .or_else(|| formats.first())
        .copied()
        .ok_or(RendererError::NoSurfaceFormats)
}

/// FIFO is always available, mailbox only sometimes.
pub fn choose_present_mode(present_modes: &[PresentMode], prefer_mailbox: bool) -> PresentMode {
    if prefer_mailbox && present_modes.contains(&PresentMode::MAILBOX) {
        PresentMode::MAILBOX
    } else {
        PresentMode::FIFO
    }
}

pub fn choose_extent(capabilities: &SurfaceCapabilities, drawable: Extent2D) -> Extent2D {
    match capabilities.current_extent {
        Some(extent) => extent,
        None => drawable.clamp(capabilities.min_image_extent, capabilities.max_image_extent),
    }
}

pub fn choose_image_count(capabilities: &SurfaceCapabilities) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count.min(capabilities.max_image_count)
    } else {
        image_count
    }
}

fn negotiate(
    info: &SurfaceInfo,
    drawable: Extent2D,
    prefer_mailbox: bool,
) -> Result<SwapchainCreateInfo, RendererError> {
    Ok(SwapchainCreateInfo {
        surface_format: choose_surface_format(&info.formats)?,
        present_mode: choose_present_mode(&info.present_modes, prefer_mailbox),
        extent: choose_extent(&info.capabilities, drawable),
        min_image_count: choose_image_count(&info.capabilities),
        pre_transform: info.capabilities.current_transform,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    Rebuilt,
    /// The surface has no area (or changed again mid-rebuild). The chain
    /// stays stale until a later rebuild succeeds.
    Deferred,
}

/// The swapchain with its images, views and framebuffers.
///
/// Fields are declared in destruction order: framebuffers reference views,
/// views reference swapchain images. The swapchain is absent while the chain
/// is stale and no replacement could be created yet.
pub struct PresentationChain<D: GpuDevice> {
    framebuffers: Vec<D::Framebuffer>,
    views: Vec<D::ImageView>,
    images: Vec<D::Image>,
    swapchain: Option<D::Swapchain>,
    surface_format: SurfaceFormat,
    present_mode: PresentMode,
    extent: Extent2D,
    generation: u64,
    stale: bool,
    prefer_mailbox: bool,
}

impl<D: GpuDevice> PresentationChain<D> {
    /// Creates the swapchain and its views. Framebuffers follow once the
    /// render pass exists, see [`Self::create_framebuffers`].
    ///
    /// A surface without area, or one that is already out of date, yields a
    /// stale chain without a swapchain. The surface format is negotiated
    /// either way so the render pass can be built.
    pub fn new(device: &D, drawable: Extent2D, prefer_mailbox: bool) -> Result<Self, RendererError> {
        let info = device.surface_info().context("query surface")?;
        let create_info = negotiate(&info, drawable, prefer_mailbox)?;

        let mut chain = Self {
            framebuffers: Vec::new(),
            views: Vec::new(),
            images: Vec::new(),
            swapchain: None,
            surface_format: create_info.surface_format,
            present_mode: create_info.present_mode,
            extent: create_info.extent,
            generation: 0,
            stale: true,
            prefer_mailbox,
        };

        if create_info.extent.is_empty() {
            log::info!(target: LOG_TARGET, "surface has no area, swapchain creation is deferred");
            return Ok(chain);
        }

        match device.create_swapchain(&create_info, None) {
            Ok(swapchain) => chain.swapchain = Some(swapchain),
            Err(GpuError::OutOfDate) => {
                log::debug!(target: LOG_TARGET, "surface out of date at startup, deferring");
                return Ok(chain);
            }
            Err(error) => return Err(RendererError::from_gpu("create swapchain", error)),
        }
        chain.stale = false;
        chain.create_views(device)?;

        log::info!(
            target: LOG_TARGET,
            "created presentation chain: {} images at {} ({:?}, {:?})",
            chain.images.len(),
            chain.extent,
            chain.surface_format.format,
            chain.present_mode,
        );

        Ok(chain)
    }

    fn create_views(&mut self, device: &D) -> Result<(), RendererError> {
        let Some(swapchain) = &self.swapchain else {
            return Ok(());
        };
        self.images = device
            .swapchain_images(swapchain)
            .context("get swapchain images")?;

        self.views = self
            .images
            .iter()
            .map(|&image| device.create_image_view(image, self.surface_format.format))
            .collect::<Result<Vec<_>, _>>()
            .context("create image view")?;

        Ok(())
    }

    /// Creates one framebuffer per view at the chain's extent.
    pub fn create_framebuffers(
        &mut self,
        device: &D,
        render_pass: &D::RenderPass,
    ) -> Result<(), RendererError> {
        self.framebuffers.clear();
        self.framebuffers = self
            .views
            .iter()
            .map(|view| device.create_framebuffer(render_pass, view, self.extent))
            .collect::<Result<Vec<_>, _>>()
            .context("create framebuffer")?;

        Ok(())
    }

    /// Recreates the swapchain for the current surface state.
    ///
    /// The old swapchain is handed to the new one and destroyed only after
    /// the creation call returns.
    pub fn rebuild(
        &mut self,
        device: &D,
        render_pass: &D::RenderPass,
        render_pass_format: Format,
        drawable: Extent2D,
    ) -> Result<RebuildOutcome, RendererError> {
        let info = device.surface_info().context("query surface")?;
        let create_info = negotiate(&info, drawable, self.prefer_mailbox)?;

        if create_info.extent.is_empty() {
            if !self.stale {
                log::debug!(target: LOG_TARGET, "surface has no area, deferring rebuild");
            }
            self.stale = true;
            return Ok(RebuildOutcome::Deferred);
        }

        device.wait_idle().context("wait for device idle")?;

        self.stale = true;
        self.framebuffers.clear();
        self.views.clear();
        self.images.clear();

        // The old swapchain is retired even if creation fails.
        let retired = self.swapchain.take();
        let created = device.create_swapchain(&create_info, retired.as_ref());
        drop(retired);

        let swapchain = match created {
            Ok(swapchain) => swapchain,
            Err(GpuError::OutOfDate) => {
                log::debug!(target: LOG_TARGET, "surface changed during rebuild, deferring");
                return Ok(RebuildOutcome::Deferred);
            }
            Err(error) => return Err(RendererError::from_gpu("recreate swapchain", error)),
        };
        self.swapchain = Some(swapchain);

        self.surface_format = create_info.surface_format;
        self.present_mode = create_info.present_mode;
        self.extent = create_info.extent;

        if self.surface_format.format != render_pass_format {
            log::warn!(
                target: LOG_TARGET,
                "surface format changed from {:?} to {:?}, the render pass is kept",
                render_pass_format,
                self.surface_format.format,
            );
        }

        self.create_views(device)?;
        self.create_framebuffers(device, render_pass)?;

        self.generation += 1;
        self.stale = false;

        log::info!(
            target: LOG_TARGET,
            "rebuilt presentation chain (generation {}): {} images at {}",
            self.generation,
            self.images.len(),
            self.extent,
        );

        Ok(RebuildOutcome::Rebuilt)
    }

    /// `None` until a swapchain could be created for the surface.
    pub fn swapchain(&self) -> Option<&D::Swapchain> {
        self.swapchain.as_ref()
    }

    pub fn framebuffer(&self, image_index: u32) -> Option<&D::Framebuffer> {
        self.framebuffers.get(image_index as usize)
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn surface_format(&self) -> SurfaceFormat {
        self.surface_format
    }

    pub fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    /// Number of successful rebuilds.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }
}
