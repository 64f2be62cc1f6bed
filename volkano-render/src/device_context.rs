//! Adapter selection, queue-family resolution and logical device creation.

use smallvec::SmallVec;
use volkano_rhi::{
    AdapterProperties, AdapterType, DeviceCreateInfo, DeviceExtensions, GpuDevice, GpuInstance,
    QueueFamilyProperties, QueueFlags,
};

use crate::{
    LOG_TARGET,
    error::{GpuResultExt, QueueRole, RendererError},
};

/// Ranks an adapter. Zero means the adapter is unusable.
pub fn adapter_score(properties: &AdapterProperties) -> u32 {
    match properties.adapter_type {
        AdapterType::DiscreteGpu => 1000,
        AdapterType::IntegratedGpu => 100,
        AdapterType::VirtualGpu => 10,
        AdapterType::Cpu | AdapterType::Other => 0,
    }
}

/// Returns the usable adapters, best first. Adapters with equal scores keep
/// their enumeration order.
pub fn rank_adapters<I: GpuInstance>(
    instance: &I,
) -> Result<Vec<(I::Adapter, AdapterProperties)>, RendererError> {
    let adapters = instance
        .enumerate_adapters()
        .context("enumerate adapters")?;

    let mut ranked = adapters
        .into_iter()
        .map(|adapter| {
            let properties = instance.adapter_properties(&adapter);
            log::info!(
                target: LOG_TARGET,
                "found adapter {} ({}, api {}, score {})",
                properties.name,
                properties.adapter_type,
                properties.api_version,
                adapter_score(&properties),
            );
            (adapter, properties)
        })
        .filter(|(_, properties)| adapter_score(properties) > 0)
        .collect::<Vec<_>>();

    ranked.sort_by_key(|(_, properties)| std::cmp::Reverse(adapter_score(properties)));
    Ok(ranked)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
    pub compute: Option<u32>,
    pub transfer: Option<u32>,
}

impl QueueFamilyIndices {
    /// Assigns a family to every role the adapter can serve.
    ///
    /// `present_support[i]` tells whether family `i` can present to the
    /// surface. Graphics prefers a family that can also present, present
    /// prefers the graphics family, compute and transfer prefer families
    /// without graphics. Roles nobody prefers fall back to the first family
    /// that merely supports them.
    pub fn resolve(families: &[QueueFamilyProperties], present_support: &[bool]) -> Self {
        let can_present = |index: usize| present_support.get(index).copied().unwrap_or(false);
        let has = |family: &QueueFamilyProperties, flags: QueueFlags| {
            family.queue_flags.contains(flags)
        };
        let first = |predicate: &dyn Fn(usize, &QueueFamilyProperties) -> bool| {
            families
                .iter()
                .enumerate()
                .filter(|(_, family)| family.queue_count > 0)
                .find(|(index, family)| predicate(*index, family))
                .map(|(index, _)| index as u32)
        };

        let graphics = first(&|index, family| has(family, QueueFlags::GRAPHICS) && can_present(index))
            .or_else(|| first(&|_, family| has(family, QueueFlags::GRAPHICS)));

        let present = graphics
            .filter(|&index| can_present(index as usize))
            .or_else(|| first(&|index, _| can_present(index)));

        let compute = first(&|_, family| {
            has(family, QueueFlags::COMPUTE) && !has(family, QueueFlags::GRAPHICS)
        })
        .or_else(|| first(&|_, family| has(family, QueueFlags::COMPUTE)));

        let transfer = first(&|_, family| {
            has(family, QueueFlags::TRANSFER) && !has(family, QueueFlags::GRAPHICS)
        })
        .or_else(|| first(&|_, family| family.supports_transfer()));

        Self {
            graphics,
            present,
            compute,
            transfer,
        }
    }

    /// The distinct resolved families, ascending.
    pub fn unique_families(&self) -> SmallVec<[u32; 4]> {
        let mut families = [self.graphics, self.present, self.compute, self.transfer]
            .into_iter()
            .flatten()
            .collect::<SmallVec<[u32; 4]>>();

        families.sort_unstable();
        families.dedup();
        families
    }
}

/// The logical device and the queues retrieved for each role.
pub struct DeviceContext<D: GpuDevice> {
    pub properties: AdapterProperties,
    pub indices: QueueFamilyIndices,
    pub graphics_family: u32,
    pub present_family: u32,
    pub graphics_queue: D::Queue,
    pub present_queue: D::Queue,
    pub compute_queue: Option<D::Queue>,
    pub transfer_queue: Option<D::Queue>,
    pub device: D,
}

/// Picks the best adapter and creates a logical device on it.
pub fn select_and_initialize<I: GpuInstance>(
    instance: &I,
) -> Result<DeviceContext<I::Device>, RendererError> {
    let (adapter, properties) = rank_adapters(instance)?
        .into_iter()
        .next()
        .ok_or(RendererError::NoSuitableDevice)?;

    log::info!(target: LOG_TARGET, "selected adapter {}", properties.name);

    let families = instance.queue_family_properties(&adapter);
    let present_support = (0..families.len() as u32)
        .map(|index| instance.surface_support(&adapter, index))
        .collect::<Result<Vec<_>, _>>()
        .context("query surface support")?;

    let indices = QueueFamilyIndices::resolve(&families, &present_support);
    log::info!(target: LOG_TARGET, "resolved queue families {indices:?}");

    let graphics_family = indices
        .graphics
        .ok_or(RendererError::MissingQueueFamily(QueueRole::Graphics))?;
    let present_family = indices
        .present
        .ok_or(RendererError::MissingQueueFamily(QueueRole::Present))?;

    let required = DeviceExtensions::required();
    let missing = required.difference(&instance.supported_device_extensions(&adapter));
    if !missing.is_empty() {
        return Err(RendererError::MissingDeviceExtensions {
            adapter: properties.name,
            missing: missing.to_string(),
        });
    }

    let queue_family_indices = indices.unique_families();
    let device = instance
        .create_device(
            &adapter,
            &DeviceCreateInfo {
                queue_family_indices: &queue_family_indices,
                extensions: required,
            },
        )
        .context("create logical device")?;

    Ok(DeviceContext {
        graphics_queue: device.get_queue(graphics_family),
        present_queue: device.get_queue(present_family),
        compute_queue: indices.compute.map(|index| device.get_queue(index)),
        transfer_queue: indices.transfer.map(|index| device.get_queue(index)),
        properties,
        indices,
        graphics_family,
        present_family,
        device,
    })
}

#[cfg(test)]
mod tests {
    use volkano_rhi::Version;

    use super::*;

    fn properties(adapter_type: AdapterType) -> AdapterProperties {
        AdapterProperties {
            api_version: Version::V1_3,
            driver_version: Version::new(1, 0, 0),
            vendor_id: 0,
            device_id: 0,
            adapter_type,
            name: adapter_type.to_string(),
        }
    }

    fn family(flags: QueueFlags) -> QueueFamilyProperties {
        QueueFamilyProperties::new(flags, 1)
    }

    #[test]
    fn test_adapter_scores_are_ordered() {
        let discrete = adapter_score(&properties(AdapterType::DiscreteGpu));
        let integrated = adapter_score(&properties(AdapterType::IntegratedGpu));
        let virtual_gpu = adapter_score(&properties(AdapterType::VirtualGpu));

        assert!(discrete > integrated);
        assert!(integrated > virtual_gpu);
        assert!(virtual_gpu > 0);
        assert_eq!(adapter_score(&properties(AdapterType::Cpu)), 0);
        assert_eq!(adapter_score(&properties(AdapterType::Other)), 0);
    }

    #[test]
    fn test_present_coincides_with_graphics() {
        let families = [
            family(QueueFlags::GRAPHICS | QueueFlags::COMPUTE | QueueFlags::TRANSFER),
            family(QueueFlags::COMPUTE | QueueFlags::TRANSFER),
            family(QueueFlags::TRANSFER),
        ];

        let indices = QueueFamilyIndices::resolve(&families, &[true, true, false]);

        assert_eq!(indices.graphics, Some(0));
        assert_eq!(indices.present, Some(0));
        assert_eq!(indices.compute, Some(1));
        assert_eq!(indices.transfer, Some(1));
        assert_eq!(indices.unique_families().as_slice(), &[0, 1]);
    }

    #[test]
    fn test_graphics_prefers_a_presenting_family() {
        let families = [family(QueueFlags::GRAPHICS), family(QueueFlags::GRAPHICS)];

        let indices = QueueFamilyIndices::resolve(&families, &[false, true]);

        assert_eq!(indices.graphics, Some(1));
        assert_eq!(indices.present, Some(1));
    }

    #[test]
    fn test_separate_present_family() {
        let families = [family(QueueFlags::GRAPHICS), family(QueueFlags::empty())];

        let indices = QueueFamilyIndices::resolve(&families, &[false, true]);

        assert_eq!(indices.graphics, Some(0));
        assert_eq!(indices.present, Some(1));
    }

    #[test]
    fn test_transfer_falls_back_to_graphics_family() {
        let families = [family(QueueFlags::GRAPHICS | QueueFlags::COMPUTE)];

        let indices = QueueFamilyIndices::resolve(&families, &[true]);

        assert_eq!(indices.compute, Some(0));
        assert_eq!(indices.transfer, Some(0));
        assert_eq!(indices.unique_families().as_slice(), &[0]);
    }

    #[test]
    fn test_graphics_is_resolved_whenever_a_family_has_it() {
        let layouts: [&[QueueFlags]; 3] = [
            &[QueueFlags::TRANSFER, QueueFlags::GRAPHICS],
            &[QueueFlags::COMPUTE, QueueFlags::TRANSFER, QueueFlags::GRAPHICS],
            &[QueueFlags::GRAPHICS | QueueFlags::TRANSFER],
        ];

        for layout in layouts {
            let families = layout.iter().copied().map(family).collect::<Vec<_>>();
            let indices = QueueFamilyIndices::resolve(&families, &vec![false; families.len()]);
            assert!(indices.graphics.is_some(), "{layout:?}");
            assert_eq!(indices.present, None);
        }
    }

    #[test]
    fn test_empty_families_are_skipped() {
        let families = [
            QueueFamilyProperties::new(QueueFlags::GRAPHICS, 0),
            family(QueueFlags::GRAPHICS),
        ];

        let indices = QueueFamilyIndices::resolve(&families, &[true, true]);
        assert_eq!(indices.graphics, Some(1));
    }
}
