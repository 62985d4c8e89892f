//! Explicit graphics context.
//!
//! One [`GraphicsContext`] is created by the application and passed by
//! reference into every component that owns GPU resources. Nothing in the
//! crate keeps an ambient device handle.

use thiserror::Error;

/// Bind groups used by the strand compute pipeline:
/// global, method-local, hair storage, grid storage, hair params, colliders.
pub const REQUIRED_BIND_GROUPS: u32 = 6;

/// Storage buffers bound at once by the integrate kernel.
pub const REQUIRED_STORAGE_BUFFERS: u32 = 6;

/// Errors raised while creating or using GPU resources.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("adapter supports {available} {limit}, {required} required")]
    UnsupportedLimit {
        limit: &'static str,
        available: u32,
        required: u32,
    },

    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("GPU error during {context}: {source}")]
    Scope {
        context: &'static str,
        #[source]
        source: wgpu::Error,
    },

    #[error("{0} is not ready on the GPU")]
    NotPrepared(&'static str),
}

/// Device, queue and the formats every render pipeline targets.
pub struct GraphicsContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
}

impl GraphicsContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, surface_format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            queue,
            surface_format,
            depth_format: wgpu::TextureFormat::Depth32Float,
        }
    }

    /// Pick an adapter and open a device with the limits the hair pipeline needs.
    ///
    /// `compatible_surface` is `None` for headless use (tests, tools).
    pub async fn request_device(
        instance: &wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), GpuError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let required_limits = Self::required_limits(&adapter.limits())?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Hair Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        Ok((adapter, device, queue))
    }

    /// Default limits with the bind group count raised to six.
    ///
    /// wgpu's defaults stop at four bind groups, one short of the fixed
    /// six-set compute layout.
    pub fn required_limits(available: &wgpu::Limits) -> Result<wgpu::Limits, GpuError> {
        if available.max_bind_groups < REQUIRED_BIND_GROUPS {
            return Err(GpuError::UnsupportedLimit {
                limit: "bind groups",
                available: available.max_bind_groups,
                required: REQUIRED_BIND_GROUPS,
            });
        }
        if available.max_storage_buffers_per_shader_stage < REQUIRED_STORAGE_BUFFERS {
            return Err(GpuError::UnsupportedLimit {
                limit: "storage buffers per stage",
                available: available.max_storage_buffers_per_shader_stage,
                required: REQUIRED_STORAGE_BUFFERS,
            });
        }

        Ok(wgpu::Limits {
            max_bind_groups: REQUIRED_BIND_GROUPS,
            ..wgpu::Limits::default()
        })
    }

    /// Run `f` inside validation and out-of-memory error scopes.
    ///
    /// GPU failures come back as `Err` at the call that caused them instead of
    /// reaching the uncaptured error handler.
    pub fn checked<T>(&self, context: &'static str, f: impl FnOnce(&Self) -> T) -> Result<T, GpuError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let value = f(self);

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match validation.or(out_of_memory) {
            Some(source) => Err(GpuError::Scope { context, source }),
            None => Ok(value),
        }
    }

    /// Submit `encoder` and block until the GPU has finished it.
    pub fn submit_and_wait(&self, encoder: wgpu::CommandEncoder) {
        let index = self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::WaitForSubmissionIndex(index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_limits_raise_bind_groups() {
        let limits = GraphicsContext::required_limits(&wgpu::Limits::default()).unwrap_err();
        // Plain defaults only offer four bind groups.
        assert!(matches!(
            limits,
            GpuError::UnsupportedLimit { available: 4, required: 6, .. }
        ));

        let adapter = wgpu::Limits {
            max_bind_groups: 8,
            ..wgpu::Limits::default()
        };
        let limits = GraphicsContext::required_limits(&adapter).unwrap();
        assert_eq!(limits.max_bind_groups, REQUIRED_BIND_GROUPS);
        assert_eq!(
            limits.max_storage_buffers_per_shader_stage,
            wgpu::Limits::default().max_storage_buffers_per_shader_stage
        );
    }

    #[test]
    fn test_required_limits_rejects_few_storage_buffers() {
        let adapter = wgpu::Limits {
            max_bind_groups: 8,
            max_storage_buffers_per_shader_stage: 4,
            ..wgpu::Limits::default()
        };
        let err = GraphicsContext::required_limits(&adapter).unwrap_err();
        assert!(matches!(err, GpuError::UnsupportedLimit { limit: "storage buffers per stage", .. }));
    }
}
