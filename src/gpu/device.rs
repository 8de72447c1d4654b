// gpu/device.rs — wgpu device for the compute kernels.
//
// Adapter selection prefers real hardware and falls back to whatever the
// instance exposes (software rasterizers included), so the GPU path can
// still be exercised on CI machines without a discrete GPU.

use std::fmt;
use tracing::{debug, info};

/// Cached adapter information for logging.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub name: String,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {:?})", self.name, self.backend, self.device_type)
    }
}

/// Adapter, device and queue used by [`super::GpuKernel`].
///
/// `_instance` is declared last so it is dropped after `device` and `queue`.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: AdapterInfo,
    pub limits: wgpu::Limits,
    _instance: wgpu::Instance,
}

impl GpuDevice {
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::init_async())
    }

    async fn init_async() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapters = instance.enumerate_adapters(wgpu::Backends::PRIMARY);
        for a in &adapters {
            let info = a.get_info();
            debug!(name = %info.name, backend = ?info.backend, device_type = ?info.device_type, "adapter found");
        }

        let adapter = adapters
            .into_iter()
            .min_by_key(|a| match a.get_info().device_type {
                wgpu::DeviceType::DiscreteGpu => 0,
                wgpu::DeviceType::IntegratedGpu => 1,
                wgpu::DeviceType::VirtualGpu | wgpu::DeviceType::Other => 2,
                wgpu::DeviceType::Cpu => 3,
            })
            .ok_or(GpuError::NoSuitableAdapter)?;

        let raw_info = adapter.get_info();
        let adapter_info = AdapterInfo {
            name: raw_info.name.clone(),
            device_type: raw_info.device_type,
            backend: raw_info.backend,
        };

        let limits = wgpu::Limits::default().using_resolution(adapter.limits());
        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("heatmap-interpolation"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits.clone(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(GpuError::DeviceRequest)?;

        info!(adapter = %adapter_info, "gpu device ready");

        Ok(GpuDevice {
            device,
            queue,
            adapter_info,
            limits,
            _instance: instance,
        })
    }

    pub fn max_invocations(&self) -> u32 {
        self.limits.max_compute_invocations_per_workgroup
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpuDevice {{ adapter: {} }}", self.adapter_info)
    }
}

/// Errors from device initialization, dispatch limits and buffer readback.
#[derive(Debug)]
pub enum GpuError {
    NoSuitableAdapter,
    DeviceRequest(wgpu::RequestDeviceError),
    BufferMap(wgpu::BufferAsyncError),
    /// The map callback was dropped before it reported a result.
    MapCallbackLost,
    /// A storage buffer would exceed `max_storage_buffer_binding_size` or
    /// `max_buffer_size`.
    BufferTooLarge { label: &'static str, bytes: u64, max: u64 },
    /// The tile grid exceeds `max_compute_workgroups_per_dimension`.
    TooManyWorkgroups { x: u32, y: u32, max: u32 },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoSuitableAdapter => write!(f, "no GPU adapter available"),
            GpuError::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            GpuError::BufferMap(e) => write!(f, "buffer map failed: {e}"),
            GpuError::MapCallbackLost => write!(f, "buffer map callback was never invoked"),
            GpuError::BufferTooLarge { label, bytes, max } => write!(
                f,
                "{label} buffer needs {bytes} bytes but the device binds at most {max}"
            ),
            GpuError::TooManyWorkgroups { x, y, max } => write!(
                f,
                "dispatch of {x}x{y} workgroups exceeds the per-dimension limit of {max}"
            ),
        }
    }
}

impl std::error::Error for GpuError {}
