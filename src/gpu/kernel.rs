// gpu/kernel.rs — wgpu dispatch of heatmap_interpolate.wgsl.
//
// Bindings (must match the WGSL declarations):
//   0  pixels         storage, read
//   1  result         storage, read_write
//   2  params         uniform (GpuParams)
//   3  missing_total  storage, atomic<u32>
//   4  debug_counts   storage, one u32 per workgroup
//
// All outputs are read back through MAP_READ staging buffers after a
// single submit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;
use wgpu::util::DeviceExt;

use super::device::{GpuDevice, GpuError};
use crate::data_types::{GpuParams, Params, TileSize};
use crate::error::InterpolationError;
use crate::kernel::InterpolationKernel;
use crate::tiling::TileGrid;

/// Version of the WGSL kernel source shipped with this crate.
pub const KERNEL_VERSION: u32 = 1;

const SHADER_TEMPLATE: &str = include_str!("../shaders/heatmap_interpolate.wgsl");

/// Shader source specialised for `tile`.
pub fn shader_source(tile: TileSize) -> String {
    SHADER_TEMPLATE
        .replace("{{CHUNK_W}}", &tile.width.to_string())
        .replace("{{CHUNK_H}}", &tile.height.to_string())
}

pub struct GpuKernel {
    gpu: Arc<GpuDevice>,
    tile: TileSize,
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Rejects tiles the device cannot run as a single workgroup.
fn check_tile_limits(limits: &wgpu::Limits, tile: TileSize) -> Result<(), InterpolationError> {
    tile.validate()?;
    let max = limits.max_compute_invocations_per_workgroup;
    if tile.area() > max {
        return Err(InterpolationError::TileTooLarge { area: tile.area(), max });
    }
    for (axis, size, max) in [
        ('x', tile.width, limits.max_compute_workgroup_size_x),
        ('y', tile.height, limits.max_compute_workgroup_size_y),
    ] {
        if size > max {
            return Err(InterpolationError::TileDimensionTooLarge { axis, size, max });
        }
    }
    Ok(())
}

/// Rejects images whose buffers or workgroup grid exceed the device limits,
/// which wgpu would otherwise report through its uncaptured-error panic.
fn check_dispatch_limits(limits: &wgpu::Limits, grid: &TileGrid) -> Result<(), GpuError> {
    let groups = grid.dispatch_size();
    let max_groups = limits.max_compute_workgroups_per_dimension;
    if groups.x > max_groups || groups.y > max_groups {
        return Err(GpuError::TooManyWorkgroups {
            x: groups.x,
            y: groups.y,
            max: max_groups,
        });
    }

    let max_bytes = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
    let word = std::mem::size_of::<u32>() as u64;
    for (label, bytes) in [
        ("pixel", grid.width as u64 * grid.height as u64 * word),
        ("debug", grid.tile_count().max(1) as u64 * word),
    ] {
        if bytes > max_bytes {
            return Err(GpuError::BufferTooLarge { label, bytes, max: max_bytes });
        }
    }
    Ok(())
}

impl GpuKernel {
    pub fn new(gpu: Arc<GpuDevice>, tile: TileSize) -> Result<Self, InterpolationError> {
        check_tile_limits(&gpu.limits, tile)?;

        let shader = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("heatmap_interpolate.wgsl"),
            source: wgpu::ShaderSource::Wgsl(shader_source(tile).into()),
        });

        let bgl = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("heatmap interpolate BGL"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(3, false),
                storage_entry(4, false),
            ],
        });

        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("heatmap interpolate pipeline layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("interpolate"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "interpolate",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        debug!(%tile, version = KERNEL_VERSION, "compiled gpu interpolation pipeline");

        Ok(Self {
            gpu,
            tile,
            pipeline,
            bgl,
        })
    }

    fn readback(&self, buffer: &wgpu::Buffer) -> Result<Vec<u32>, GpuError> {
        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| GpuError::MapCallbackLost)?
            .map_err(GpuError::BufferMap)?;

        let values = {
            let mapped = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, u32>(&mapped).to_vec()
        };
        buffer.unmap();
        Ok(values)
    }

    fn staging(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

impl InterpolationKernel for GpuKernel {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn tile(&self) -> TileSize {
        self.tile
    }

    fn dispatch(
        &self,
        src: &[u32],
        params: &Params,
        result: &mut [u32],
        missing_total: &AtomicU64,
        debug: Option<&mut [u32]>,
    ) -> Result<(), InterpolationError> {
        if params.width == 0 || params.height == 0 {
            return Ok(());
        }
        let device = &self.gpu.device;
        let grid = TileGrid::new(params.width, params.height, self.tile);
        check_dispatch_limits(&self.gpu.limits, &grid)?;
        let groups = grid.dispatch_size();

        let pixel_bytes = std::mem::size_of_val(src) as u64;
        // Storage bindings must not be empty.
        let debug_bytes = (grid.tile_count().max(1) * std::mem::size_of::<u32>()) as u64;

        let pixels_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("heatmap pixels"),
            contents: bytemuck::cast_slice(src),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let result_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("heatmap result"),
            size: pixel_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let params_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("heatmap params"),
            contents: bytemuck::bytes_of(&GpuParams::from(params)),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let counter_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("heatmap missing total"),
            contents: bytemuck::bytes_of(&0u32),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });
        let debug_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("heatmap debug counts"),
            size: debug_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("heatmap interpolate BG"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: pixels_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: result_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: params_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: counter_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 4, resource: debug_buf.as_entire_binding() },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("heatmap interpolate dispatch"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("interpolate"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups.x, groups.y, 1);
        }

        let result_rb = self.staging("heatmap result readback", pixel_bytes);
        let counter_rb = self.staging("heatmap missing total readback", 4);
        encoder.copy_buffer_to_buffer(&result_buf, 0, &result_rb, 0, pixel_bytes);
        encoder.copy_buffer_to_buffer(&counter_buf, 0, &counter_rb, 0, 4);
        let debug_rb = debug.is_some().then(|| {
            let rb = self.staging("heatmap debug readback", debug_bytes);
            encoder.copy_buffer_to_buffer(&debug_buf, 0, &rb, 0, debug_bytes);
            rb
        });
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        result.copy_from_slice(&self.readback(&result_rb)?);
        let total = self.readback(&counter_rb)?;
        missing_total.fetch_add(total[0] as u64, Ordering::Relaxed);

        if let (Some(debug), Some(rb)) = (debug, debug_rb) {
            let counts = self.readback(&rb)?;
            let n = debug.len().min(counts.len());
            debug[..n].copy_from_slice(&counts[..n]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_source_is_specialised() {
        let src = shader_source(TileSize::new(8, 4));
        assert!(src.contains("const CHUNK_W: u32 = 8u;"));
        assert!(src.contains("const CHUNK_H: u32 = 4u;"));
        assert!(!src.contains("{{"));
        assert!(src.contains(&format!("const KERNEL_VERSION: u32 = {KERNEL_VERSION}u;")));
    }

    #[test]
    fn test_tile_limits_name_the_failing_dimension() {
        let limits = wgpu::Limits {
            max_compute_workgroup_size_y: 8,
            ..wgpu::Limits::default()
        };
        assert!(check_tile_limits(&limits, TileSize::new(16, 8)).is_ok());
        assert!(matches!(
            check_tile_limits(&limits, TileSize::new(2, 16)),
            Err(InterpolationError::TileDimensionTooLarge { axis: 'y', size: 16, max: 8 })
        ));
        assert!(check_tile_limits(&limits, TileSize::new(32, 8)).is_ok());
        assert!(matches!(
            check_tile_limits(&wgpu::Limits::default(), TileSize::new(64, 8)),
            Err(InterpolationError::TileTooLarge { area: 512, max: 256 })
        ));
        assert!(matches!(
            check_tile_limits(&limits, TileSize::new(0, 1)),
            Err(InterpolationError::InvalidTileSize { .. })
        ));
    }

    #[test]
    fn test_dispatch_limits() {
        let limits = wgpu::Limits::default();
        let ok = TileGrid::new(1024, 1024, TileSize::new(16, 16));
        assert!(check_dispatch_limits(&limits, &ok).is_ok());

        // 256 MiB of pixels against a 128 MiB binding limit.
        let big = TileGrid::new(8192, 8192, TileSize::new(16, 16));
        assert!(matches!(
            check_dispatch_limits(&limits, &big),
            Err(GpuError::BufferTooLarge { label: "pixel", bytes, .. }) if bytes == 8192 * 8192 * 4
        ));

        let wide = TileGrid::new(70_000, 1, TileSize::new(1, 1));
        assert!(matches!(
            check_dispatch_limits(&limits, &wide),
            Err(GpuError::TooManyWorkgroups { x: 70_000, y: 1, max: 65_535 })
        ));
    }
}
