// gpu/mod.rs — wgpu backend (cargo feature `gpu`).
//
// The CPU kernel in `crate::kernel` is the reference; the GPU kernel is
// checked against it in the ignored integration tests.

pub mod device;
pub mod kernel;

pub use device::{GpuDevice, GpuError};
pub use kernel::{GpuKernel, KERNEL_VERSION};
