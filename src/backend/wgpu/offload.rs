//! Per-invocation device offload of the convolution kernel.
//!
//! One call walks the full device lifecycle in order: adapter selection,
//! device and queue acquisition, runtime compilation of the embedded WGSL
//! program, buffer allocation and host-to-device copies, a 2D dispatch
//! with one invocation per output cell, a blocking wait, and staging
//! readback. Every handle is an owned value in this scope, so any early
//! return releases exactly the resources acquired up to that point, newest
//! first.

use std::time::Duration;

use wgpu::{BufferDescriptor, BufferUsages};

use super::device::request_adapter_blocking;
use crate::error::{Error, Result};
use crate::grid::{ConvShape, Grid};

/// Workgroup edge length; the dispatch covers the result in 16x16 tiles.
const WORKGROUP_DIM: u32 = 16;

/// Host-side bound on kernel completion and readback waits.
const WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Geometry uniform for the kernel.
///
/// Field order and the eight-word size match `ConvParams` in the WGSL
/// source; the trailing pads keep the uniform 16-byte sized.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ConvParams {
    image_h: u32,
    image_w: u32,
    filter_h: u32,
    filter_w: u32,
    out_h: u32,
    out_w: u32,
    pad0: u32,
    pad1: u32,
}

impl ConvParams {
    fn from_shape(shape: &ConvShape) -> Self {
        Self {
            image_h: shape.image_h as u32,
            image_w: shape.image_w as u32,
            filter_h: shape.filter_h as u32,
            filter_w: shape.filter_w as u32,
            out_h: shape.out_h as u32,
            out_w: shape.out_w as u32,
            pad0: 0,
            pad1: 0,
        }
    }
}

/// The kernel program, compiled by the driver at run time. One invocation
/// per output cell performs the same sliding-window multiply-accumulate as
/// the scalar reference.
const CONV_SHADER: &str = r#"
struct ConvParams {
    image_h: u32,
    image_w: u32,
    filter_h: u32,
    filter_w: u32,
    out_h: u32,
    out_w: u32,
    pad0: u32,
    pad1: u32,
}

@group(0) @binding(0) var<storage, read_write> conv_image: array<i32>;
@group(0) @binding(1) var<storage, read_write> conv_filter: array<i32>;
@group(0) @binding(2) var<storage, read_write> conv_out: array<i32>;
@group(0) @binding(3) var<uniform> conv_params: ConvParams;

@compute @workgroup_size(16, 16)
fn conv2d_i32(@builtin(global_invocation_id) gid: vec3<u32>) {
    let j = gid.x;
    let i = gid.y;
    if (i >= conv_params.out_h || j >= conv_params.out_w) {
        return;
    }
    var sum: i32 = 0;
    for (var fi: u32 = 0u; fi < conv_params.filter_h; fi = fi + 1u) {
        for (var fj: u32 = 0u; fj < conv_params.filter_w; fj = fj + 1u) {
            let iv = conv_image[(i + fi) * conv_params.image_w + j + fj];
            let fv = conv_filter[fi * conv_params.filter_w + fj];
            sum = sum + iv * fv;
        }
    }
    conv_out[i * conv_params.out_w + j] = sum;
}
"#;

/// Convolve on the device and read the result back.
///
/// # Errors
///
/// Returns an error when no adapter is present, when any setup stage
/// fails (device request, program build, dispatch wait), or when readback
/// fails. Resources acquired before the failure point are dropped on the
/// way out.
pub fn convolve_device(image: &Grid, filter: &Grid, shape: &ConvShape) -> Result<Grid> {
    // Platform and device selection.
    let adapter = request_adapter_blocking()?;
    let info = adapter.get_info();
    log::debug!("offloading to {} ({:?})", info.name, info.backend);

    // Execution context: device handle plus submission queue.
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("convr device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
        experimental_features: wgpu::ExperimentalFeatures::default(),
    }))
    .map_err(|e| Error::device_setup("context", e))?;

    // Program build inside a validation scope so a compile failure is an
    // error here rather than a fault at dispatch.
    let err_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("conv2d_i32"),
        source: wgpu::ShaderSource::Wgsl(CONV_SHADER.into()),
    });

    let mut layout_entries = Vec::new();
    for binding in 0..3 {
        layout_entries.push(wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    }
    layout_entries.push(wgpu::BindGroupLayoutEntry {
        binding: 3,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    });
    let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("conv2d_i32_layout"),
        entries: &layout_entries,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("conv2d_i32_layout"),
        bind_group_layouts: &[&bind_layout],
        immediate_size: 0,
    });
    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("conv2d_i32"),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some("conv2d_i32"),
        compilation_options: Default::default(),
        cache: None,
    });

    if let Some(e) = pollster::block_on(err_scope.pop()) {
        return Err(Error::device_setup("program_build", e));
    }

    // Device-visible buffers; image and filter are copied in, the result
    // is produced on-device and staged out.
    let elem = std::mem::size_of::<i32>() as u64;
    let image_bytes = image.len() as u64 * elem;
    let filter_bytes = filter.len() as u64 * elem;
    let out_bytes = shape.out_len() as u64 * elem;

    let image_buf = device.create_buffer(&BufferDescriptor {
        label: Some("conv image"),
        size: image_bytes,
        usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let filter_buf = device.create_buffer(&BufferDescriptor {
        label: Some("conv filter"),
        size: filter_bytes,
        usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let result_buf = device.create_buffer(&BufferDescriptor {
        label: Some("conv result"),
        size: out_bytes,
        usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    let params_buf = device.create_buffer(&BufferDescriptor {
        label: Some("conv params"),
        size: std::mem::size_of::<ConvParams>() as u64,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let staging = device.create_buffer(&BufferDescriptor {
        label: Some("conv staging"),
        size: out_bytes,
        usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    queue.write_buffer(&image_buf, 0, bytemuck::cast_slice(image.as_slice()));
    queue.write_buffer(&filter_buf, 0, bytemuck::cast_slice(filter.as_slice()));
    queue.write_buffer(
        &params_buf,
        0,
        bytemuck::bytes_of(&ConvParams::from_shape(shape)),
    );

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("conv2d_i32_bind_group"),
        layout: &bind_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: image_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: filter_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: result_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: params_buf.as_entire_binding(),
            },
        ],
    });

    // Dispatch over a 2D index space sized to the result, then stage the
    // result buffer out for readback.
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("conv2d_i32"),
    });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("conv2d_i32"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(
            (shape.out_w as u32).div_ceil(WORKGROUP_DIM),
            (shape.out_h as u32).div_ceil(WORKGROUP_DIM),
            1,
        );
    }
    encoder.copy_buffer_to_buffer(&result_buf, 0, &staging, 0, out_bytes);

    // The host blocks until the device finishes.
    let submission = queue.submit(std::iter::once(encoder.finish()));
    device
        .poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: Some(WAIT_TIMEOUT),
        })
        .map_err(|e| Error::device_setup("dispatch", e))?;

    // Readback through the staging buffer.
    let slice = staging.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(WAIT_TIMEOUT),
        })
        .map_err(|e| Error::device_setup("readback", e))?;
    let map_result = receiver
        .recv()
        .map_err(|_| Error::device_setup("readback", "map_async callback was not invoked"))?;
    map_result.map_err(|e| Error::device_setup("readback", e))?;

    let mut out = Grid::zeros(shape.out_h, shape.out_w);
    {
        let data = slice.get_mapped_range();
        let src: &[i32] = bytemuck::cast_slice(&data);
        let n = out.len();
        out.as_mut_slice().copy_from_slice(&src[..n]);
    }
    staging.unmap();

    Ok(out)
    // Dropping from here releases, newest-first: staging, bind group, the
    // four buffers, pipeline, layouts, module, queue, device, adapter.
}

// ============================================================================
// Tests
// ============================================================================
