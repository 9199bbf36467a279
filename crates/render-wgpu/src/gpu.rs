use bytemuck::Zeroable;
use wgpu::util::DeviceExt;
use voxelspace_kernel::VoxelGrid;
use voxelspace_render::{RenderView, Settings, tile_grid};

use crate::shaders;
use crate::uniforms::FrameUniforms;

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("grid edge {size} exceeds the device's 3D texture limit {limit}")]
    GridTooLarge { size: u32, limit: u32 },
}

/// Render target written by the compute kernel and read by the present pass.
struct Target {
    compute_bind_group: wgpu::BindGroup,
    present_bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// GPU ray caster: the voxel grid lives in a 3D `R8Uint` texture, each frame
/// runs one compute dispatch over 16x16 tiles and blits the result.
pub struct WgpuRenderer {
    raycast_pipeline: wgpu::ComputePipeline,
    present_pipeline: wgpu::RenderPipeline,
    target_layout: wgpu::BindGroupLayout,
    present_layout: wgpu::BindGroupLayout,
    scene_bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    target: Target,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        grid: &VoxelGrid,
        settings: &Settings,
    ) -> Result<Self, GpuError> {
        let limit = device.limits().max_texture_dimension_3d;
        if grid.size() > limit {
            return Err(GpuError::GridTooLarge {
                size: grid.size(),
                limit,
            });
        }

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let voxel_view = upload_voxels(device, queue, grid);

        let target_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("raycast_target_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: TARGET_FORMAT,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            }],
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("raycast_scene_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Uint,
                        view_dimension: wgpu::TextureViewDimension::D3,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raycast_scene"),
            layout: &scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&voxel_view),
                },
            ],
        });

        let present_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("present_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let raycast_source = shaders::raycast_shader(settings, grid.size());
        let raycast_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("raycast_shader"),
            source: wgpu::ShaderSource::Wgsl(raycast_source.into()),
        });
        let raycast_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("raycast_pipeline_layout"),
            bind_group_layouts: &[&target_layout, &scene_layout],
            push_constant_ranges: &[],
        });
        let raycast_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("raycast_pipeline"),
            layout: Some(&raycast_layout),
            module: &raycast_module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let present_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("present_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PRESENT_SHADER.into()),
        });
        let present_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("present_pipeline_layout"),
                bind_group_layouts: &[&present_layout],
                push_constant_ranges: &[],
            });
        let present_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("present_pipeline"),
            layout: Some(&present_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &present_module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &present_module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let target = create_target(device, &target_layout, &present_layout, width, height);

        Ok(Self {
            raycast_pipeline,
            present_pipeline,
            target_layout,
            present_layout,
            scene_bind_group,
            uniform_buffer,
            target,
            surface_format,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.target = create_target(
            device,
            &self.target_layout,
            &self.present_layout,
            width,
            height,
        );
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Ray cast one frame into the storage target and draw it to `surface_view`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
        view: &RenderView,
    ) {
        let _span = tracing::trace_span!(
            "gpu_frame",
            width = self.target.width,
            height = self.target.height
        )
        .entered();
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_view(view)),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        {
            let (tiles_x, tiles_y) = tile_grid(self.target.width, self.target.height);
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("raycast_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.raycast_pipeline);
            pass.set_bind_group(0, &self.target.compute_bind_group, &[]);
            pass.set_bind_group(1, &self.scene_bind_group, &[]);
            pass.dispatch_workgroups(tiles_x, tiles_y, 1);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("present_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            pass.set_pipeline(&self.present_pipeline);
            pass.set_bind_group(0, &self.target.present_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Copy the grid bytes into a 3D texture once; the layout `x + y*n + z*n*n`
/// maps directly onto texel rows and images.
fn upload_voxels(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    grid: &VoxelGrid,
) -> wgpu::TextureView {
    let n = grid.size();
    let _span = tracing::info_span!("upload_voxels", size = n).entered();
    let extent = wgpu::Extent3d {
        width: n,
        height: n,
        depth_or_array_layers: n,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("voxel_grid"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D3,
        format: wgpu::TextureFormat::R8Uint,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        grid.as_bytes(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(n),
            rows_per_image: Some(n),
        },
        extent,
    );
    tracing::info!(
        bytes = grid.as_bytes().len(),
        solid = grid.solid_count(),
        "voxel grid uploaded"
    );
    texture.create_view(&Default::default())
}

fn create_target(
    device: &wgpu::Device,
    target_layout: &wgpu::BindGroupLayout,
    present_layout: &wgpu::BindGroupLayout,
    width: u32,
    height: u32,
) -> Target {
    let width = width.max(1);
    let height = height.max(1);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("raycast_target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&Default::default());

    let compute_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("raycast_target"),
        layout: target_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(&view),
        }],
    });
    let present_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("present_source"),
        layout: present_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(&view),
        }],
    });

    Target {
        compute_bind_group,
        present_bind_group,
        width,
        height,
    }
}
