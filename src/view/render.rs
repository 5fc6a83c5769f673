use glam::Mat4;
use tracing::{debug, info};
use wgpu::util::DeviceExt;
use wgpu::*;

use crate::controller::ViewerState;
use crate::model::{Color, LightRig, MeshBuffer, ObjectId, SceneObject, Vertex, geometry};
use crate::view::gpu_init::GpuContext;
use crate::view::textures::{self, GpuTexture};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.02, g: 0.025, b: 0.035, a: 1.0 };

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub ambient: [f32; 4],
    pub dir_direction: [[f32; 4]; 3],
    pub dir_color: [[f32; 4]; 3],
    pub point_position: [f32; 4],
    pub spot_position: [f32; 4],
    pub spot_direction: [f32; 4],
    pub spot_cone: [f32; 4],
}

impl LightingUniform {
    pub fn from_rig(rig: &LightRig) -> Self {
        let dir_direction = rig.directional.map(|light| light.to_light().extend(light.intensity).to_array());
        let dir_color = rig.directional.map(|light| {
            let [r, g, b] = srgb_to_linear(light.color);
            [r, g, b, 1.0]
        });
        let (cos_outer, cos_inner) = rig.spot.cone_cosines();

        Self {
            ambient: [rig.ambient, 0.0, 0.0, 0.0],
            dir_direction,
            dir_color,
            point_position: rig.point.position.extend(rig.point.intensity).to_array(),
            spot_position: rig.spot.position.extend(rig.spot.intensity).to_array(),
            spot_direction: rig.spot.direction().extend(0.0).to_array(),
            spot_cone: [cos_outer, cos_inner, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub uv_row0: [f32; 4],
    pub uv_row1: [f32; 4],
}

impl ObjectUniform {
    pub fn from_object(object: &SceneObject) -> Self {
        let model = object.transform.matrix();
        let [row0, row1] = object.material.uv.rows();
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
            uv_row0: [row0[0], row0[1], row0[2], 0.0],
            uv_row1: [row1[0], row1[1], row1[2], 0.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OverlayUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// Hex colours are sRGB; the surface expects linear values
pub fn srgb_to_linear(color: Color) -> Color {
    color.map(|c| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    })
}

fn uniform_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn vertex_layout() -> VertexBufferLayout<'static> {
    const ATTRIBUTES: [VertexAttribute; 3] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
        step_mode: VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

// Shared graphics setup used by native and web
pub struct CameraResources {
    pub camera_buffer: Buffer,
    pub lighting_buffer: Buffer,
    pub bind_group_layout: BindGroupLayout,
    pub camera_bind_group: BindGroup,
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub fn create_camera_resources(device: &Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let lighting_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("lighting_buffer"),
        size: std::mem::size_of::<LightingUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            uniform_entry(0, ShaderStages::VERTEX),
            uniform_entry(1, ShaderStages::FRAGMENT),
        ],
    });

    let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, lighting_buffer, bind_group_layout, camera_bind_group }
}

pub fn create_object_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("object_bind_group_layout"),
        entries: &[
            uniform_entry(0, ShaderStages::VERTEX),
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 2,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub fn create_mesh_pipeline(
    device: &Device,
    format: TextureFormat,
    camera_layout: &BindGroupLayout,
    object_layout: &BindGroupLayout,
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("mesh_shader"),
        source: ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("mesh_pipeline_layout"),
        bind_group_layouts: &[camera_layout, object_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("mesh_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: Some(Face::Back),
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

pub struct OverlayResources {
    pub pipeline: RenderPipeline,
    pub mesh: MeshBuffer,
    pub buffer: Buffer,
    pub bind_group: BindGroup,
}

/// Wire box pipeline. Depth compare is `Always` so the box stays visible
/// through its parent and anything in front of it.
pub fn create_overlay_resources(device: &Device, format: TextureFormat, camera_layout: &BindGroupLayout) -> OverlayResources {
    let mesh = geometry::wire_box().upload(device);

    let buffer = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("overlay_uniform"),
        contents: bytemuck::bytes_of(&OverlayUniform {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            color: [1.0; 4],
        }),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });

    let overlay_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("overlay_bind_group_layout"),
        entries: &[uniform_entry(0, ShaderStages::VERTEX_FRAGMENT)],
    });

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("overlay_bind_group"),
        layout: &overlay_layout,
        entries: &[BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
    });

    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("overlay_shader"),
        source: ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("overlay_pipeline_layout"),
        bind_group_layouts: &[camera_layout, &overlay_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("overlay_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::LineList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: CompareFunction::Always,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    });

    OverlayResources { pipeline, mesh, buffer, bind_group }
}

/// GPU side of one scene object
struct ObjectResources {
    id: ObjectId,
    mesh: MeshBuffer,
    uniform: Buffer,
    bind_group: BindGroup,
    _texture: GpuTexture,
}

fn create_object_resources(
    device: &Device,
    queue: &Queue,
    layout: &BindGroupLayout,
    sampler: &Sampler,
    object: &SceneObject,
) -> ObjectResources {
    let texture = textures::upload(device, queue, object.material.texture);
    let uniform = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some(&format!("{}_uniform", object.name())),
        contents: bytemuck::bytes_of(&ObjectUniform::from_object(object)),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some(&format!("{}_bind_group", object.name())),
        layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() },
            BindGroupEntry { binding: 1, resource: BindingResource::TextureView(&texture.view) },
            BindGroupEntry { binding: 2, resource: BindingResource::Sampler(sampler) },
        ],
    });

    ObjectResources {
        id: object.id,
        mesh: object.mesh.upload(device),
        uniform,
        bind_group,
        _texture: texture,
    }
}

/// egui output tessellated for one frame
pub struct UiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// Owns every GPU resource except the device and surface
pub struct Renderer {
    camera: CameraResources,
    _depth_texture: Texture,
    depth_view: TextureView,
    mesh_pipeline: RenderPipeline,
    objects: Vec<ObjectResources>,
    overlay: OverlayResources,
    show_overlay: bool,
    egui_renderer: egui_wgpu::Renderer,
    surface_generation: u64,
}

impl Renderer {
    pub fn new(gpu: &GpuContext, state: &ViewerState) -> Self {
        let device = gpu.device.as_ref();
        let queue = gpu.queue.as_ref();

        let camera = create_camera_resources(device);
        let (depth_texture, depth_view) = create_depth_texture(device, gpu.config.width, gpu.config.height);

        let object_layout = create_object_layout(device);
        let mesh_pipeline = create_mesh_pipeline(device, gpu.format, &camera.bind_group_layout, &object_layout);
        let overlay = create_overlay_resources(device, gpu.format, &camera.bind_group_layout);

        let sampler = textures::create_repeat_sampler(device);
        let objects = state
            .scene
            .objects()
            .iter()
            .map(|object| create_object_resources(device, queue, &object_layout, &sampler, object))
            .collect();

        let egui_renderer = egui_wgpu::Renderer::new(device, gpu.format, egui_wgpu::RendererOptions::default());
        info!(objects = state.scene.len(), format = ?gpu.format, "renderer ready");

        Self {
            camera,
            _depth_texture: depth_texture,
            depth_view,
            mesh_pipeline,
            objects,
            overlay,
            show_overlay: false,
            egui_renderer,
            surface_generation: state.surface_generation(),
        }
    }

    /// Call after the surface configuration changed size
    pub fn resize(&mut self, gpu: &GpuContext) {
        let (depth_texture, depth_view) = create_depth_texture(&gpu.device, gpu.config.width, gpu.config.height);
        self._depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    /// Uploads this frame's uniforms. A reset since the last frame rebuilds
    /// the surface and depth buffer.
    pub fn prepare(&mut self, gpu: &GpuContext, state: &ViewerState) {
        if state.surface_generation() != self.surface_generation {
            self.surface_generation = state.surface_generation();
            gpu.reconfigure();
            self.resize(gpu);
            debug!(generation = self.surface_generation, "surface rebuilt");
        }

        let queue = gpu.queue.as_ref();
        let camera = CameraUniform { view_proj: state.camera.view_proj().to_cols_array_2d() };
        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&camera));
        let lighting = LightingUniform::from_rig(&state.lights.rig());
        queue.write_buffer(&self.camera.lighting_buffer, 0, bytemuck::bytes_of(&lighting));

        for resources in &self.objects {
            if let Some(object) = state.scene.get(resources.id) {
                queue.write_buffer(&resources.uniform, 0, bytemuck::bytes_of(&ObjectUniform::from_object(object)));
            }
        }

        let overlay = state
            .selection
            .overlay()
            .and_then(|overlay| Some((overlay.world_matrix(&state.scene)?, overlay.color())));
        self.show_overlay = overlay.is_some();
        if let Some((model, color)) = overlay {
            let [r, g, b] = srgb_to_linear(color);
            let uniform = OverlayUniform { model: model.to_cols_array_2d(), color: [r, g, b, 1.0] };
            queue.write_buffer(&self.overlay.buffer, 0, bytemuck::bytes_of(&uniform));
        }
    }

    pub fn render(&mut self, gpu: &GpuContext, ui: &UiFrame) -> Result<(), SurfaceError> {
        let device = gpu.device.as_ref();
        let queue = gpu.queue.as_ref();

        let frame = gpu.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor { label: Some("encoder") });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Clear(CLEAR_COLOR), store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations { load: LoadOp::Clear(1.0), store: StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.mesh_pipeline);
            rp.set_bind_group(0, &self.camera.camera_bind_group, &[]);
            for object in &self.objects {
                if object.mesh.index_count == 0 {
                    continue;
                }
                rp.set_bind_group(1, &object.bind_group, &[]);
                rp.set_vertex_buffer(0, object.mesh.vertex_buffer.slice(..));
                rp.set_index_buffer(object.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                rp.draw_indexed(0..object.mesh.index_count, 0, 0..1);
            }

            if self.show_overlay {
                rp.set_pipeline(&self.overlay.pipeline);
                rp.set_bind_group(1, &self.overlay.bind_group, &[]);
                rp.set_vertex_buffer(0, self.overlay.mesh.vertex_buffer.slice(..));
                rp.set_index_buffer(self.overlay.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                rp.draw_indexed(0..self.overlay.mesh.index_count, 0, 0..1);
            }
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: ui.pixels_per_point,
        };

        // Upload egui textures
        for (id, image_delta) in &ui.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let egui_commands =
            self.egui_renderer
                .update_buffers(device, queue, &mut encoder, &ui.primitives, &screen_descriptor);

        // Render egui overlay
        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Load, store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &ui.primitives, &screen_descriptor);
        }

        // Free egui textures
        for id in &ui.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        queue.submit(egui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LightSettings, Scene, Shape};

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 16 * 11);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 160);
        assert_eq!(std::mem::size_of::<OverlayUniform>(), 80);
    }

    #[test]
    fn lighting_uniform_packs_intensities() {
        let rig = LightSettings::default().rig();
        let uniform = LightingUniform::from_rig(&rig);
        assert_eq!(uniform.ambient[0], rig.ambient);
        for (packed, light) in uniform.dir_direction.iter().zip(rig.directional.iter()) {
            assert_eq!(packed[3], light.intensity);
        }
        assert_eq!(uniform.point_position[3], rig.point.intensity);
        assert!(uniform.spot_cone[0] < uniform.spot_cone[1]);
    }

    #[test]
    fn object_uniform_carries_uv_transform() {
        let scene = Scene::demo();
        let cylinder = scene.get(scene.find(Shape::Cylinder).unwrap()).unwrap();
        let uniform = ObjectUniform::from_object(cylinder);
        // repeat (1, 2), offset (0.25, 0)
        assert_eq!(uniform.uv_row0, [1.0, 0.0, 0.25, 0.0]);
        assert_eq!(uniform.uv_row1, [0.0, 2.0, 0.0, 0.0]);
        assert_eq!(uniform.model[3], [4.0, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn srgb_conversion_endpoints() {
        assert_eq!(srgb_to_linear([0.0, 1.0, 0.5])[0], 0.0);
        assert!((srgb_to_linear([0.0, 1.0, 0.5])[1] - 1.0).abs() < 1e-6);
        assert!((srgb_to_linear([0.0, 1.0, 0.5])[2] - 0.214).abs() < 1e-3);
    }
}
