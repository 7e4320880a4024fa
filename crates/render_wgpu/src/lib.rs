//! GPU renderer for the scale-comparison scene.
//!
//! Frame structure: the model pass renders every visible catalog entry into
//! an offscreen color target (plus depth), the liquid-glass pass composites
//! that onto the swapchain distorting the region under the control panel, and
//! the panel overlay draws on top. Model loading is lazy: a catalog entry gets
//! GPU buffers the first time its toggle goes on.

pub mod panel;
pub mod pipeline;
pub mod types;
pub mod util;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use wgpu::rwh::{HasDisplayHandle, HasWindowHandle};
use wgpu::util::DeviceExt;
use wgpu::SurfaceTargetUnsafe;
use winit::window::Window;

use data_runtime::catalog::ModelEntry;
use data_runtime::viewer_cfg::ViewerCfg;
use scene_layout::{focus_target, layout_row, smooth_factor, LayoutInput, OrbitCamera, Placement};

use crate::panel::{PanelLayout, PanelUi, RowDesc};
use crate::types::{Globals, ModelU, PostUniform, Vertex};

/// Rate of the per-frame position/focus easing at 60 Hz.
const EASE_PER_FRAME: f32 = 0.1;

struct GpuMesh {
    vb: wgpu::Buffer,
    ib: wgpu::Buffer,
    index_count: u32,
    model_buf: wgpu::Buffer,
    model_bg: wgpu::BindGroup,
    /// None means the shared 1x1 white material.
    material_bg: Option<wgpu::BindGroup>,
    aabb_min: Vec3,
    aabb_max: Vec3,
}

struct ModelSlot {
    entry: ModelEntry,
    visible: bool,
    mesh: Option<GpuMesh>,
    /// Smoothed world position; eases toward `placement.target`.
    position: Vec3,
    placement: Option<Placement>,
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    max_dim: u32,

    scene_color: wgpu::TextureView,
    depth: wgpu::TextureView,

    globals_buf: wgpu::Buffer,
    globals_bg: wgpu::BindGroup,
    model_bgl: wgpu::BindGroupLayout,
    material_bgl: wgpu::BindGroupLayout,
    white_material_bg: wgpu::BindGroup,
    model_pipeline: wgpu::RenderPipeline,

    post_pipeline: wgpu::RenderPipeline,
    post_bgl: wgpu::BindGroupLayout,
    post_buf: wgpu::Buffer,
    post_sampler: wgpu::Sampler,
    post_bg: wgpu::BindGroup,

    panel: PanelLayout,
    panel_ui: PanelUi,

    pub camera: OrbitCamera,
    gap: f32,
    data_root: PathBuf,
    slots: Vec<ModelSlot>,
    scene_width: f32,

    start: Instant,
    last_frame: Instant,
}

impl Renderer {
    pub fn new(
        window: &Window,
        catalog: Vec<ModelEntry>,
        cfg: &ViewerCfg,
        data_root: PathBuf,
        vsync: bool,
    ) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let raw_display = window.display_handle()?.as_raw();
        let raw_window = window.window_handle()?.as_raw();
        let surface = unsafe {
            instance.create_surface_unsafe(SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: raw_display,
                raw_window_handle: raw_window,
            })
        }?;

        let (adapter, device, queue) = pollster::block_on(async {
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .context("no suitable GPU adapter")?;
            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("sizeview-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    trace: wgpu::Trace::default(),
                })
                .await
                .context("request device")?;
            anyhow::Ok((adapter, device, queue))
        })?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let present_mode = if vsync {
            wgpu::PresentMode::Fifo
        } else {
            caps.present_modes
                .iter()
                .copied()
                .find(|m| *m == wgpu::PresentMode::Mailbox)
                .unwrap_or(wgpu::PresentMode::AutoNoVsync)
        };
        let max_dim = device.limits().max_texture_dimension_2d.max(1);
        let (width, height) = util::scale_to_max((size.width, size.height), max_dim);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("surface: {width}x{height} {format:?} {present_mode:?}");

        let scene_color = util::create_scene_color(&device, width, height, format);
        let depth = util::create_depth_view(&device, width, height);

        let shader = pipeline::create_shader(&device);
        let (globals_bgl, model_bgl) = pipeline::create_bind_group_layouts(&device);
        let material_bgl = pipeline::create_material_bgl(&device);
        let model_pipeline = pipeline::create_model_pipeline(
            &device,
            &shader,
            &globals_bgl,
            &model_bgl,
            &material_bgl,
            format,
        );

        let globals = Globals {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            time_pad: [0.0; 4],
        };
        let globals_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals-bg"),
            layout: &globals_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        let white_material_bg = create_material_bg(
            &device,
            &queue,
            &material_bgl,
            1,
            1,
            &[255, 255, 255, 255],
            "white",
        );

        let post_shader = pipeline::create_post_shader(&device);
        let post_bgl = pipeline::create_post_bgl(&device);
        let post_pipeline = pipeline::create_post_pipeline(&device, &post_shader, &post_bgl, format);
        let post_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("post-uniform"),
            contents: bytemuck::bytes_of(&PostUniform { region: [0.0; 4], params: [0.0; 4] }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let post_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let post_bg = create_post_bg(&device, &post_bgl, &scene_color, &post_sampler, &post_buf);

        let font_bytes = panel::find_font(cfg.font_path());
        let panel_ui = PanelUi::new(&device, &shader, format, font_bytes)?;
        let mut panel_layout = PanelLayout::new(catalog.len());
        panel_layout.set_window(width, height);

        let mut camera = OrbitCamera::default();
        camera.damping = cfg.damping();
        camera.auto_rotate_speed = cfg.auto_rotate_speed();

        let slots = catalog
            .into_iter()
            .map(|entry| ModelSlot {
                entry,
                visible: false,
                mesh: None,
                position: Vec3::ZERO,
                placement: None,
            })
            .collect();

        let now = Instant::now();
        let mut renderer = Self {
            surface,
            device,
            queue,
            config,
            max_dim,
            scene_color,
            depth,
            globals_buf,
            globals_bg,
            model_bgl,
            material_bgl,
            white_material_bg,
            model_pipeline,
            post_pipeline,
            post_bgl,
            post_buf,
            post_sampler,
            post_bg,
            panel: panel_layout,
            panel_ui,
            camera,
            gap: cfg.gap(),
            data_root,
            slots,
            scene_width: 0.0,
            start: now,
            last_frame: now,
        };
        renderer.write_post_uniform();

        for name in cfg.default_enabled().to_vec() {
            if let Some(idx) = renderer.slots.iter().position(|s| s.entry.name == name) {
                renderer.toggle(idx);
            } else {
                log::warn!("default-enabled model {name:?} is not in the catalog");
            }
        }
        Ok(renderer)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let (w, h) = util::scale_to_max((width, height), self.max_dim);
        self.config.width = w;
        self.config.height = h;
        self.surface.configure(&self.device, &self.config);
        self.scene_color = util::create_scene_color(&self.device, w, h, self.config.format);
        self.depth = util::create_depth_view(&self.device, w, h);
        self.post_bg = create_post_bg(
            &self.device,
            &self.post_bgl,
            &self.scene_color,
            &self.post_sampler,
            &self.post_buf,
        );
        self.panel.set_window(w, h);
        self.write_post_uniform();
    }

    /// Reconfigure with the current size; used after a lost/outdated surface.
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    // ---- input routing ----

    pub fn panel_contains(&self, px: f32, py: f32) -> bool {
        self.panel.contains(px, py)
    }

    pub fn panel_scroll(&mut self, dy_px: f32) {
        self.panel.scroll_by(dy_px);
    }

    /// Click over the panel toggles the row it hits. Returns whether the
    /// click was consumed by the panel.
    pub fn click(&mut self, px: f32, py: f32) -> bool {
        if let Some(row) = self.panel.row_at(px, py) {
            self.toggle(row);
            return true;
        }
        self.panel.contains(px, py)
    }

    pub fn orbit_rotate(&mut self, dx_px: f32, dy_px: f32) {
        self.camera.rotate(dx_px, dy_px, self.config.height as f32);
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.camera.dragging = dragging;
    }

    pub fn dolly(&mut self, steps: f32) {
        self.camera.dolly(steps);
    }

    // ---- catalog toggles ----

    /// Flip an entry's visibility, lazily loading its mesh on first enable.
    /// A failed load keeps the toggle off; nothing beyond the log recovers it.
    pub fn toggle(&mut self, idx: usize) {
        if !self.slots[idx].visible && self.slots[idx].mesh.is_none() {
            if let Err(err) = self.load_slot(idx) {
                log::error!("failed to load {}: {err:#}", self.slots[idx].entry.name);
                return;
            }
        }
        let slot = &mut self.slots[idx];
        slot.visible = !slot.visible;
        log::info!(
            "{} {}",
            if slot.visible { "enabled" } else { "disabled" },
            slot.entry.name
        );
        self.recompute_layout();
    }

    fn load_slot(&mut self, idx: usize) -> Result<()> {
        let path = self
            .data_root
            .join("models")
            .join(&self.slots[idx].entry.path);
        let scene = assets_gltf::load_gltf_scene(&path)?;
        let (aabb_min, aabb_max) = scene.aabb();

        let vertices: Vec<Vertex> = scene
            .vertices
            .iter()
            .map(|v| Vertex { pos: v.pos, nrm: v.nrm, uv: v.uv })
            .collect();
        let vb = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model-vb"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ib = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model-ib"),
            contents: bytemuck::cast_slice(&scene.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let model_u = ModelU {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            tint: [1.0, 1.0, 1.0, 1.0],
        };
        let model_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model-uniform"),
            contents: bytemuck::bytes_of(&model_u),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let model_bg = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model-bg"),
            layout: &self.model_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buf.as_entire_binding(),
            }],
        });

        let material_bg = scene.base_color.as_ref().map(|tex| {
            create_material_bg(
                &self.device,
                &self.queue,
                &self.material_bgl,
                tex.width,
                tex.height,
                &tex.pixels,
                "albedo",
            )
        });

        log::info!(
            "loaded {}: {} verts, {} indices, textured: {}",
            self.slots[idx].entry.name,
            vertices.len(),
            scene.indices.len(),
            material_bg.is_some()
        );
        self.slots[idx].mesh = Some(GpuMesh {
            vb,
            ib,
            index_count: scene.indices.len() as u32,
            model_buf,
            model_bg,
            material_bg,
            aabb_min,
            aabb_max,
        });
        Ok(())
    }

    /// Recompute row placements for all visible, loaded models in catalog
    /// order; everything shares the smallest declared scene unit.
    fn recompute_layout(&mut self) {
        let active: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.visible && s.mesh.is_some())
            .map(|(i, _)| i)
            .collect();
        let inputs: Vec<LayoutInput> = active
            .iter()
            .map(|&i| {
                let slot = &self.slots[i];
                let mesh = slot
                    .mesh
                    .as_ref()
                    .unwrap_or_else(|| unreachable!("active slots are loaded"));
                LayoutInput {
                    aabb_min: mesh.aabb_min,
                    aabb_max: mesh.aabb_max,
                    height: slot.entry.height(),
                    width_override: slot.entry.width_override(),
                    unit: slot.entry.scene_unit(),
                }
            })
            .collect();
        let row = layout_row(&inputs, self.gap);
        self.scene_width = row.scene_width;
        for (slot_idx, placement) in active.into_iter().zip(row.placements) {
            self.slots[slot_idx].placement = Some(placement);
        }
    }

    fn write_post_uniform(&self) {
        let post = PostUniform {
            region: self.panel.uv_region(),
            params: [self.panel.corner_radius_uv(), 0.0, 0.0, 0.0],
        };
        self.queue.write_buffer(&self.post_buf, 0, bytemuck::bytes_of(&post));
    }

    // ---- per-frame ----

    pub fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        self.camera.update(dt);
        let k = smooth_factor(EASE_PER_FRAME, dt);
        let focus = focus_target(self.scene_width, self.camera.target);
        self.camera.target += (focus - self.camera.target) * k;

        let aspect = self.config.width as f32 / self.config.height.max(1) as f32;
        let globals = Globals {
            view_proj: self.camera.view_proj(aspect).to_cols_array_2d(),
            time_pad: [(now - self.start).as_secs_f32(), 0.0, 0.0, 0.0],
        };
        self.queue
            .write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));

        for slot in &mut self.slots {
            if !slot.visible {
                continue;
            }
            let (Some(mesh), Some(placement)) = (&slot.mesh, slot.placement) else {
                continue;
            };
            slot.position += (placement.target - slot.position) * k;
            let model_u = ModelU {
                model: (Mat4::from_translation(slot.position)
                    * Mat4::from_scale(Vec3::splat(placement.scale)))
                .to_cols_array_2d(),
                tint: [1.0, 1.0, 1.0, 1.0],
            };
            self.queue
                .write_buffer(&mesh.model_buf, 0, bytemuck::bytes_of(&model_u));
        }

        let rows: Vec<RowDesc<'_>> = self
            .slots
            .iter()
            .map(|s| RowDesc { label: s.entry.name.as_str(), enabled: s.visible })
            .collect();
        let panel_snapshot = self.panel.clone();
        self.panel_ui.queue(
            &self.device,
            &self.queue,
            &panel_snapshot,
            &rows,
            self.config.width,
            self.config.height,
        );

        let frame = self.surface.get_current_texture()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("frame") });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.scene_color,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.03,
                            g: 0.03,
                            b: 0.05,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            rpass.set_pipeline(&self.model_pipeline);
            rpass.set_bind_group(0, &self.globals_bg, &[]);
            for slot in &self.slots {
                if !slot.visible {
                    continue;
                }
                let Some(mesh) = &slot.mesh else { continue };
                rpass.set_bind_group(1, &mesh.model_bg, &[]);
                let material = mesh.material_bg.as_ref().unwrap_or(&self.white_material_bg);
                rpass.set_bind_group(2, material, &[]);
                rpass.set_vertex_buffer(0, mesh.vb.slice(..));
                rpass.set_index_buffer(mesh.ib.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glass-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            rpass.set_pipeline(&self.post_pipeline);
            rpass.set_bind_group(0, &self.post_bg, &[]);
            rpass.draw(0..3, 0..1);
        }

        self.panel_ui.draw(&mut encoder, &surface_view);

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn create_material_bg(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_bgl: &wgpu::BindGroupLayout,
    width: u32,
    height: u32,
    rgba: &[u8],
    label: &str,
) -> wgpu::BindGroup {
    let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &tex,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: material_bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    })
}

fn create_post_bg(
    device: &wgpu::Device,
    post_bgl: &wgpu::BindGroupLayout,
    scene_color: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    post_buf: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("post-bg"),
        layout: post_bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(scene_color),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry { binding: 2, resource: post_buf.as_entire_binding() },
        ],
    })
}
