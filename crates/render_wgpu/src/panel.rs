//! Control panel: a left-anchored list of catalog entries with toggle
//! switches, drawn as screen-space quads plus an `ab_glyph` text atlas.
//!
//! `PanelLayout` is pure math (rect, scrolling, hit tests, the UV region the
//! liquid-glass pass keys off) so it can be unit-tested without a device.
//! `PanelUi` owns the GPU side and rebuilds its vertex buffers when rows or
//! scroll change.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, Glyph, PxScale, ScaleFont};

use crate::pipeline;
use crate::types::{PanelVertex, TextVertex};

pub const PANEL_MARGIN: f32 = 16.0;
pub const PANEL_WIDTH: f32 = 260.0;
pub const ROW_HEIGHT: f32 = 28.0;
pub const PANEL_PADDING: f32 = 10.0;
/// Corner radius in physical pixels, handed to the post pass as `radius/width`.
pub const CORNER_RADIUS_PX: f32 = 20.0;

const TEXT_PX: f32 = 16.0;
const SWITCH_W: f32 = 36.0;
const SWITCH_H: f32 = 16.0;
const KNOB: f32 = 12.0;

/// Panel placement and scrolling state in physical pixels.
#[derive(Debug, Clone)]
pub struct PanelLayout {
    rows: usize,
    scroll: f32,
    window: (f32, f32),
}

impl PanelLayout {
    pub fn new(rows: usize) -> Self {
        Self { rows, scroll: 0.0, window: (1.0, 1.0) }
    }

    pub fn set_window(&mut self, width: u32, height: u32) {
        self.window = (width.max(1) as f32, height.max(1) as f32);
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());
    }

    /// Panel rect as (x, y, w, h), y down from the top-left corner.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let content = self.content_height() + 2.0 * PANEL_PADDING;
        let max_h = (self.window.1 - 2.0 * PANEL_MARGIN).max(ROW_HEIGHT);
        (PANEL_MARGIN, PANEL_MARGIN, PANEL_WIDTH, content.min(max_h))
    }

    pub fn content_height(&self) -> f32 {
        self.rows as f32 * ROW_HEIGHT
    }

    pub fn max_scroll(&self) -> f32 {
        let (_, _, _, h) = self.rect();
        (self.content_height() - (h - 2.0 * PANEL_PADDING)).max(0.0)
    }

    /// Positive `dy` scrolls the list down (content moves up).
    pub fn scroll_by(&mut self, dy: f32) {
        self.scroll = (self.scroll + dy).clamp(0.0, self.max_scroll());
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        let (x, y, w, h) = self.rect();
        px >= x && px <= x + w && py >= y && py <= y + h
    }

    /// Map a click to a row index, accounting for scroll.
    pub fn row_at(&self, px: f32, py: f32) -> Option<usize> {
        if !self.contains(px, py) {
            return None;
        }
        let (_, y, _, _) = self.rect();
        let local = py - y - PANEL_PADDING + self.scroll;
        if local < 0.0 {
            return None;
        }
        let idx = (local / ROW_HEIGHT) as usize;
        (idx < self.rows).then_some(idx)
    }

    /// Screen-space y of a row's top edge; rows outside the padded viewport
    /// return None so callers skip them.
    pub fn row_top(&self, idx: usize) -> Option<f32> {
        let (_, y, _, h) = self.rect();
        let top = y + PANEL_PADDING + idx as f32 * ROW_HEIGHT - self.scroll;
        let lo = y + PANEL_PADDING - ROW_HEIGHT;
        let hi = y + h - PANEL_PADDING - ROW_HEIGHT;
        (top >= lo && top <= hi + ROW_HEIGHT * 0.5).then_some(top)
    }

    /// Panel rect in UV space (u0, v0, u1, v1), v = 0 at the top. This is what
    /// keys the liquid-glass distortion to the panel's live position.
    pub fn uv_region(&self) -> [f32; 4] {
        let (x, y, w, h) = self.rect();
        [
            x / self.window.0,
            y / self.window.1,
            (x + w) / self.window.0,
            (y + h) / self.window.1,
        ]
    }

    pub fn corner_radius_uv(&self) -> f32 {
        CORNER_RADIUS_PX / self.window.0
    }
}

fn ndc_from_px(px: f32, py: f32, w: f32, h: f32) -> [f32; 2] {
    let x = (px / w) * 2.0 - 1.0;
    let y = 1.0 - (py / h) * 2.0;
    [x, y]
}

fn push_quad(out: &mut Vec<PanelVertex>, x0: f32, y0: f32, x1: f32, y1: f32, color: [f32; 4], w: f32, h: f32) {
    let p0 = ndc_from_px(x0, y0, w, h);
    let p1 = ndc_from_px(x1, y0, w, h);
    let p2 = ndc_from_px(x1, y1, w, h);
    let p3 = ndc_from_px(x0, y1, w, h);
    out.push(PanelVertex { pos_ndc: p0, color });
    out.push(PanelVertex { pos_ndc: p1, color });
    out.push(PanelVertex { pos_ndc: p2, color });
    out.push(PanelVertex { pos_ndc: p0, color });
    out.push(PanelVertex { pos_ndc: p2, color });
    out.push(PanelVertex { pos_ndc: p3, color });
}

/// Look for a usable TTF: explicit config path first, then a few common
/// system locations. Returns the file contents so `ab_glyph` owns them.
pub fn find_font(explicit: Option<&Path>) -> Option<Vec<u8>> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(p) = explicit {
        candidates.push(p.to_path_buf());
    }
    for p in [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\segoeui.ttf",
    ] {
        candidates.push(PathBuf::from(p));
    }
    for c in &candidates {
        if let Ok(bytes) = std::fs::read(c) {
            log::info!("panel font: {}", c.display());
            return Some(bytes);
        }
    }
    log::warn!("no usable font found; panel renders without labels (set SIZEVIEW_FONT)");
    None
}

struct GlyphInfo {
    uv_min: [f32; 2],
    uv_max: [f32; 2],
    bounds_min: [f32; 2],
    size: [f32; 2],
    advance: f32,
    id: ab_glyph::GlyphId,
}

/// CPU-baked ASCII atlas uploaded once to an R8 texture.
struct TextAtlas {
    font: FontArc,
    scale: PxScale,
    ascent: f32,
    glyphs: HashMap<char, GlyphInfo>,
    tex: wgpu::Texture,
    bg: wgpu::BindGroup,
    cpu: Vec<u8>,
    size: (u32, u32),
    uploaded: bool,
}

impl TextAtlas {
    fn new(device: &wgpu::Device, text_bgl: &wgpu::BindGroupLayout, font_bytes: Vec<u8>) -> anyhow::Result<Self> {
        let font = FontArc::try_from_vec(font_bytes)?;
        let scale = PxScale { x: TEXT_PX, y: TEXT_PX };
        let scaled = font.as_scaled(scale);
        let ascent = scaled.ascent();

        let atlas_w: u32 = 512;
        let mut atlas_h: u32 = 128;
        let mut atlas = vec![0u8; (atlas_w * atlas_h) as usize];
        let mut cursor_x: u32 = 1;
        let mut cursor_y: u32 = 1;
        let mut row_h: u32 = 0;

        let mut glyphs = HashMap::new();
        for ch_u in 32u8..=126u8 {
            let ch = ch_u as char;
            let gid = font.glyph_id(ch);
            let g0 = Glyph { id: gid, scale, position: ab_glyph::point(0.0, ascent) };
            let Some(og) = font.outline_glyph(g0) else {
                continue;
            };
            let bounds = og.px_bounds();
            let gw = (bounds.width().ceil() as u32).max(1);
            let gh = (bounds.height().ceil() as u32).max(1);
            if cursor_x + gw + 1 >= atlas_w {
                cursor_x = 1;
                cursor_y += row_h + 1;
                row_h = 0;
            }
            if cursor_y + gh + 1 >= atlas_h {
                let new_h = (atlas_h * 2).max(cursor_y + gh + 2);
                let mut grown = vec![0u8; (atlas_w * new_h) as usize];
                grown[..atlas.len()].copy_from_slice(&atlas);
                atlas = grown;
                atlas_h = new_h;
            }
            let ox = cursor_x as i32 + bounds.min.x.floor() as i32;
            let oy = cursor_y as i32 + bounds.min.y.floor() as i32;
            og.draw(|x, y, v| {
                let px = (ox + x as i32) as u32;
                let py = (oy + y as i32) as u32;
                if px < atlas_w && py < atlas_h {
                    let idx = (py * atlas_w + px) as usize;
                    atlas[idx] = atlas[idx].max((v * 255.0) as u8);
                }
            });
            glyphs.insert(
                ch,
                GlyphInfo {
                    uv_min: [ox.max(0) as f32 / atlas_w as f32, oy.max(0) as f32 / atlas_h as f32],
                    uv_max: [
                        (ox.max(0) as u32 + gw) as f32 / atlas_w as f32,
                        (oy.max(0) as u32 + gh) as f32 / atlas_h as f32,
                    ],
                    bounds_min: [bounds.min.x, bounds.min.y],
                    size: [gw as f32, gh as f32],
                    advance: scaled.h_advance(gid),
                    id: gid,
                },
            );
            cursor_x += gw + 1;
            row_h = row_h.max(gh);
        }

        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("panel-text-atlas"),
            size: wgpu::Extent3d { width: atlas_w, height: atlas_h, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("panel-text-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("panel-text-bg"),
            layout: text_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&sampler) },
            ],
        });

        Ok(Self {
            font,
            scale,
            ascent,
            glyphs,
            tex,
            bg,
            cpu: atlas,
            size: (atlas_w, atlas_h),
            uploaded: false,
        })
    }

    fn upload(&mut self, queue: &wgpu::Queue) {
        if self.uploaded {
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.tex,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.cpu,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.size.0),
                rows_per_image: Some(self.size.1),
            },
            wgpu::Extent3d { width: self.size.0, height: self.size.1, depth_or_array_layers: 1 },
        );
        self.uploaded = true;
    }

    /// Emit glyph quads for `text` with its baseline at (`x`, `baseline_y`),
    /// clipped only by what the caller chooses to queue.
    fn push_text(
        &self,
        out: &mut Vec<TextVertex>,
        x: f32,
        baseline_y: f32,
        text: &str,
        color: [f32; 4],
        surface_w: f32,
        surface_h: f32,
    ) {
        let scaled = self.font.as_scaled(self.scale);
        let mut pen_x = 0.0f32;
        let mut prev: Option<ab_glyph::GlyphId> = None;
        for ch in text.chars() {
            let Some(gi) = self.glyphs.get(&ch) else {
                continue;
            };
            if let Some(pg) = prev {
                pen_x += scaled.kern(pg, gi.id);
            }
            let gx = x + pen_x + gi.bounds_min[0];
            let gy = baseline_y - self.ascent + gi.bounds_min[1];
            let p0 = ndc_from_px(gx, gy, surface_w, surface_h);
            let p1 = ndc_from_px(gx + gi.size[0], gy, surface_w, surface_h);
            let p2 = ndc_from_px(gx + gi.size[0], gy + gi.size[1], surface_w, surface_h);
            let p3 = ndc_from_px(gx, gy + gi.size[1], surface_w, surface_h);
            let uv0 = gi.uv_min;
            let uv1 = [gi.uv_max[0], gi.uv_min[1]];
            let uv2 = gi.uv_max;
            let uv3 = [gi.uv_min[0], gi.uv_max[1]];
            out.push(TextVertex { pos_ndc: p0, uv: uv0, color });
            out.push(TextVertex { pos_ndc: p1, uv: uv1, color });
            out.push(TextVertex { pos_ndc: p2, uv: uv2, color });
            out.push(TextVertex { pos_ndc: p0, uv: uv0, color });
            out.push(TextVertex { pos_ndc: p2, uv: uv2, color });
            out.push(TextVertex { pos_ndc: p3, uv: uv3, color });
            pen_x += gi.advance;
            prev = Some(gi.id);
        }
    }
}

/// One list row as seen by the panel: label plus current toggle state.
#[derive(Debug, Clone, Copy)]
pub struct RowDesc<'a> {
    pub label: &'a str,
    pub enabled: bool,
}

/// GPU side of the panel: quad + text pipelines and their vertex buffers.
pub struct PanelUi {
    quad_pipeline: wgpu::RenderPipeline,
    text_pipeline: wgpu::RenderPipeline,
    atlas: Option<TextAtlas>,
    quad_vbuf: wgpu::Buffer,
    quad_count: u32,
    quad_cap: u64,
    text_vbuf: wgpu::Buffer,
    text_count: u32,
    text_cap: u64,
}

impl PanelUi {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
        font_bytes: Option<Vec<u8>>,
    ) -> anyhow::Result<Self> {
        let quad_pipeline = pipeline::create_panel_pipeline(device, shader, color_format);
        let text_bgl = pipeline::create_text_bgl(device);
        let text_pipeline = pipeline::create_text_pipeline(device, shader, &text_bgl, color_format);
        let atlas = match font_bytes {
            Some(bytes) => Some(TextAtlas::new(device, &text_bgl, bytes)?),
            None => None,
        };

        let quad_cap = 64 * 1024;
        let quad_vbuf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("panel-quad-vbuf"),
            size: quad_cap,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let text_cap = 128 * 1024;
        let text_vbuf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("panel-text-vbuf"),
            size: text_cap,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            quad_pipeline,
            text_pipeline,
            atlas,
            quad_vbuf,
            quad_count: 0,
            quad_cap,
            text_vbuf,
            text_count: 0,
            text_cap,
        })
    }

    pub fn queue(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &PanelLayout,
        rows: &[RowDesc<'_>],
        surface_w: u32,
        surface_h: u32,
    ) {
        let w = surface_w.max(1) as f32;
        let h = surface_h.max(1) as f32;
        let (px, py, pw, ph) = layout.rect();

        let mut quads: Vec<PanelVertex> = Vec::new();
        let mut text: Vec<TextVertex> = Vec::new();

        // Translucent backdrop; the glass distortion behind it comes from the
        // post pass, this quad only darkens and frames the list.
        push_quad(&mut quads, px, py, px + pw, py + ph, [0.05, 0.05, 0.08, 0.55], w, h);

        for (i, row) in rows.iter().enumerate() {
            let Some(top) = layout.row_top(i) else {
                continue;
            };
            let mid = top + ROW_HEIGHT * 0.5;

            // Toggle switch: track plus knob, knob side showing the state.
            let tx1 = px + pw - PANEL_PADDING;
            let tx0 = tx1 - SWITCH_W;
            let ty0 = mid - SWITCH_H * 0.5;
            let ty1 = mid + SWITCH_H * 0.5;
            let track = if row.enabled {
                [0.30, 0.78, 0.36, 1.0]
            } else {
                [0.35, 0.35, 0.40, 1.0]
            };
            push_quad(&mut quads, tx0, ty0, tx1, ty1, track, w, h);
            let kx0 = if row.enabled { tx1 - KNOB - 2.0 } else { tx0 + 2.0 };
            push_quad(
                &mut quads,
                kx0,
                mid - KNOB * 0.5,
                kx0 + KNOB,
                mid + KNOB * 0.5,
                [0.95, 0.95, 0.95, 1.0],
                w,
                h,
            );

            if let Some(atlas) = &self.atlas {
                let baseline = mid + TEXT_PX * 0.35;
                atlas.push_text(
                    &mut text,
                    px + PANEL_PADDING,
                    baseline,
                    row.label,
                    [1.0, 1.0, 1.0, 1.0],
                    w,
                    h,
                );
            }
        }

        self.quad_count = quads.len() as u32;
        if self.quad_count > 0 {
            let bytes: &[u8] = bytemuck::cast_slice(&quads);
            if bytes.len() as u64 > self.quad_cap {
                self.quad_cap = (bytes.len() as u64).next_power_of_two();
                self.quad_vbuf = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("panel-quad-vbuf"),
                    size: self.quad_cap,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
            }
            queue.write_buffer(&self.quad_vbuf, 0, bytes);
        }

        self.text_count = text.len() as u32;
        if self.text_count > 0 {
            let bytes: &[u8] = bytemuck::cast_slice(&text);
            if bytes.len() as u64 > self.text_cap {
                self.text_cap = (bytes.len() as u64).next_power_of_two();
                self.text_vbuf = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("panel-text-vbuf"),
                    size: self.text_cap,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
            }
            queue.write_buffer(&self.text_vbuf, 0, bytes);
        }
        if let Some(atlas) = &mut self.atlas {
            atlas.upload(queue);
        }
    }

    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        if self.quad_count == 0 && self.text_count == 0 {
            return;
        }
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("panel-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        if self.quad_count > 0 {
            rpass.set_pipeline(&self.quad_pipeline);
            rpass.set_vertex_buffer(0, self.quad_vbuf.slice(..));
            rpass.draw(0..self.quad_count, 0..1);
        }
        if self.text_count > 0 {
            if let Some(atlas) = &self.atlas {
                rpass.set_pipeline(&self.text_pipeline);
                rpass.set_bind_group(0, &atlas.bg, &[]);
                rpass.set_vertex_buffer(0, self.text_vbuf.slice(..));
                rpass.draw(0..self.text_count, 0..1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(rows: usize, w: u32, h: u32) -> PanelLayout {
        let mut l = PanelLayout::new(rows);
        l.set_window(w, h);
        l
    }

    #[test]
    fn short_list_sizes_to_content() {
        let l = layout(3, 1280, 720);
        let (x, y, w, h) = l.rect();
        assert_eq!((x, y, w), (PANEL_MARGIN, PANEL_MARGIN, PANEL_WIDTH));
        assert!((h - (3.0 * ROW_HEIGHT + 2.0 * PANEL_PADDING)).abs() < 1e-5);
        assert_eq!(l.max_scroll(), 0.0);
    }

    #[test]
    fn long_list_clamps_to_window_and_scrolls() {
        let l = layout(35, 1280, 400);
        let (_, _, _, h) = l.rect();
        assert!((h - (400.0 - 2.0 * PANEL_MARGIN)).abs() < 1e-5);
        let hidden = 35.0 * ROW_HEIGHT - (h - 2.0 * PANEL_PADDING);
        assert!((l.max_scroll() - hidden).abs() < 1e-4);
    }

    #[test]
    fn scroll_clamps_both_ends() {
        let mut l = layout(35, 1280, 400);
        l.scroll_by(-100.0);
        assert_eq!(l.scroll(), 0.0);
        l.scroll_by(1.0e6);
        assert!((l.scroll() - l.max_scroll()).abs() < 1e-4);
    }

    #[test]
    fn hit_test_maps_rows_through_scroll() {
        let mut l = layout(35, 1280, 400);
        let (x, y, ..) = l.rect();
        let first = l.row_at(x + 5.0, y + PANEL_PADDING + 1.0);
        assert_eq!(first, Some(0));
        l.scroll_by(ROW_HEIGHT * 2.0);
        let shifted = l.row_at(x + 5.0, y + PANEL_PADDING + 1.0);
        assert_eq!(shifted, Some(2));
        assert_eq!(l.row_at(0.0, 0.0), None);
    }

    #[test]
    fn uv_region_tracks_rect() {
        let l = layout(3, 1280, 720);
        let (x, y, w, h) = l.rect();
        let uv = l.uv_region();
        assert!((uv[0] - x / 1280.0).abs() < 1e-6);
        assert!((uv[1] - y / 720.0).abs() < 1e-6);
        assert!((uv[2] - (x + w) / 1280.0).abs() < 1e-6);
        assert!((uv[3] - (y + h) / 720.0).abs() < 1e-6);
        assert!((l.corner_radius_uv() - 20.0 / 1280.0).abs() < 1e-7);
    }

    #[test]
    fn rows_scrolled_out_are_skipped() {
        let mut l = layout(35, 1280, 400);
        l.scroll_by(ROW_HEIGHT * 5.0);
        assert!(l.row_top(0).is_none());
        assert!(l.row_top(5).is_some());
    }
}
