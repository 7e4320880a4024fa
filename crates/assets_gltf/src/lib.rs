//! Asset system (CPU-side) for loading model scenes.
//!
//! Parses a `.gltf`/`.glb` file and produces CPU-side mesh data (positions,
//! normals, uvs, indices) that the renderer can upload to GPU buffers.
//!
//! Design notes
//! - The whole scene graph is flattened into a single mesh: node transforms
//!   are baked into the vertices while appending primitives and re-indexing.
//!   Scale normalization needs world-space bounds, so baking here keeps the
//!   downstream math trivial.
//! - Indices are widened to `u32`; catalog meshes (terrain, moon) can exceed
//!   the u16 range.
//! - If normals are missing in the source, we fall back to a constant up
//!   normal; missing uvs become [0, 0].
//! - The first base-color texture encountered is kept (RGBA8). One material
//!   per model is enough for a comparison lineup.

use anyhow::{bail, Context, Result};
use glam::{Mat3, Mat4, Vec3};

#[derive(Debug)]
pub struct SceneVertex {
    pub pos: [f32; 3],
    pub nrm: [f32; 3],
    pub uv: [f32; 2],
}

/// Decoded RGBA8 image ready for `write_texture`.
#[derive(Debug)]
pub struct TextureCpu {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// CPU-side scene ready to be uploaded to the GPU.
#[derive(Debug)]
pub struct CpuScene {
    pub vertices: Vec<SceneVertex>,
    pub indices: Vec<u32>,
    pub base_color: Option<TextureCpu>,
}

impl CpuScene {
    /// Min/max over the baked (world-space) vertex positions.
    pub fn aabb(&self) -> (Vec3, Vec3) {
        let mut min_b = Vec3::splat(f32::INFINITY);
        let mut max_b = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            let p = Vec3::from(v.pos);
            min_b = min_b.min(p);
            max_b = max_b.max(p);
        }
        (min_b, max_b)
    }
}

/// Load a `.gltf`/`.glb` from disk, traverse its default scene and merge all
/// triangle primitives into a single mesh with node transforms applied.
pub fn load_gltf_scene(path: &std::path::Path) -> Result<CpuScene> {
    // The high-level importer resolves external buffers/images.
    let (doc, buffers, images) = gltf::import(path)
        .with_context(|| format!("failed to import glTF: {}", path.display()))?;

    let scene = doc
        .default_scene()
        .or_else(|| doc.scenes().next())
        .with_context(|| format!("no scene in glTF: {}", path.display()))?;

    let mut out = CpuScene { vertices: Vec::new(), indices: Vec::new(), base_color: None };
    for node in scene.nodes() {
        append_node(&node, Mat4::IDENTITY, &buffers, &images, &mut out)?;
    }

    if out.vertices.is_empty() || out.indices.is_empty() {
        bail!("no geometry found in {}", path.display());
    }
    Ok(out)
}

fn append_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
    out: &mut CpuScene,
) -> Result<()> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        for prim in mesh.primitives() {
            if prim.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("skipping non-triangle primitive in mesh {:?}", mesh.name());
                continue;
            }
            append_primitive(&prim, world, buffers, images, out)?;
        }
    }
    for child in node.children() {
        append_node(&child, world, buffers, images, out)?;
    }
    Ok(())
}

fn append_primitive(
    prim: &gltf::Primitive,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
    out: &mut CpuScene,
) -> Result<()> {
    let reader = prim.reader(|buf| buffers.get(buf.index()).map(|b| b.0.as_slice()));

    // Positions are required for our purposes; skip primitive if missing.
    let Some(pos_iter) = reader.read_positions() else {
        return Ok(());
    };
    let pos: Vec<[f32; 3]> = pos_iter.collect();
    let nrm: Vec<[f32; 3]> = match reader.read_normals() {
        Some(it) => it.collect(),
        None => vec![[0.0, 1.0, 0.0]; pos.len()],
    };
    let uv: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(it) => it.into_f32().collect(),
        None => vec![[0.0, 0.0]; pos.len()],
    };

    // Normals transform with the inverse-transpose of the upper 3x3.
    let nrm_mat = Mat3::from_mat4(world).inverse().transpose();

    let start = out.vertices.len() as u32;
    for i in 0..pos.len() {
        let p = world.transform_point3(Vec3::from(pos[i]));
        let n = nrm_mat * Vec3::from(*nrm.get(i).unwrap_or(&[0.0, 1.0, 0.0]));
        let n = n.try_normalize().unwrap_or(Vec3::Y);
        out.vertices.push(SceneVertex {
            pos: p.to_array(),
            nrm: n.to_array(),
            uv: *uv.get(i).unwrap_or(&[0.0, 0.0]),
        });
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(gltf::mesh::util::ReadIndices::U16(it)) => it.map(|i| i as u32).collect(),
        Some(gltf::mesh::util::ReadIndices::U32(it)) => it.collect(),
        Some(gltf::mesh::util::ReadIndices::U8(it)) => it.map(|i| i as u32).collect(),
        None => (0..pos.len() as u32).collect(),
    };
    out.indices.extend(indices.into_iter().map(|i| i + start));

    if out.base_color.is_none() {
        out.base_color = read_base_color(prim, images);
    }
    Ok(())
}

fn read_base_color(prim: &gltf::Primitive, images: &[gltf::image::Data]) -> Option<TextureCpu> {
    let info = prim.material().pbr_metallic_roughness().base_color_texture()?;
    let img = images.get(info.texture().source().index())?;
    let pixels = match img.format {
        gltf::image::Format::R8G8B8A8 => img.pixels.clone(),
        gltf::image::Format::R8G8B8 => {
            let mut px = Vec::with_capacity(img.pixels.len() / 3 * 4);
            for rgb in img.pixels.chunks_exact(3) {
                px.extend_from_slice(rgb);
                px.push(255);
            }
            px
        }
        other => {
            log::warn!("unsupported base-color format {:?}; rendering untextured", other);
            return None;
        }
    };
    Some(TextureCpu { width: img.width, height: img.height, pixels })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal glTF with one translated+scaled triangle node, written to a
    // temp dir so the importer exercises its external-buffer path.
    fn write_triangle_gltf(dir: &std::path::Path) -> std::path::PathBuf {
        let mut bin: Vec<u8> = Vec::new();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        std::fs::write(dir.join("tri.bin"), &bin).expect("write bin");
        let json = r#"{
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "mesh": 0, "translation": [2, 0, 0], "scale": [2, 2, 2] }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
            "accessors": [{
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0, 0, 0], "max": [1, 1, 0]
            }],
            "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
            "buffers": [{ "uri": "tri.bin", "byteLength": 36 }]
        }"#;
        let path = dir.join("tri.gltf");
        std::fs::write(&path, json).expect("write gltf");
        path
    }

    #[test]
    fn bakes_node_transforms_into_vertices() {
        let dir = std::env::temp_dir().join("sizeview_gltf_test");
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = write_triangle_gltf(&dir);
        let scene = load_gltf_scene(&path).expect("load triangle");
        assert_eq!(scene.vertices.len(), 3);
        assert_eq!(scene.indices, vec![0, 1, 2]);
        // (1,0,0) scaled by 2 then translated by (2,0,0).
        let (min_b, max_b) = scene.aabb();
        assert!((max_b.x - 4.0).abs() < 1e-6);
        assert!((max_b.y - 2.0).abs() < 1e-6);
        assert!((min_b.x - 2.0).abs() < 1e-6);
        // No normals in the source: constant up fallback.
        assert_eq!(scene.vertices[0].nrm, [0.0, 1.0, 0.0]);
        assert_eq!(scene.vertices[0].uv, [0.0, 0.0]);
        assert!(scene.base_color.is_none());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_gltf_scene(std::path::Path::new("/nonexistent/x.glb"))
            .expect_err("must fail");
        assert!(format!("{err:#}").contains("x.glb"));
    }
}
