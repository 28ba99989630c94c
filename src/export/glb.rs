use super::bake::bake;
use super::simplify::{bounds, simplify};
use super::{Exportable, Exporter};
use crate::model::{GaussianSplat, MeshData};
use crate::{Error, Result};
use image::ImageFormat;
use serde_json::json;
use std::io::{Cursor, Write};
use tracing::debug;

const GLB_MAGIC: u32 = 0x4654_6C67;
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const NEAREST: u32 = 9728;
const CLAMP_TO_EDGE: u32 = 33071;

/// Simplifies the mesh, bakes a texture and packs both into glTF binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlbExporter;

impl Exporter for GlbExporter {
    fn to_binary_asset(
        &self,
        gaussian: &GaussianSplat,
        mesh: &MeshData,
        simplify_ratio: f32,
        texture_size: u32,
    ) -> Result<Box<dyn Exportable>> {
        gaussian
            .validate()
            .and_then(|()| mesh.validate())
            .map_err(|e| Error::postprocess(e.to_string()))?;

        let simplified = simplify(mesh, simplify_ratio)?;
        debug!(
            "Simplified mesh from {} to {} faces",
            mesh.faces.len(),
            simplified.faces.len()
        );

        let texture = bake(&simplified, gaussian, texture_size)?;
        let mut png = Vec::new();
        texture
            .image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| Error::postprocess(format!("texture encoding failed: {}", e)))?;

        let bytes = assemble(&simplified, &texture.face_uvs, &png)?;
        Ok(Box::new(GlbAsset { bytes }))
    }
}

/// An encoded `.glb` file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlbAsset {
    bytes: Vec<u8>,
}

impl GlbAsset {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Exportable for GlbAsset {
    fn export(&self, destination: &mut dyn Write) -> Result<()> {
        destination.write_all(&self.bytes)?;
        Ok(())
    }
}

/// Build the JSON and binary chunks. Faces are unwelded so each one can point
/// at its own texel.
fn assemble(mesh: &MeshData, face_uvs: &[[f32; 2]], png: &[u8]) -> Result<Vec<u8>> {
    let vertex_count = mesh.faces.len() * 3;
    let mut positions = Vec::with_capacity(vertex_count);
    let mut bin = Vec::new();

    for face in &mesh.faces {
        for &v in face {
            let p = mesh.vertices[v as usize];
            positions.push(p);
            for c in p {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
    }
    let positions_len = bin.len();

    for uv in face_uvs {
        for _ in 0..3 {
            bin.extend_from_slice(&uv[0].to_le_bytes());
            bin.extend_from_slice(&uv[1].to_le_bytes());
        }
    }
    let uvs_len = bin.len() - positions_len;

    for i in 0..vertex_count as u32 {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    let indices_len = bin.len() - positions_len - uvs_len;

    let image_offset = bin.len();
    bin.extend_from_slice(png);
    pad(&mut bin, 0);

    let (min, max) = bounds(&positions);
    let document = json!({
        "asset": { "version": "2.0", "generator": "trellis-worker" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{
            "primitives": [{
                "attributes": { "POSITION": 0, "TEXCOORD_0": 1 },
                "indices": 2,
                "material": 0
            }]
        }],
        "materials": [{
            "pbrMetallicRoughness": {
                "baseColorTexture": { "index": 0 },
                "metallicFactor": 0.0,
                "roughnessFactor": 1.0
            },
            "doubleSided": true
        }],
        "samplers": [{
            "magFilter": NEAREST,
            "minFilter": NEAREST,
            "wrapS": CLAMP_TO_EDGE,
            "wrapT": CLAMP_TO_EDGE
        }],
        "textures": [{ "sampler": 0, "source": 0 }],
        "images": [{ "bufferView": 3, "mimeType": "image/png" }],
        "buffers": [{ "byteLength": bin.len() }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": positions_len, "target": ARRAY_BUFFER },
            { "buffer": 0, "byteOffset": positions_len, "byteLength": uvs_len, "target": ARRAY_BUFFER },
            { "buffer": 0, "byteOffset": positions_len + uvs_len, "byteLength": indices_len, "target": ELEMENT_ARRAY_BUFFER },
            { "buffer": 0, "byteOffset": image_offset, "byteLength": png.len() }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": FLOAT, "count": vertex_count, "type": "VEC3", "min": min, "max": max },
            { "bufferView": 1, "componentType": FLOAT, "count": vertex_count, "type": "VEC2" },
            { "bufferView": 2, "componentType": UNSIGNED_INT, "count": vertex_count, "type": "SCALAR" }
        ]
    });

    let mut json_chunk = serde_json::to_vec(&document)?;
    pad(&mut json_chunk, b' ');

    let total = 12 + 8 + json_chunk.len() + 8 + bin.len();
    let total = u32::try_from(total)
        .map_err(|_| Error::postprocess("asset exceeds the 4 GiB glTF binary limit"))?;

    let mut out = Vec::with_capacity(total as usize);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&total.to_le_bytes());
    write_chunk(&mut out, CHUNK_JSON, &json_chunk);
    write_chunk(&mut out, CHUNK_BIN, &bin);
    Ok(out)
}

fn write_chunk(out: &mut Vec<u8>, kind: u32, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(data);
}

fn pad(buffer: &mut Vec<u8>, byte: u8) {
    while buffer.len() % 4 != 0 {
        buffer.push(byte);
    }
}
