//! Vertex-clustering decimation.
//!
//! Vertices are snapped to a uniform grid over the mesh bounds and merged per
//! cell; faces that collapse or duplicate are dropped. The grid is coarsened
//! until the face budget is met.

use crate::model::MeshData;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

const MAX_GRID_RESOLUTION: u32 = 1024;

/// Reduce `mesh` so that at most `ceil(faces * (1 - ratio))` triangles remain.
///
/// `ratio` is the fraction of triangles to remove. The result is never empty
/// for a mesh with at least one face.
pub fn simplify(mesh: &MeshData, ratio: f32) -> Result<MeshData> {
    if mesh.faces.is_empty() {
        return Err(Error::postprocess("mesh has no faces"));
    }
    if !(0.0..1.0).contains(&ratio) {
        return Err(Error::postprocess(format!(
            "simplify ratio must be in [0, 1), got {}",
            ratio
        )));
    }

    let target = target_face_count(mesh.faces.len(), ratio);
    if mesh.faces.len() <= target {
        return Ok(mesh.clone());
    }

    let (min, max) = bounds(&mesh.vertices);
    let mut resolution = MAX_GRID_RESOLUTION;
    let mut coarsest_nonempty = None;

    while resolution >= 1 {
        let clustered = cluster(mesh, min, max, resolution);
        if clustered.faces.len() <= target {
            if !clustered.faces.is_empty() {
                return Ok(clustered);
            }
            break;
        }
        coarsest_nonempty = Some(clustered);
        resolution /= 2;
    }

    // The grid jumped from over budget straight to nothing; keep a prefix.
    let mut fallback = coarsest_nonempty.unwrap_or_else(|| mesh.clone());
    fallback.faces.truncate(target);
    Ok(fallback)
}

pub fn target_face_count(faces: usize, ratio: f32) -> usize {
    let kept = (faces as f64 * (1.0 - f64::from(ratio))).ceil();
    (kept as usize).clamp(1, faces.max(1))
}

pub(crate) fn bounds(points: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for p in points {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    if points.is_empty() {
        return ([0.0; 3], [0.0; 3]);
    }
    (min, max)
}

fn cluster(mesh: &MeshData, min: [f32; 3], max: [f32; 3], resolution: u32) -> MeshData {
    let extent = (0..3).map(|a| max[a] - min[a]).fold(0.0f32, f32::max);
    let cell = if extent > 0.0 {
        extent / resolution as f32
    } else {
        1.0
    };

    let cell_of = |p: &[f32; 3]| -> [u32; 3] {
        let mut key = [0u32; 3];
        for axis in 0..3 {
            let idx = ((p[axis] - min[axis]) / cell).floor().max(0.0) as u32;
            key[axis] = idx.min(resolution - 1);
        }
        key
    };

    let mut cluster_ids: HashMap<[u32; 3], usize> = HashMap::new();
    let mut remap = Vec::with_capacity(mesh.vertices.len());
    let mut sums: Vec<[f64; 3]> = Vec::new();
    let mut color_sums: Vec<[f64; 3]> = Vec::new();
    let mut counts: Vec<u32> = Vec::new();

    for (i, vertex) in mesh.vertices.iter().enumerate() {
        let next = sums.len();
        let id = *cluster_ids.entry(cell_of(vertex)).or_insert(next);
        if id == next {
            sums.push([0.0; 3]);
            color_sums.push([0.0; 3]);
            counts.push(0);
        }
        for axis in 0..3 {
            sums[id][axis] += f64::from(vertex[axis]);
        }
        if let Some(colors) = &mesh.vertex_colors {
            for channel in 0..3 {
                color_sums[id][channel] += f64::from(colors[i][channel]);
            }
        }
        counts[id] += 1;
        remap.push(id as u32);
    }

    let average = |sum: &[f64; 3], n: u32| -> [f32; 3] {
        let n = f64::from(n);
        [(sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32]
    };

    let vertices = sums
        .iter()
        .zip(&counts)
        .map(|(s, &n)| average(s, n))
        .collect();
    let vertex_colors = mesh.vertex_colors.as_ref().map(|_| {
        color_sums
            .iter()
            .zip(&counts)
            .map(|(s, &n)| average(s, n))
            .collect()
    });

    let mut seen = HashSet::new();
    let faces = mesh
        .faces
        .iter()
        .map(|f| [remap[f[0] as usize], remap[f[1] as usize], remap[f[2] as usize]])
        .filter(|f| f[0] != f[1] && f[1] != f[2] && f[0] != f[2])
        .filter(|f| {
            let mut key = *f;
            key.sort_unstable();
            seen.insert(key)
        })
        .collect();

    MeshData {
        vertices,
        faces,
        vertex_colors,
    }
}
