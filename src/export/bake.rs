//! Texture baking into a per-triangle atlas.

use super::simplify::bounds;
use crate::model::{GaussianSplat, MeshData};
use crate::{Error, Result};
use image::{Rgba, RgbaImage};

const FALLBACK_COLOR: [f32; 3] = [0.5, 0.5, 0.5];
const MAX_INDEX_RESOLUTION: usize = 64;

/// A baked atlas plus the UV every vertex of face `i` should use.
#[derive(Debug)]
pub struct BakedTexture {
    pub image: RgbaImage,
    pub face_uvs: Vec<[f32; 2]>,
}

/// Colour every face of `mesh` and write each into its own texel.
///
/// Faces take the mean of their vertex colours when the mesh carries them,
/// otherwise the colour of the Gaussian nearest their centroid.
pub fn bake(mesh: &MeshData, gaussian: &GaussianSplat, texture_size: u32) -> Result<BakedTexture> {
    if texture_size == 0 {
        return Err(Error::postprocess("texture size must be positive"));
    }
    let capacity = u64::from(texture_size) * u64::from(texture_size);
    if mesh.faces.len() as u64 > capacity {
        return Err(Error::postprocess(format!(
            "{} faces do not fit a {}x{} texture",
            mesh.faces.len(),
            texture_size,
            texture_size
        )));
    }

    let index = (mesh.vertex_colors.is_none() && !gaussian.is_empty())
        .then(|| SplatIndex::build(gaussian));

    let mut image = RgbaImage::new(texture_size, texture_size);
    let mut face_uvs = Vec::with_capacity(mesh.faces.len());

    for (i, face) in mesh.faces.iter().enumerate() {
        let color = match (&mesh.vertex_colors, &index) {
            (Some(colors), _) => mean(face.map(|v| colors[v as usize])),
            (None, Some(index)) => {
                let centroid = mean(face.map(|v| mesh.vertices[v as usize]));
                gaussian.colors[index.nearest(centroid)]
            }
            (None, None) => FALLBACK_COLOR,
        };

        let x = i as u32 % texture_size;
        let y = i as u32 / texture_size;
        image.put_pixel(x, y, to_rgba(color));

        let size = texture_size as f32;
        face_uvs.push([(x as f32 + 0.5) / size, (y as f32 + 0.5) / size]);
    }

    Ok(BakedTexture { image, face_uvs })
}

fn mean(points: [[f32; 3]; 3]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for p in points {
        for axis in 0..3 {
            out[axis] += p[axis] / 3.0;
        }
    }
    out
}

fn to_rgba(color: [f32; 3]) -> Rgba<u8> {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([channel(color[0]), channel(color[1]), channel(color[2]), 255])
}

/// Uniform grid over Gaussian centres for nearest-neighbour lookups.
struct SplatIndex<'a> {
    positions: &'a [[f32; 3]],
    min: [f32; 3],
    cell: f32,
    dims: [usize; 3],
    cells: Vec<Vec<usize>>,
}

impl<'a> SplatIndex<'a> {
    fn build(splat: &'a GaussianSplat) -> Self {
        let positions = splat.positions.as_slice();
        let (min, max) = bounds(positions);
        let extent = (0..3).map(|a| max[a] - min[a]).fold(0.0f32, f32::max);
        let resolution = ((positions.len() as f64).cbrt().ceil() as usize).clamp(1, MAX_INDEX_RESOLUTION);
        let cell = if extent > 0.0 {
            extent / resolution as f32
        } else {
            1.0
        };

        let mut dims = [1usize; 3];
        for axis in 0..3 {
            dims[axis] = (((max[axis] - min[axis]) / cell).floor() as usize + 1).min(resolution);
        }

        let mut index = Self {
            positions,
            min,
            cell,
            dims,
            cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
        };
        for (i, p) in positions.iter().enumerate() {
            let c = index.cell_of(*p);
            let slot = index.slot(c);
            index.cells[slot].push(i);
        }
        index
    }

    fn cell_of(&self, p: [f32; 3]) -> [usize; 3] {
        let mut c = [0usize; 3];
        for axis in 0..3 {
            let idx = ((p[axis] - self.min[axis]) / self.cell).floor().max(0.0) as usize;
            c[axis] = idx.min(self.dims[axis] - 1);
        }
        c
    }

    fn slot(&self, c: [usize; 3]) -> usize {
        (c[2] * self.dims[1] + c[1]) * self.dims[0] + c[0]
    }

    /// Index of the Gaussian closest to `p`; ties go to the lowest ring visited first.
    fn nearest(&self, p: [f32; 3]) -> usize {
        let center = self.cell_of(p);
        let max_ring = self.dims.iter().copied().max().unwrap_or(1);
        let mut best: Option<(f32, usize)> = None;

        for ring in 0..=max_ring {
            let r = ring as isize;
            for dz in -r..=r {
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx.abs().max(dy.abs()).max(dz.abs()) != r {
                            continue;
                        }
                        let Some(c) = self.offset(center, [dx, dy, dz]) else {
                            continue;
                        };
                        for &i in &self.cells[self.slot(c)] {
                            let d = distance_sq(self.positions[i], p);
                            if best.is_none_or(|(bd, _)| d < bd) {
                                best = Some((d, i));
                            }
                        }
                    }
                }
            }

            // Anything in a farther ring is at least `ring` whole cells away.
            if let Some((d, _)) = best {
                let reach = ring as f32 * self.cell;
                if d <= reach * reach {
                    break;
                }
            }
        }

        best.map(|(_, i)| i).unwrap_or(0)
    }

    fn offset(&self, c: [usize; 3], d: [isize; 3]) -> Option<[usize; 3]> {
        let mut out = [0usize; 3];
        for axis in 0..3 {
            let v = c[axis] as isize + d[axis];
            if v < 0 || v >= self.dims[axis] as isize {
                return None;
            }
            out[axis] = v as usize;
        }
        Some(out)
    }
}

fn distance_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    (0..3).map(|i| (a[i] - b[i]) * (a[i] - b[i])).sum()
}
