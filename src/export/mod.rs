mod bake;
mod glb;
mod simplify;

pub use bake::{BakedTexture, bake};
pub use glb::{GlbAsset, GlbExporter};
pub use simplify::{simplify, target_face_count};

use crate::Result;
use crate::model::{GaussianSplat, MeshData};
use std::io::Write;

/// A prepared binary scene that can be written out once or many times.
pub trait Exportable: Send {
    fn export(&self, destination: &mut dyn Write) -> Result<()>;
}

/// Turns one Gaussian/mesh pair into a portable binary scene.
pub trait Exporter: Send + Sync {
    /// `simplify` is the fraction of triangles to remove; `texture_size` is the
    /// edge length of the baked square texture.
    fn to_binary_asset(
        &self,
        gaussian: &GaussianSplat,
        mesh: &MeshData,
        simplify: f32,
        texture_size: u32,
    ) -> Result<Box<dyn Exportable>>;
}
