use glam::Mat4;

use crate::assets::{MeshData, TextureData};

/// Static textured head mesh.
pub struct HeadModel {
    pub name: String,
    pub mesh: MeshData,
    pub texture: TextureData,
    pub model_matrix: Mat4,
}

impl HeadModel {
    pub fn new(name: impl Into<String>, mesh: MeshData, texture: TextureData) -> Self {
        Self {
            name: name.into(),
            mesh,
            texture,
            model_matrix: Mat4::IDENTITY,
        }
    }
}
