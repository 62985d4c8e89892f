//! Triangle mesh data shared by surface sampling and the mesh renderer.

use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::{obj, AssetError};

/// Interleaved vertex, 32 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Layout exposing only the position at location 0.
    pub fn position_only_desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::POSITION_ATTRIBUTES,
        }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corners of triangle `index` in winding order.
    pub fn triangle(&self, index: usize) -> [&MeshVertex; 3] {
        let i = index * 3;
        [
            &self.vertices[self.indices[i] as usize],
            &self.vertices[self.indices[i + 1] as usize],
            &self.vertices[self.indices[i + 2] as usize],
        ]
    }

    /// Copy of the mesh with positions moved by `transform` and normals by
    /// its inverse transpose.
    pub fn transformed(&self, transform: Mat4) -> Self {
        let normal_matrix = transform.inverse().transpose();
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let position = transform.transform_point3(v.position());
                let normal = normal_matrix.transform_vector3(v.normal()).normalize_or_zero();
                MeshVertex::new(position, normal, v.uv)
            })
            .collect();

        Self {
            vertices,
            indices: self.indices.clone(),
        }
    }

    /// Append `other`, rebasing its indices.
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Check that every index points at a vertex and the list is whole triangles.
    pub fn validate(&self, name: &str) -> Result<(), AssetError> {
        if self.indices.len() % 3 != 0 {
            return Err(AssetError::Malformed {
                name: name.to_string(),
                message: format!("index count {} is not a multiple of 3", self.indices.len()),
            });
        }
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= self.vertices.len()) {
            return Err(AssetError::Malformed {
                name: name.to_string(),
                message: format!("index {} out of range for {} vertices", bad, self.vertices.len()),
            });
        }
        Ok(())
    }
}

/// Supplies triangle meshes by name.
pub trait MeshSource {
    fn load_mesh(&self, name: &str) -> Result<MeshData, AssetError>;
}

/// Loads Wavefront OBJ files relative to a root directory.
#[derive(Debug, Clone)]
pub struct ObjMeshSource {
    root: PathBuf,
}

impl ObjMeshSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MeshSource for ObjMeshSource {
    fn load_mesh(&self, name: &str) -> Result<MeshData, AssetError> {
        let path = self.root.join(name);
        let text = std::fs::read_to_string(&path).map_err(|source| AssetError::Io {
            path: path.clone(),
            source,
        })?;

        let mesh = obj::parse_obj(&text).map_err(|err| AssetError::Malformed {
            name: path.display().to_string(),
            message: err.to_string(),
        })?;
        mesh.validate(name)?;

        log::info!(
            "Loaded mesh {} ({} vertices, {} triangles)",
            path.display(),
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> MeshData {
        MeshData {
            vertices: vec![
                MeshVertex::new(Vec3::ZERO, Vec3::Z, [0.0, 0.0]),
                MeshVertex::new(Vec3::X, Vec3::Z, [1.0, 0.0]),
                MeshVertex::new(Vec3::Y, Vec3::Z, [0.0, 1.0]),
            ],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
    }

    #[test]
    fn test_append_rebases_indices() {
        let mut mesh = single_triangle();
        mesh.append(&single_triangle());
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.validate("pair").is_ok());
    }

    #[test]
    fn test_transformed_moves_positions_and_keeps_normals_unit() {
        let mesh = single_triangle().transformed(
            Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)) * Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)),
        );
        assert_eq!(mesh.vertices[1].position(), Vec3::new(2.0, 2.0, 0.0));
        assert!((mesh.vertices[0].normal().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let mut mesh = single_triangle();
        mesh.indices[2] = 7;
        assert!(matches!(mesh.validate("broken"), Err(AssetError::Malformed { .. })));
    }
}
