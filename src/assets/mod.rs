//! Asset collaborators: meshes and textures.
//!
//! The simulation core only needs two contracts, [`MeshSource::load_mesh`]
//! and [`load_texture`]. When no asset file is configured the scene falls
//! back to [`procedural`] geometry built from the collider ellipsoids.

pub mod mesh;
pub mod obj;
pub mod procedural;
pub mod texture;

use std::path::PathBuf;

use thiserror::Error;

pub use mesh::{MeshData, MeshSource, MeshVertex, ObjMeshSource};
pub use texture::{load_texture, TextureData};

/// Load-time asset failures. All of them are fatal for the demo.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("malformed asset {name}: {message}")]
    Malformed { name: String, message: String },
}
