//! Scene ownership and the demo scene.
//!
//! [`SceneRegistry`] owns every entity. [`HairScene`] builds the demo
//! contents from a [`SimulationConfig`](crate::simulation::SimulationConfig)
//! and drives one frame at a time.

pub mod hair_scene;
pub mod model;
pub mod registry;

use thiserror::Error;

use crate::assets::AssetError;
use crate::context::GpuError;
use crate::frame::FrameError;
use crate::hair::HairError;
use crate::simulation::GridError;

pub use hair_scene::HairScene;
pub use model::HeadModel;
pub use registry::{ColliderPoolId, GridId, HairId, MissingEntity, ModelId, SceneRegistry, SimulationTriple};

/// Failures while building or running the scene. Every one of them ends
/// the demo.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("hair error: {0}")]
    Hair(#[from] HairError),

    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("scene has no {0:?}")]
    Missing(MissingEntity),
}
