//! GPU simulation of hair strands.
//!
//! [`MethodManager`] owns the selectable simulation methods. The strand
//! method records an integrate pass and an optional constraint pass over the
//! first hair, grid and collider pool in the scene registry.

pub mod collider;
pub mod compute_pipelines;
pub mod config;
pub mod dispatch;
pub mod globals;
pub mod hybrid_method;
pub mod manager;
pub mod method;
pub mod spatial_grid;
pub mod strand_method;

pub use collider::{friction_carry, Collider, ColliderDesc, ColliderPool, Contact, GpuCollider, COLLIDER_HEADER_SIZE};
pub use config::{ConfigError, SimulationConfig};
pub use dispatch::{workgroup_count, STRAND_WORKGROUP_SIZE};
pub use globals::{CameraUniform, GlobalUniforms, TimeUniform};
pub use hybrid_method::HybridMethod;
pub use manager::MethodManager;
pub use method::{MethodKind, MethodUiInput, SimulateOutcome, SimulationMethod, SkipReason};
pub use spatial_grid::{GridCell, GridError, GridStruct};
pub use strand_method::StrandMethod;
