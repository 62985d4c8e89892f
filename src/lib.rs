//! # Hair Sim: GPU Mass-Spring Hair Simulation
//!
//! A real-time hair demo. A few thousand strands of point masses are grown
//! from a scalp mesh, integrated on the GPU every frame, pushed out of a set
//! of ellipsoid colliders and drawn as line strips over a textured head.
//!
//! ## Architecture Overview
//!
//! ### 1. Strand data ([`hair`])
//! - [`hair::Hair`] - rest state plus the four GPU arrays (rest, position,
//!   previous, velocity) that make up the strand buffer store
//! - [`hair::sampling`] - seeded root sampling, uniform over triangles
//! - [`hair::HairParameters`] - runtime-tunable simulation scalars
//!
//! ### 2. Simulation ([`simulation`])
//! - [`simulation::SimulationMethod`] - strategy trait, one per method
//! - [`simulation::StrandMethod`] - integrate + constrain compute passes
//! - [`simulation::HybridMethod`] - selectable, records no work
//! - [`simulation::MethodManager`] - lazy creation and switching
//! - [`simulation::ColliderPool`] / [`simulation::GridStruct`] - static inputs
//!
//! ### 3. Frame sequencing ([`frame`])
//! - [`frame::FrameOrchestrator`] - `acquire → simulate → render → present`
//!   with the `ComputeDone`/`GraphicsDone` semaphore protocol
//! - [`frame::SemaphoreLedger`] - validates every wait and signal
//!
//! ### 4. Scene and drawing ([`scene`], [`rendering`])
//! - [`scene::SceneRegistry`] - flat owner of every entity, typed ids
//! - [`scene::HairScene`] - builds the demo and drives a frame
//! - [`rendering`] - head mesh, hair lines, grid cells, colliders
//!
//! ### 5. Input ([`ui`])
//! - [`ui::OrbitCamera`] - mouse orbit around the head
//! - [`ui::DebugControls`] - key bindings for toggles and parameters
//!
//! ## Data Flow
//!
//! ```text
//! Input Events → Camera/Uniforms → Simulate (compute) → Render → Present
//! ```
//!
//! ## Dependencies
//!
//! - **Graphics**: `wgpu` (GPU abstraction), `winit` (windowing), `pollster`
//! - **Math**: `glam` (SIMD math types), `bytemuck` (safe transmutation)
//! - **Serialization**: `serde` + `ron` (startup settings)
//! - **Assets**: `image` (head texture decoding)
//! - **Sampling**: `rand` + `rand_chacha` (reproducible strand roots)

pub mod app;
pub mod assets;
pub mod context;
pub mod frame;
pub mod hair;
pub mod rendering;
pub mod scene;
pub mod simulation;
pub mod ui;
