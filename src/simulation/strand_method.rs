//! Strand method: per-strand Verlet integration followed by a length
//! constraint pass.

use crate::context::{GpuError, GraphicsContext};
use crate::scene::registry::{ColliderPoolId, GridId, HairId, SceneRegistry};

use super::compute_pipelines::{HairComputePipelines, MethodUniform, StrandBindGroups};
use super::dispatch::{workgroup_count, STRAND_WORKGROUP_SIZE};
use super::globals::GlobalUniforms;
use super::method::{MethodKind, MethodUiInput, SimulateOutcome, SimulationMethod, SkipReason};

type BindingKey = (HairId, GridId, ColliderPoolId);

struct StrandResources {
    pipelines: HairComputePipelines,
    method_uniform: wgpu::Buffer,
    /// Bind groups for the last simulated triple. Hair buffers are updated
    /// in place on reset and restyle, so the ids are a sufficient key.
    bindings: Option<(BindingKey, StrandBindGroups)>,
}

pub struct StrandMethod {
    constraint_pass: bool,
    debug_view: bool,
    resources: Option<StrandResources>,
}

impl StrandMethod {
    pub fn new(constraint_pass: bool) -> Self {
        Self {
            constraint_pass,
            debug_view: false,
            resources: None,
        }
    }

    pub fn constraint_pass(&self) -> bool {
        self.constraint_pass
    }

    pub fn set_constraint_pass(&mut self, enabled: bool) {
        self.constraint_pass = enabled;
    }

    /// Compute passes one recorded step contains.
    pub fn pass_count(&self) -> u32 {
        if self.constraint_pass {
            2
        } else {
            1
        }
    }
}

impl SimulationMethod for StrandMethod {
    fn kind(&self) -> MethodKind {
        MethodKind::Strand
    }

    fn prepare(&mut self, ctx: &GraphicsContext, globals: &GlobalUniforms) -> Result<(), GpuError> {
        let pipelines = HairComputePipelines::new(ctx, globals)?;
        let method_uniform = ctx.checked("strand method uniform", |ctx| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Strand Method Uniform"),
                size: std::mem::size_of::<MethodUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })?;

        self.resources = Some(StrandResources {
            pipelines,
            method_uniform,
            bindings: None,
        });
        log::info!("Strand method prepared (constraint pass {})", if self.constraint_pass { "on" } else { "off" });
        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.resources.is_some()
    }

    fn simulate(
        &mut self,
        ctx: &GraphicsContext,
        encoder: &mut wgpu::CommandEncoder,
        scene: &SceneRegistry,
        globals: &GlobalUniforms,
        delta_time: f32,
    ) -> Result<SimulateOutcome, GpuError> {
        let passes = self.pass_count();
        let resources = self.resources.as_mut().ok_or(GpuError::NotPrepared("strand method"))?;

        let triple = match scene.simulation_triple() {
            Ok(triple) => triple,
            Err(missing) => {
                log::trace!("Strand step skipped: no {:?} registered", missing);
                return Ok(SimulateOutcome::Skipped(SkipReason::MissingEntity(missing)));
            }
        };
        if !(delta_time > 0.0) {
            return Ok(SimulateOutcome::Skipped(SkipReason::NoTimeStep));
        }

        let grid_cells = triple.grid.buffer().ok_or(GpuError::NotPrepared("grid buffer"))?;
        let colliders = triple.colliders.buffer().ok_or(GpuError::NotPrepared("collider buffer"))?;

        let uniform = MethodUniform::new(triple.hair.model_matrix);
        ctx.queue.write_buffer(&resources.method_uniform, 0, bytemuck::bytes_of(&uniform));

        let key = (triple.hair_id, triple.grid_id, triple.collider_pool_id);
        let pipelines = &resources.pipelines;
        let method_uniform = &resources.method_uniform;
        let bind_groups: &StrandBindGroups = match &mut resources.bindings {
            Some((cached, groups)) if *cached == key => groups,
            slot => {
                let groups = ctx.checked("strand bind groups", |ctx| {
                    pipelines.create_bind_groups(
                        &ctx.device,
                        method_uniform,
                        triple.hair.buffers(),
                        grid_cells,
                        colliders,
                    )
                })?;
                &slot.insert((key, groups)).1
            }
        };

        let workgroups = workgroup_count(triple.hair.num_strands(), STRAND_WORKGROUP_SIZE);
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Hair Integrate"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipelines.integrate);
            bind_groups.bind(&mut pass, globals.bind_group());
            pass.dispatch_workgroups(workgroups, 1, 1);
        }

        // A separate pass makes the integrate writes visible to the constraint.
        if passes > 1 {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Hair Constrain"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipelines.constrain);
            bind_groups.bind(&mut pass, globals.bind_group());
            pass.dispatch_workgroups(workgroups, 1, 1);
        }

        log::trace!(
            "Strand step recorded: hair '{}', {} work-groups x {} passes, dt {:.4}",
            triple.hair.name,
            workgroups,
            passes,
            delta_time
        );
        Ok(SimulateOutcome::Recorded { workgroups, passes })
    }

    fn on_ui_update(&mut self, input: &MethodUiInput) -> bool {
        if !input.toggle_debug_view {
            return false;
        }
        self.debug_view = !self.debug_view;
        log::info!("Strand debug view {}", if self.debug_view { "on" } else { "off" });
        true
    }

    fn debug_view(&self) -> bool {
        self.debug_view
    }
}
