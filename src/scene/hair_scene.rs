//! The hair demo scene.
//!
//! Owns the registry and everything that draws or simulates it. A frame is
//! `acquire → simulate → render → present`, sequenced by the
//! [`FrameOrchestrator`]; a paused frame goes straight from acquire to render.

use std::path::Path;

use glam::Mat4;

use crate::assets::{load_texture, procedural, AssetError, MeshData, MeshSource, ObjMeshSource, TextureData};
use crate::context::GraphicsContext;
use crate::frame::{FrameOrchestrator, WgpuSubmitQueue};
use crate::hair::Hair;
use crate::rendering::{ColliderRenderer, DepthTexture, GridCellRenderer, HairLineRenderer, HeadMeshRenderer};
use crate::simulation::{
    ColliderPool, GlobalUniforms, GridStruct, MethodKind, MethodManager, MethodUiInput, SimulateOutcome,
    SimulationConfig,
};
use crate::ui::{ControlAction, ControlResponse, DebugControls, OrbitCamera, HEAD_CENTRE};

use super::registry::{HairId, MissingEntity, SceneRegistry};
use super::{HeadModel, SceneError};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.07,
    a: 1.0,
};

const SKIN_TONE: [u8; 4] = [214, 180, 160, 255];

pub struct HairScene {
    registry: SceneRegistry,
    hair_id: HairId,
    methods: MethodManager,
    globals: GlobalUniforms,
    orchestrator: FrameOrchestrator,
    pub camera: OrbitCamera,
    pub controls: DebugControls,

    head_renderer: HeadMeshRenderer,
    hair_renderer: HairLineRenderer,
    grid_renderer: GridCellRenderer,
    collider_renderer: ColliderRenderer,
    depth: DepthTexture,
    width: u32,
    height: u32,
}

impl HairScene {
    /// Build the demo scene and prime the frame orchestrator.
    pub fn new(ctx: &GraphicsContext, config: &SimulationConfig, width: u32, height: u32) -> Result<Self, SceneError> {
        let controls = DebugControls::new(config.toggles, config.parameters);

        let mut colliders = ColliderPool::new("mannequin", config.colliders.clone());
        colliders.upload(ctx)?;

        let head_transform = colliders
            .find("head")
            .map(|c| c.transform)
            .unwrap_or_else(|| Mat4::from_translation(HEAD_CENTRE));

        let head_mesh = match &config.assets.head_mesh {
            Some(path) => load_mesh_file(path)?,
            None => procedural::mannequin(&colliders.body_transforms()),
        };
        let scalp = match &config.assets.scalp_mesh {
            Some(path) => load_mesh_file(path)?,
            None => procedural::scalp(head_transform),
        };
        let texture = match &config.assets.head_texture {
            Some(path) => load_texture(path)?,
            None => TextureData::solid(SKIN_TONE),
        };
        let model = HeadModel::new("head", head_mesh, texture);

        let hair = Hair::construct(
            ctx,
            "hair",
            &scalp,
            config.hair.layout(),
            config.hair.style,
            *controls.parameters(),
            config.sampling_seed,
        )?;

        let mut grid = GridStruct::new(
            "grid",
            config.grid.position,
            config.grid.dimensions,
            config.grid.resolution,
            config.sampling_seed,
        )?;
        grid.upload(ctx)?;

        let globals = GlobalUniforms::new(ctx);
        let head_renderer = HeadMeshRenderer::new(ctx, &globals, &model)?;
        let hair_renderer = HairLineRenderer::new(ctx, &globals, *hair.layout())?;
        let grid_renderer = GridCellRenderer::new(ctx, &globals)?;
        let collider_renderer = ColliderRenderer::new(ctx, &globals)?;
        let depth = DepthTexture::new(&ctx.device, ctx.depth_format, width, height);

        let mut registry = SceneRegistry::new();
        registry.add_model(model);
        let hair_id = registry.add_hair(hair);
        registry.add_grid(grid);
        registry.add_collider_pool(colliders);
        log::info!("Scene ready: {}", registry.summary());

        // Build the starting method now so pipeline errors surface at startup.
        let mut methods = MethodManager::new(config.method, config.constraint_pass);
        methods.active_mut(ctx, &globals)?;

        let mut orchestrator = FrameOrchestrator::new(config.toggles.paused);
        orchestrator.prime(&mut WgpuSubmitQueue::new(&ctx.queue))?;

        Ok(Self {
            registry,
            hair_id,
            methods,
            globals,
            orchestrator,
            camera: OrbitCamera::default(),
            controls,
            head_renderer,
            hair_renderer,
            grid_renderer,
            collider_renderer,
            depth,
            width: width.max(1),
            height: height.max(1),
        })
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn orchestrator(&self) -> &FrameOrchestrator {
        &self.orchestrator
    }

    pub fn method(&self) -> MethodKind {
        self.methods.current()
    }

    pub fn resize(&mut self, ctx: &GraphicsContext, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.depth = DepthTexture::new(&ctx.device, ctx.depth_format, self.width, self.height);
    }

    fn hair_mut(&mut self) -> Result<&mut Hair, SceneError> {
        self.registry
            .hair_mut(self.hair_id)
            .ok_or(SceneError::Missing(MissingEntity::Hair))
    }

    /// Apply one key action.
    pub fn handle_action(&mut self, ctx: &GraphicsContext, action: ControlAction) -> Result<(), SceneError> {
        match self.controls.apply(action) {
            ControlResponse::None => {}
            ControlResponse::PauseChanged(paused) => {
                self.orchestrator.set_paused(paused);
                log::info!("Simulation {}", if paused { "paused" } else { "resumed" });
            }
            ControlResponse::ParametersChanged(parameters) => {
                self.hair_mut()?.update_parameters(&ctx.queue, parameters);
            }
            ControlResponse::Reset => self.hair_mut()?.reset(ctx)?,
            ControlResponse::ToggleStyle => {
                let hair = self.hair_mut()?;
                let style = hair.style().toggled();
                hair.set_style(ctx, style)?;
            }
            ControlResponse::CycleMethod => {
                self.methods.cycle();
                self.methods.active_mut(ctx, &self.globals)?;
                self.hair_renderer.set_debug_view(&ctx.queue, self.methods.debug_view());
            }
            ControlResponse::ToggleDebugView => {
                let input = MethodUiInput { toggle_debug_view: true };
                if self.methods.on_ui_update(&input) {
                    log::info!("{} debug view: {}", self.methods.current(), self.methods.debug_view());
                } else {
                    log::info!("{} has no debug view", self.methods.current());
                }
                self.hair_renderer.set_debug_view(&ctx.queue, self.methods.debug_view());
            }
        }
        Ok(())
    }

    /// Render into `frame` and present it.
    pub fn render_frame(
        &mut self,
        ctx: &GraphicsContext,
        frame: wgpu::SurfaceTexture,
        delta_time: f32,
    ) -> Result<(), SceneError> {
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.draw(ctx, &view, delta_time)?;
        frame.present();
        self.orchestrator.present()?;
        Ok(())
    }

    /// Everything up to presentation: uniforms, simulation and draw
    /// submissions. Used directly when rendering offscreen, followed by
    /// [`HairScene::finish_offscreen_frame`].
    pub fn draw(&mut self, ctx: &GraphicsContext, target: &wgpu::TextureView, delta_time: f32) -> Result<(), SceneError> {
        self.camera.update(delta_time);
        let aspect = self.width as f32 / self.height as f32;
        self.globals.write_camera(&ctx.queue, &self.camera.uniform(aspect));
        let time = self.globals.write_time(&ctx.queue, delta_time);

        self.orchestrator.acquire_image()?;
        let mut queue = WgpuSubmitQueue::new(&ctx.queue);

        if !self.orchestrator.is_paused() {
            let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Simulation Encoder"),
            });
            let method = self.methods.active_mut(ctx, &self.globals)?;
            let outcome = method.simulate(ctx, &mut encoder, &self.registry, &self.globals, time.delta_time)?;
            if let SimulateOutcome::Skipped(reason) = outcome {
                log::debug!("frame {}: simulation skipped ({:?})", self.orchestrator.frame_index(), reason);
            }
            self.orchestrator.submit_simulation(&mut queue, vec![encoder.finish()])?;
        }

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        self.record_draws(&mut encoder, target);
        self.orchestrator.submit_render(&mut queue, vec![encoder.finish()])?;
        Ok(())
    }

    /// Close a frame drawn with [`HairScene::draw`] without a surface.
    pub fn finish_offscreen_frame(&mut self) -> Result<(), SceneError> {
        self.orchestrator.present()?;
        Ok(())
    }

    fn record_draws(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let toggles = self.controls.toggles;
        let globals = self.globals.bind_group();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // Opaque first, then the alpha-blended overlays.
        if toggles.draw_head {
            self.head_renderer.draw(&mut pass, globals);
        }
        if toggles.draw_hair {
            if let Some(hair) = self.registry.hair(self.hair_id) {
                self.hair_renderer.draw(&mut pass, globals, hair);
            }
        }
        if toggles.draw_colliders {
            for (_, pool) in self.registry.collider_pools() {
                self.collider_renderer.draw(&mut pass, globals, pool);
            }
        }
        if toggles.draw_grid {
            for (_, grid) in self.registry.grids() {
                self.grid_renderer.draw(&mut pass, globals, grid);
            }
        }
    }
}

fn load_mesh_file(path: &Path) -> Result<MeshData, AssetError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AssetError::Malformed {
            name: path.display().to_string(),
            message: "not a file path".to_string(),
        })?;
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    ObjMeshSource::new(root).load_mesh(name)
}
