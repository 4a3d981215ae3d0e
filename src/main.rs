//! Seastrike - an interactive submarine scene on an FFT-synthesized ocean
//!
//! A submarine idles offshore while its float plane climbs away; a torpedo
//! run against the patrol boat circling the island ends in an explosion if
//! both hit windows line up.

mod camera;
mod cli;
mod model;
mod ocean;
mod params;
mod rendering;
mod scene;
mod terrain;

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use glam::{Mat4, Vec3, Vec4};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use cli::Args;
use model::SceneMeshes;
use ocean::{OceanPatch, OceanSynthesizer};
use params::{
    Atmosphere, CameraConfig, IslandShaping, NoiseKind, OceanGeometry, RecordingConfig,
    RenderConfig, ScenarioConfig, TerrainOptions,
};
use rendering::{
    interleave_terrain, EntityInstance, FramePayload, RenderSystem, SceneVertex, ENTITY_BOAT,
    ENTITY_COUNT, ENTITY_EXPLOSION, ENTITY_HATCH, ENTITY_HULL, ENTITY_LEFT_PROP, ENTITY_PLANE,
    ENTITY_RIGHT_PROP, ENTITY_TORPEDO,
};
use scene::SimulationState;
use terrain::TerrainGenerator;

/// Main application state
struct App {
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    sim: SimulationState,
    ocean: OceanSynthesizer,
    meshes: SceneMeshes,

    island_size: usize,
    fixed_seed: Option<u32>,
    terrain_seed: u32,
    noise_kind: NoiseKind,
    shaping: IslandShaping,

    render_config: RenderConfig,
    atmosphere: Atmosphere,
    geometry: OceanGeometry,
    recording: Option<RecordingConfig>,

    frame_num: usize,
    last_frame_time: Option<Instant>,
}

impl App {
    fn new(args: &Args) -> Result<Self, String> {
        let ocean = OceanSynthesizer::new(args.spectrum_params()?)?;
        let atmosphere = Atmosphere::default();
        let sim = SimulationState::new(
            ScenarioConfig::default(),
            CameraConfig::default(),
            args.island_size,
            atmosphere.sky_color,
        );

        Ok(Self {
            window: None,
            render_system: None,
            sim,
            ocean,
            meshes: SceneMeshes::procedural(),
            island_size: args.island_size,
            fixed_seed: args.seed,
            terrain_seed: args.terrain_seed(),
            noise_kind: args.parse_noise_kind(),
            shaping: IslandShaping::default(),
            render_config: RenderConfig::default(),
            atmosphere,
            geometry: OceanGeometry::default(),
            recording: args.create_recording_config(),
            frame_num: 0,
            last_frame_time: None,
        })
    }

    fn island_vertices(&self) -> Result<Vec<SceneVertex>, String> {
        let options = TerrainOptions {
            noisefn: self.noise_kind,
            ..TerrainOptions::island(self.island_size, self.terrain_seed)
        };
        let size = self.island_size as f32;
        let mut mesh = TerrainGenerator::new().generate_terrain_mesh(&options)?;
        terrain::fix_island(&mut mesh, size, &self.shaping);

        let colors = terrain::build_island_colors(&mesh, options.height);
        let normals = terrain::build_flat_normals(&mesh);
        let uvs = terrain::build_island_tex_coords(&mesh, size, &self.shaping);
        Ok(interleave_terrain(&mesh, &colors, &normals, &uvs))
    }

    fn sea_bed_vertices(&self) -> Result<Vec<SceneVertex>, String> {
        let options = TerrainOptions::sea_bed(self.terrain_seed);
        let mesh = TerrainGenerator::new().generate_terrain_mesh(&options)?;

        let colors = terrain::build_sea_colors(&mesh, options.height);
        let normals = terrain::build_flat_normals(&mesh);
        let uvs: Vec<[f32; 2]> = mesh
            .iter()
            .map(|v| [v.x / options.width as f32, v.z / options.depth as f32])
            .collect();
        Ok(interleave_terrain(&mesh, &colors, &normals, &uvs))
    }

    /// Rebuild the island with a fresh seed and restart the scenario.
    fn regenerate_island(&mut self, island_size: usize) {
        self.island_size = island_size;
        self.terrain_seed = self.fixed_seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.subsec_millis())
                .unwrap_or(0)
        });

        match self.island_vertices() {
            Ok(vertices) => {
                if let Some(ref mut render_system) = self.render_system {
                    render_system.update_island_mesh(&vertices);
                }
                self.sim.set_island_size(island_size);
                println!(
                    "Island regenerated: size {}, seed {}",
                    island_size, self.terrain_seed
                );
            }
            Err(e) => eprintln!("Island regeneration failed: {}", e),
        }
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool, repeat: bool) {
        // held movement keys
        match code {
            KeyCode::KeyW => self.sim.input.forward = pressed,
            KeyCode::KeyS => self.sim.input.backward = pressed,
            KeyCode::KeyA => self.sim.input.left = pressed,
            KeyCode::KeyD => self.sim.input.right = pressed,
            KeyCode::KeyR => self.sim.input.up = pressed,
            KeyCode::KeyF => self.sim.input.down = pressed,
            KeyCode::KeyQ => self.sim.input.roll_left = pressed,
            KeyCode::KeyE => self.sim.input.roll_right = pressed,
            _ => {}
        }

        if !pressed || repeat {
            return;
        }

        // one-shot action keys
        match code {
            KeyCode::KeyT => {
                self.sim.fire_torpedo();
                println!("Torpedo away");
            }
            KeyCode::KeyC => {
                self.sim.camera.toggle_detached();
                if self.sim.camera.detached {
                    println!("Camera detached: W/S move, A/D yaw, R/F pitch, Q/E roll");
                } else {
                    println!("Camera orbit: W/S distance, A/D orbit, R/F height");
                }
            }
            KeyCode::KeyX => {
                self.sim.reset();
                println!("Scenario reset");
            }
            KeyCode::Minus => {
                let size = (self.island_size.saturating_sub(10)).max(10);
                self.regenerate_island(size);
            }
            KeyCode::Equal => {
                let size = (self.island_size + 10).min(100);
                self.regenerate_island(size);
            }
            KeyCode::BracketLeft => {
                let chop = (self.ocean.choppiness() - 0.5).max(0.0);
                if self.ocean.set_choppiness(chop).is_ok() {
                    println!("Choppiness: {:.1}", chop);
                }
            }
            KeyCode::BracketRight => {
                let chop = self.ocean.choppiness() + 0.5;
                if self.ocean.set_choppiness(chop).is_ok() {
                    println!("Choppiness: {:.1}", chop);
                }
            }
            KeyCode::Comma => {
                let wind = self.ocean.wind() * 0.8;
                if self.ocean.set_wind(wind).is_ok() {
                    println!("Wind: {:.1} m/s", wind.length());
                }
            }
            KeyCode::Period => {
                let wind = self.ocean.wind() * 1.25;
                if self.ocean.set_wind(wind).is_ok() {
                    println!("Wind: {:.1} m/s", wind.length());
                }
            }
            _ => {}
        }
    }

    /// Advance the simulation and draw a single frame.
    fn render_frame(&mut self) {
        let Some(ref render_system) = self.render_system else {
            return;
        };

        let now = Instant::now();
        let dt_ms = match self.last_frame_time {
            Some(last) => (now - last).as_secs_f32() * 1000.0,
            None => 1000.0 / 60.0,
        };
        self.last_frame_time = Some(now);

        self.sim.tick(dt_ms);
        self.ocean.update(dt_ms / 1000.0);

        let projection = Mat4::perspective_rh(
            self.render_config.fov_degrees.to_radians(),
            self.render_config.aspect_ratio(),
            self.render_config.near_plane_m,
            self.render_config.far_plane_m,
        );
        let view = self.sim.camera.view_matrix();
        let mut sky_rotation_view = view;
        sky_rotation_view.w_axis = Vec4::W;

        let island_offset =
            Mat4::from_translation(Vec3::new(0.0, 0.0, -self.sim.scenario().island_dist));

        let mut entities = [EntityInstance {
            model: Mat4::IDENTITY,
            visible: true,
        }; ENTITY_COUNT];
        entities[ENTITY_HULL].model = self.sim.submarine;
        entities[ENTITY_HATCH].model = self.sim.submarine;
        entities[ENTITY_LEFT_PROP].model = self.sim.submarine * self.sim.left_prop;
        entities[ENTITY_RIGHT_PROP].model = self.sim.submarine * self.sim.right_prop;
        entities[ENTITY_PLANE].model = self.sim.plane;
        entities[ENTITY_BOAT] = EntityInstance {
            model: island_offset * self.sim.boat,
            visible: self.sim.boat_visible(),
        };
        entities[ENTITY_TORPEDO] = EntityInstance {
            model: self.sim.torpedo,
            visible: self.sim.torpedo_visible(),
        };
        entities[ENTITY_EXPLOSION] = EntityInstance {
            model: self.sim.explosion_transform(),
            visible: self.sim.explosion_visible(),
        };

        let spectrum_changed = self.ocean.consume_changed();
        let payload = FramePayload {
            projection,
            view,
            sky_rotation_view,
            camera_position: self.sim.camera.world_position(),
            sky_color: self.sim.sky_color,
            expl_intensity: self.sim.expl_intensity,
            entities,
            island_model: island_offset * self.sim.island,
            sea_bed_model: self.sim.sea_bed,
            displacement: self.ocean.displacement(),
            normals: self.ocean.normals(),
            spectrum_changed,
            patch_size: self.ocean.size(),
        };

        if let Err(e) = render_system.render(&payload, self.frame_num) {
            eprintln!("Render error: {:?}", e);
        }
        self.frame_num += 1;
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("Seastrike")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                eprintln!("Fatal: failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let render_system = self
            .island_vertices()
            .and_then(|island| Ok((island, self.sea_bed_vertices()?)))
            .and_then(|(island, sea_bed)| {
                pollster::block_on(RenderSystem::new(
                    Arc::clone(&window),
                    &OceanPatch::new(&self.geometry),
                    self.ocean.resolution(),
                    self.geometry.size,
                    &self.meshes,
                    &island,
                    &sea_bed,
                    self.atmosphere.clone(),
                    self.recording.clone(),
                ))
            });

        match render_system {
            Ok(render_system) => {
                println!("\nSeastrike is running!");
                println!("W/S A/D R/F Q/E: camera   T: torpedo   C: camera mode");
                println!("X: reset   -/=: island size   [/]: choppiness   ,/.: wind");
                println!("Press ESC to quit\n");

                self.window = Some(window);
                self.render_system = Some(render_system);
            }
            Err(e) => {
                eprintln!("Fatal: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(code),
                        repeat,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape {
                    event_loop.exit();
                    return;
                }
                self.handle_key(code, state == ElementState::Pressed, repeat);
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();

                // recording runs for a fixed frame count, then exits
                if let Some(ref config) = self.recording {
                    if self.frame_num >= config.total_frames() {
                        println!("Recording complete: {} frames", self.frame_num);
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }
}

fn main() {
    let args = Args::parse();

    println!("Seastrike - submarine scene with a spectral ocean");
    println!("Initializing systems...");

    match App::new(&args) {
        Ok(mut app) => {
            let event_loop = match EventLoop::new() {
                Ok(event_loop) => event_loop,
                Err(e) => {
                    eprintln!("Fatal: failed to create event loop: {}", e);
                    std::process::exit(1);
                }
            };
            let _ = event_loop.run_app(&mut app);
        }
        Err(e) => {
            eprintln!("Fatal: {}", e);
            std::process::exit(1);
        }
    }
}
