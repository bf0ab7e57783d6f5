//! Test helper functions for setting up simulations and collaborators.
//!
//! This module provides recording fakes for the injected services and
//! factory functions for the scenarios the integration tests share.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use glam::Vec2;

use crate::collision::Layers;
use crate::config::{PlayerConfig, SimulationConfig, FIXED_DT};
use crate::entity::EntityId;
use crate::events::Event;
use crate::services::{Audio, ClipId, Progression, SceneLoader, Services};
use crate::simulation::Simulation;

// =============================================================================
// Recording Collaborators
// =============================================================================

/// Progression service that counts every call.
#[derive(Debug, Default)]
pub struct RecordingProgression {
    completions: AtomicU32,
    restarts: AtomicU32,
    deaths: AtomicU32,
}

impl RecordingProgression {
    /// Number of `complete_level` calls.
    pub fn completions(&self) -> u32 {
        self.completions.load(Ordering::SeqCst)
    }

    /// Number of `restart_level` calls.
    pub fn restarts(&self) -> u32 {
        self.restarts.load(Ordering::SeqCst)
    }

    /// Sum of every `add_death` count.
    pub fn deaths(&self) -> u32 {
        self.deaths.load(Ordering::SeqCst)
    }
}

impl Progression for RecordingProgression {
    fn complete_level(&self) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }

    fn restart_level(&self) {
        self.restarts.fetch_add(1, Ordering::SeqCst);
    }

    fn add_death(&self, count: u32) {
        self.deaths.fetch_add(count, Ordering::SeqCst);
    }
}

/// Audio service that remembers every clip played.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    played: Mutex<Vec<(ClipId, f32)>>,
}

impl RecordingAudio {
    /// Clips played so far, in order.
    pub fn played(&self) -> Vec<(ClipId, f32)> {
        self.played
            .lock()
            .map(|played| played.clone())
            .unwrap_or_default()
    }
}

impl Audio for RecordingAudio {
    fn play_one_shot(&self, clip: &ClipId, volume: f32) {
        if let Ok(mut played) = self.played.lock() {
            played.push((clip.clone(), volume));
        }
    }
}

/// Scene loader that counts reloads.
#[derive(Debug, Default)]
pub struct RecordingLoader {
    reloads: AtomicU32,
}

impl RecordingLoader {
    /// Number of reloads requested.
    pub fn reloads(&self) -> u32 {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl SceneLoader for RecordingLoader {
    fn reload_active_scene(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

/// The recording fakes wired into one [`Services`].
#[derive(Debug, Clone, Default)]
pub struct Recorders {
    /// Progression fake.
    pub progression: Arc<RecordingProgression>,
    /// Audio fake.
    pub audio: Arc<RecordingAudio>,
    /// Scene loader fake.
    pub loader: Arc<RecordingLoader>,
}

impl Recorders {
    /// Services backed by every recorder.
    pub fn services(&self) -> Services {
        Services::new()
            .with_progression(self.progression.clone())
            .with_audio(self.audio.clone())
            .with_scene_loader(self.loader.clone())
    }

    /// Services without progression, so restarts fall back to the loader.
    pub fn services_without_progression(&self) -> Services {
        Services::new()
            .with_audio(self.audio.clone())
            .with_scene_loader(self.loader.clone())
    }
}

// =============================================================================
// Simulation Setup
// =============================================================================

/// Installs a test-writer log subscriber. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Creates a simulation with default settings and the given services.
pub fn new_sim(services: Services) -> Simulation {
    init_tracing();
    match Simulation::new(SimulationConfig::default(), services) {
        Ok(sim) => sim,
        Err(err) => panic!("default simulation config rejected: {err}"),
    }
}

/// Sets up a wide floor with a player resting on it at the origin.
///
/// The floor's top face is at y = 0.5; the default player (half height 0.5)
/// rests with its center at y = 1.0.
///
/// # Arguments
///
/// * `sim` - The simulation to set up
///
/// # Returns
///
/// A tuple of (floor_id, player_id).
pub fn setup_floor_scenario(sim: &mut Simulation) -> (EntityId, EntityId) {
    setup_floor_scenario_with(sim, PlayerConfig::default())
}

/// Like [`setup_floor_scenario`] with a custom player config.
///
/// # Arguments
///
/// * `sim` - The simulation to set up
/// * `config` - Player settings
///
/// # Returns
///
/// A tuple of (floor_id, player_id).
pub fn setup_floor_scenario_with(
    sim: &mut Simulation,
    config: PlayerConfig,
) -> (EntityId, EntityId) {
    let floor = sim.spawn_solid(Vec2::ZERO, Vec2::new(50.0, 0.5), Layers::GROUND);
    let player = sim
        .spawn_player(Vec2::new(0.0, 1.0), config)
        .unwrap_or_else(|err| panic!("player rejected: {err}"));
    (floor, player)
}

// =============================================================================
// Driving and Inspection
// =============================================================================

/// Advances `frames` presentation frames of `dt` seconds each.
pub fn run_frames(sim: &mut Simulation, frames: usize, dt: f32) {
    for _ in 0..frames {
        sim.advance(dt);
    }
}

/// Advances `frames` frames at the fixed rate.
pub fn run_fixed_frames(sim: &mut Simulation, frames: usize) {
    run_frames(sim, frames, FIXED_DT);
}

/// Counts logged events matching `predicate`.
pub fn count_events(sim: &Simulation, predicate: impl Fn(&Event) -> bool) -> usize {
    sim.events().iter().filter(|e| predicate(&e.event)).count()
}

/// Gets an entity's position, panicking if it does not exist.
pub fn position_of(sim: &Simulation, id: EntityId) -> Vec2 {
    sim.scene()
        .position(id)
        .unwrap_or_else(|| panic!("entity {id} does not exist"))
}
