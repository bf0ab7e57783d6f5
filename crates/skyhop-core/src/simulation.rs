//! The simulation: owns the scene, every behavior and both clocks.
//!
//! Each presentation frame ([`Simulation::advance`]) runs in three stages:
//!
//! 1. **FRAME**: per-frame sequences (spike motion, death and portal
//!    sequences, box moves, input timers) advance by the time that passed
//!    since the previous frame, scaled and unscaled
//! 2. **INPUT**: queued input edges reach their player controllers
//! 3. **FIXED**: zero or more fixed steps, paid for by the scaled frame time
//!    accumulated so far (at most `max_substeps`; further backlog is dropped)
//!
//! A sequence started by a contact during stage 3 first advances on the
//! next frame, so no sequence is ever credited with time from before it
//! began.
//!
//! A fixed step ([`Simulation::step`]) moves platforms and their riders,
//! runs the player controllers, integrates dynamic bodies, then detects
//! contacts and dispatches them to the touched entity's behavior.
//!
//! # Determinism
//!
//! Entities, behaviors and contacts are all kept in ordered maps and sets,
//! and every stage visits them in ID order. Two simulations built the same
//! way and fed the same inputs and frame deltas produce identical events.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use skyhop_core::collision::Layers;
//! use skyhop_core::config::{PlayerConfig, SimulationConfig};
//! use skyhop_core::input::InputEvent;
//! use skyhop_core::services::Services;
//! use skyhop_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimulationConfig::default(), Services::new()).unwrap();
//! sim.spawn_solid(Vec2::ZERO, Vec2::new(20.0, 0.5), Layers::GROUND);
//! let player = sim
//!     .spawn_player(Vec2::new(0.0, 1.0), PlayerConfig::default())
//!     .unwrap();
//!
//! sim.push_input(player, InputEvent::Move(1.0));
//! for _ in 0..60 {
//!     sim.advance(1.0 / 60.0);
//! }
//!
//! assert_eq!(sim.tick(), 60);
//! assert!(sim.scene().position(player).unwrap().x > 5.0);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use glam::Vec2;
use lilt::FrameTime;
use tracing::{debug, trace, warn};

use crate::collision::{Collider, Contact, ContactKind, Layers};
use crate::config::{
    DeathFloorConfig, MovingBoxConfig, MovingPlatformConfig, PlatformTrapConfig, PlayerConfig,
    PortalConfig, SimulationConfig, SpikesConfig,
};
use crate::entity::{Body, BodyKind, Entity, EntityId, EntityKind};
use crate::error::{ConfigError, SceneError};
use crate::events::{Effects, Event, EventEnvelope, EventLog};
use crate::hazard::{DeathFloor, MovingBox, Spikes, Victim};
use crate::input::{InputEvent, InputQueue};
use crate::level::{Archetype, EntitySpec, LevelSpec};
use crate::motion::{CarryMode, PassengerTable, Platform};
use crate::player::PlayerController;
use crate::portal::LevelPortal;
use crate::scene::Scene;
use crate::services::Services;

// =============================================================================
// Behavior
// =============================================================================

/// The gameplay logic attached to an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// A player character.
    Player(PlayerController),
    /// A moving platform or platform trap.
    Platform(Platform),
    /// Pop-up spikes.
    Spikes(Spikes),
    /// A zone that raises spikes when a player enters it.
    SpikeZone {
        /// The spikes this zone raises.
        spikes: EntityId,
    },
    /// A kill volume.
    DeathFloor(DeathFloor),
    /// A moving-box trap.
    MovingBox(MovingBox),
    /// The level exit.
    Portal(LevelPortal),
}

// =============================================================================
// Simulation
// =============================================================================

/// The gameplay simulation.
///
/// `Simulation` manages:
/// - The [`Scene`] of entities and their transforms
/// - One [`Behavior`] per scripted entity
/// - The [`PassengerTable`] of platform riders
/// - The fixed-step accumulator, time scale and pause flag
/// - The [`EventLog`] and injected [`Services`]
///
/// # Clocks
///
/// Fixed steps are funded by scaled time, so pausing (time scale zero)
/// freezes physics, platforms and every scaled timer. Death sequences and
/// the portal shrink run on unscaled time and finish while paused.
pub struct Simulation {
    config: SimulationConfig,
    scene: Scene,
    behaviors: BTreeMap<EntityId, Behavior>,
    passengers: PassengerTable,
    services: Services,
    events: EventLog,
    /// Rider/other pairs touching after the last fixed step.
    contacts: BTreeSet<(EntityId, EntityId)>,
    /// Host-supplied contacts delivered with the next fixed step.
    injected: Vec<Contact>,
    input: InputQueue,
    accumulator: f32,
    tick: u64,
    time_scale: f32,
    paused: bool,
    names: BTreeMap<String, EntityId>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("scene", &format!("[{} entities]", self.scene.len()))
            .field("behaviors", &format!("[{} behaviors]", self.behaviors.len()))
            .field("passengers", &self.passengers)
            .field("services", &self.services)
            .field("tick", &self.tick)
            .field("time_scale", &self.time_scale)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `config` is out of range.
    pub fn new(config: SimulationConfig, services: Services) -> Result<Self, ConfigError> {
        config.validate()?;
        if !services.has_progression() {
            warn!("no progression service; deaths and completion are not reported");
        }
        Ok(Self {
            config,
            scene: Scene::new(),
            behaviors: BTreeMap::new(),
            passengers: PassengerTable::new(),
            services,
            events: EventLog::new(),
            contacts: BTreeSet::new(),
            injected: Vec::new(),
            input: InputQueue::new(),
            accumulator: 0.0,
            tick: 0,
            time_scale: 1.0,
            paused: false,
            names: BTreeMap::new(),
        })
    }

    /// Builds a simulation from a level description.
    ///
    /// Spike zones are spawned after every other entity so they can refer
    /// to spikes declared later in the file.
    ///
    /// # Errors
    ///
    /// Returns whatever [`LevelSpec::validate`] reports.
    pub fn from_level(level: &LevelSpec, services: Services) -> Result<Self, ConfigError> {
        level.validate()?;
        let mut sim = Self::new(level.simulation, services)?;

        for entity in &level.entities {
            if !matches!(entity.archetype, Archetype::SpikeZone { .. }) {
                let id = sim.spawn_spec(entity)?;
                sim.names.insert(entity.name.clone(), id);
            }
        }
        for entity in &level.entities {
            if let Archetype::SpikeZone {
                spikes,
                half_extents,
            } = &entity.archetype
            {
                let target =
                    sim.entity_named(spikes)
                        .ok_or_else(|| ConfigError::UnknownReference {
                            from: entity.name.clone(),
                            to: spikes.clone(),
                        })?;
                let id = sim.spawn_spike_zone(entity.position, *half_extents, target)?;
                sim.names.insert(entity.name.clone(), id);
            }
        }

        debug!(entities = sim.scene.len(), "level built");
        Ok(sim)
    }

    fn spawn_spec(&mut self, entity: &EntitySpec) -> Result<EntityId, ConfigError> {
        let position = entity.position;
        match &entity.archetype {
            Archetype::Player { config } => self.spawn_player(position, config.clone()),
            Archetype::Solid {
                half_extents,
                layer,
            } => Ok(self.spawn_solid(position, *half_extents, *layer)),
            Archetype::MovingPlatform {
                config,
                half_extents,
            } => self.spawn_moving_platform(&entity.name, position, *half_extents, config),
            Archetype::PlatformTrap {
                config,
                half_extents,
            } => self.spawn_platform_trap(&entity.name, position, *half_extents, config),
            Archetype::Spikes {
                config,
                half_extents,
            } => self.spawn_spikes(position, *half_extents, config.clone()),
            Archetype::DeathFloor {
                config,
                half_extents,
            } => self.spawn_death_floor(position, *half_extents, config.clone()),
            Archetype::MovingBox {
                config,
                half_extents,
            } => self.spawn_moving_box(position, *half_extents, *config),
            Archetype::Portal {
                config,
                half_extents,
            } => self.spawn_portal(position, *half_extents, config.clone()),
            Archetype::SpikeZone { .. } => Err(ConfigError::UnknownReference {
                from: entity.name.clone(),
                to: entity.archetype.label().to_string(),
            }),
        }
    }

    // =========================================================================
    // Spawning
    // =========================================================================

    /// Spawns a player with a dynamic body.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for out-of-range settings.
    pub fn spawn_player(
        &mut self,
        position: Vec2,
        config: PlayerConfig,
    ) -> Result<EntityId, ConfigError> {
        config.validate()?;
        let collider = Collider::solid(config.half_extents, Layers::PLAYER);
        let id = self.scene.spawn_with(EntityKind::Player, position, |e| {
            e.with_body(Body::dynamic()).with_collider(collider)
        });
        self.behaviors
            .insert(id, Behavior::Player(PlayerController::new(config)));
        Ok(id)
    }

    /// Spawns static geometry.
    pub fn spawn_solid(&mut self, position: Vec2, half_extents: Vec2, layer: Layers) -> EntityId {
        self.scene.spawn_with(EntityKind::Solid, position, |e| {
            e.with_collider(Collider::solid(half_extents, layer))
        })
    }

    /// Spawns a continuously moving platform.
    ///
    /// A platform missing an endpoint is spawned at `position` and never
    /// moves; the problem is logged rather than returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a negative speed or dwell.
    pub fn spawn_moving_platform(
        &mut self,
        name: &str,
        position: Vec2,
        half_extents: Vec2,
        config: &MovingPlatformConfig,
    ) -> Result<EntityId, ConfigError> {
        let platform = or_disabled(Platform::moving(name, config), config.carry)?;
        Ok(self.spawn_platform(platform, position, half_extents))
    }

    /// Spawns a platform trap.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a negative speed or dwell.
    pub fn spawn_platform_trap(
        &mut self,
        name: &str,
        position: Vec2,
        half_extents: Vec2,
        config: &PlatformTrapConfig,
    ) -> Result<EntityId, ConfigError> {
        let platform = or_disabled(Platform::trap(name, config), config.carry)?;
        Ok(self.spawn_platform(platform, position, half_extents))
    }

    fn spawn_platform(&mut self, platform: Platform, position: Vec2, half_extents: Vec2) -> EntityId {
        let position = platform.initial_position().unwrap_or(position);
        let id = self.scene.spawn_with(EntityKind::Platform, position, |e| {
            e.with_body(Body::kinematic())
                .with_collider(Collider::solid(half_extents, Layers::PLATFORM))
        });
        self.behaviors.insert(id, Behavior::Platform(platform));
        id
    }

    /// Spawns lowered spikes.
    ///
    /// The collider is a trigger when the spikes damage on trigger contacts
    /// and solid otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative durations.
    pub fn spawn_spikes(
        &mut self,
        position: Vec2,
        half_extents: Vec2,
        config: SpikesConfig,
    ) -> Result<EntityId, ConfigError> {
        let collider = if config.damage_on_trigger {
            Collider::trigger(half_extents, Layers::HAZARD)
        } else {
            Collider::solid(half_extents, Layers::HAZARD)
        };
        let spikes = Spikes::new(config, position)?;
        let id = self.scene.spawn_with(EntityKind::Hazard, position, |e| {
            e.with_body(Body::kinematic()).with_collider(collider)
        });
        self.behaviors.insert(id, Behavior::Spikes(spikes));
        Ok(id)
    }

    /// Spawns a zone that raises `spikes` when a player enters it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownReference`] if `spikes` is not a spikes
    /// entity.
    pub fn spawn_spike_zone(
        &mut self,
        position: Vec2,
        half_extents: Vec2,
        spikes: EntityId,
    ) -> Result<EntityId, ConfigError> {
        if !matches!(self.behaviors.get(&spikes), Some(Behavior::Spikes(_))) {
            return Err(ConfigError::UnknownReference {
                from: "spike zone".to_string(),
                to: spikes.to_string(),
            });
        }
        let id = self.scene.spawn_with(EntityKind::Zone, position, |e| {
            e.with_collider(Collider::trigger(half_extents, Layers::TRIGGER))
        });
        self.behaviors.insert(id, Behavior::SpikeZone { spikes });
        Ok(id)
    }

    /// Spawns a kill volume.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a negative death delay.
    pub fn spawn_death_floor(
        &mut self,
        position: Vec2,
        half_extents: Vec2,
        config: DeathFloorConfig,
    ) -> Result<EntityId, ConfigError> {
        let floor = DeathFloor::new(config)?;
        let id = self.scene.spawn_with(EntityKind::Zone, position, |e| {
            e.with_collider(Collider::trigger(half_extents, Layers::HAZARD))
        });
        self.behaviors.insert(id, Behavior::DeathFloor(floor));
        Ok(id)
    }

    /// Spawns a moving-box trap.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative speeds or delays.
    pub fn spawn_moving_box(
        &mut self,
        position: Vec2,
        half_extents: Vec2,
        config: MovingBoxConfig,
    ) -> Result<EntityId, ConfigError> {
        let trap = MovingBox::new(config, position, Vec2::ONE)?;
        let id = self.scene.spawn_with(EntityKind::Hazard, position, |e| {
            e.with_body(Body::kinematic())
                .with_collider(Collider::trigger(half_extents, Layers::HAZARD))
        });
        self.behaviors.insert(id, Behavior::MovingBox(trap));
        Ok(id)
    }

    /// Spawns the level exit.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative durations.
    pub fn spawn_portal(
        &mut self,
        position: Vec2,
        half_extents: Vec2,
        config: PortalConfig,
    ) -> Result<EntityId, ConfigError> {
        let portal = LevelPortal::new(config)?;
        let id = self.scene.spawn_with(EntityKind::Portal, position, |e| {
            e.with_collider(Collider::trigger(half_extents, Layers::TRIGGER))
        });
        self.behaviors.insert(id, Behavior::Portal(portal));
        Ok(id)
    }

    /// Removes an entity, its behavior and any ride it is part of.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.release_entity(id);
        self.behaviors.remove(&id);
        self.names.retain(|_, named| *named != id);
        self.scene.despawn(id)
    }

    /// Deactivates an entity. Riders of a deactivated platform are released.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownEntity`] if `id` does not exist.
    pub fn deactivate(&mut self, id: EntityId) -> Result<(), SceneError> {
        if self.scene.get(id).is_none() {
            return Err(SceneError::UnknownEntity(id));
        }
        self.release_entity(id);
        self.scene.deactivate(id)
    }

    /// Reactivates an entity. Reactivated spikes re-arm their kill.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownEntity`] if `id` does not exist.
    pub fn activate(&mut self, id: EntityId) -> Result<(), SceneError> {
        self.scene.activate(id)?;
        if let Some(Behavior::Spikes(spikes)) = self.behaviors.get_mut(&id) {
            spikes.reset();
        }
        Ok(())
    }

    fn release_entity(&mut self, id: EntityId) {
        for rider in self.passengers.release_platform(&mut self.scene, id) {
            self.events.push(id, Event::RiderDetached { rider });
        }
        self.release_ride(id);
        self.contacts
            .retain(|&(rider, other)| rider != id && other != id);
    }

    fn release_ride(&mut self, rider: EntityId) {
        if let Some(platform) = self.passengers.release_rider(&mut self.scene, rider) {
            self.events.push(platform, Event::RiderDetached { rider });
        }
    }

    // =========================================================================
    // Host controls
    // =========================================================================

    /// Queues an input edge for `player`, delivered at the next frame.
    pub fn push_input(&mut self, player: EntityId, event: InputEvent) {
        self.input.push(player, event);
    }

    /// Queues a contact edge, dispatched after the next fixed step's own
    /// contacts.
    pub fn inject_contact(&mut self, contact: Contact) {
        self.injected.push(contact);
    }

    /// Raises spikes. Returns `false` if `id` is not a spikes entity.
    pub fn raise_spikes(&mut self, id: EntityId) -> bool {
        let Some(Behavior::Spikes(spikes)) = self.behaviors.get_mut(&id) else {
            return false;
        };
        let mut fx = Effects::new(id, &self.services, &mut self.events);
        spikes.raise(&self.scene, &mut fx);
        true
    }

    /// Lowers spikes. Returns `false` if `id` is not a spikes entity.
    pub fn lower_spikes(&mut self, id: EntityId) -> bool {
        let Some(Behavior::Spikes(spikes)) = self.behaviors.get_mut(&id) else {
            return false;
        };
        let mut fx = Effects::new(id, &self.services, &mut self.events);
        spikes.lower(&self.scene, &mut fx);
        true
    }

    /// Re-arms a reusable hazard. Returns whether the reset took effect.
    pub fn reset_hazard(&mut self, id: EntityId) -> bool {
        match self.behaviors.get_mut(&id) {
            Some(Behavior::Spikes(spikes)) => spikes.reset(),
            _ => false,
        }
    }

    /// Starts one leg of a triggered platform trap.
    pub fn start_platform_once(&mut self, id: EntityId) -> bool {
        match self.behaviors.get_mut(&id) {
            Some(Behavior::Platform(platform)) => platform.start_once(),
            _ => false,
        }
    }

    /// Reverses a player's horizontal controls for `duration` seconds.
    pub fn apply_reverse(&mut self, player: EntityId, duration: f32) -> bool {
        match self.behaviors.get_mut(&player) {
            Some(Behavior::Player(controller)) => {
                controller.apply_reverse(duration);
                true
            }
            _ => false,
        }
    }

    /// Restores a player's normal controls.
    pub fn clear_reverse(&mut self, player: EntityId) -> bool {
        match self.behaviors.get_mut(&player) {
            Some(Behavior::Player(controller)) => {
                controller.clear_reverse();
                true
            }
            _ => false,
        }
    }

    /// Pauses or resumes scaled time.
    pub fn set_paused(&mut self, paused: bool) {
        if paused != self.paused {
            debug!(paused, "pause changed");
        }
        self.paused = paused;
    }

    /// Sets the scaled-time multiplier. Negative values count as zero.
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale.max(0.0);
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advances one presentation frame of `real_dt` seconds.
    ///
    /// Returns the number of fixed steps that ran.
    pub fn advance(&mut self, real_dt: f32) -> u32 {
        let frame = FrameTime::new(real_dt, self.effective_time_scale());
        self.frame_update(frame);
        self.process_input();
        self.run_fixed_steps(frame.scaled)
    }

    fn process_input(&mut self) {
        for (player, event) in self.input.drain() {
            let Some(Behavior::Player(controller)) = self.behaviors.get_mut(&player) else {
                trace!(entity = %player, ?event, "input for unknown player dropped");
                continue;
            };
            let mut fx = Effects::new(player, &self.services, &mut self.events);
            controller.handle_input(event, &mut fx);
        }
    }

    fn run_fixed_steps(&mut self, scaled_dt: f32) -> u32 {
        let fixed_dt = self.config.fixed_dt;
        self.accumulator += scaled_dt;
        let mut steps = 0;
        while self.accumulator >= fixed_dt && steps < self.config.max_substeps {
            self.step();
            self.accumulator -= fixed_dt;
            steps += 1;
        }
        if self.accumulator >= fixed_dt {
            debug!(backlog = self.accumulator, "dropping fixed-step backlog");
            self.accumulator = 0.0;
        }
        steps
    }

    /// Runs exactly one fixed step, regardless of the accumulator.
    pub fn step(&mut self) {
        let dt = self.config.fixed_dt;
        self.events.set_tick(self.tick);

        self.step_platforms(dt);
        self.step_players(dt);
        self.integrate(dt);
        for contact in self.detect_contacts() {
            self.dispatch(contact);
        }

        self.tick += 1;
    }

    fn step_platforms(&mut self, dt: f32) {
        for (id, behavior) in &mut self.behaviors {
            let Behavior::Platform(platform) = behavior else {
                continue;
            };
            if !self.scene.is_active(*id) {
                continue;
            }
            let mut fx = Effects::new(*id, &self.services, &mut self.events);
            platform.fixed_update(dt, &mut self.scene, &mut self.passengers, &mut fx);
        }
    }

    fn step_players(&mut self, dt: f32) {
        for (id, behavior) in &mut self.behaviors {
            let Behavior::Player(controller) = behavior else {
                continue;
            };
            let Some(entity) = self.scene.get(*id).filter(|e| e.is_active()) else {
                continue;
            };
            let position = entity.position();
            let owned = entity.body;
            let mut body = owned.unwrap_or_default();
            if !body.simulated {
                continue;
            }

            // A player without a body still ticks its timers, but probes an
            // empty world and so stays airborne.
            let empty;
            let world = if owned.is_some() {
                &self.scene
            } else {
                empty = Scene::new();
                &empty
            };
            let mut fx = Effects::new(*id, &self.services, &mut self.events);
            controller.fixed_update(dt, &mut body, position, world, &mut fx);

            if owned.is_some() {
                if let Some(entity) = self.scene.get_mut(*id) {
                    entity.body = Some(body);
                }
            }
        }
    }

    /// Applies gravity and velocity to simulated dynamic bodies.
    ///
    /// A falling body whose feet were in the upper half of a solid collider
    /// and would pass below its top lands on that top instead.
    fn integrate(&mut self, dt: f32) {
        let gravity = self.config.gravity;
        let falling: Vec<EntityId> = self
            .scene
            .entities_sorted()
            .filter(|e| {
                e.is_active()
                    && e.body
                        .is_some_and(|b| b.simulated && b.kind == BodyKind::Dynamic)
            })
            .map(Entity::id)
            .collect();

        for id in falling {
            let Some(entity) = self.scene.get(id) else {
                continue;
            };
            let Some(mut body) = entity.body else {
                continue;
            };
            let position = entity.position();
            body.velocity += gravity * dt;
            let mut delta = body.velocity * dt;

            if let Some(collider) = entity.collider {
                if let Some(top) = self.landing_surface(id, &collider, position, delta) {
                    delta.y = top - collider.aabb_at(position).bottom();
                    body.velocity.y = 0.0;
                }
            }

            if let Some(entity) = self.scene.get_mut(id) {
                entity.body = Some(body);
            }
            if delta != Vec2::ZERO {
                if let Err(err) = self.scene.translate(id, delta) {
                    warn!(entity = %id, %err, "integration lost its entity");
                }
            }
        }
    }

    fn landing_surface(
        &self,
        id: EntityId,
        collider: &Collider,
        position: Vec2,
        delta: Vec2,
    ) -> Option<f32> {
        if delta.y >= 0.0 {
            return None;
        }
        let before = collider.aabb_at(position);
        let after = collider.aabb_at(position + delta);
        self.scene
            .entities_sorted()
            .filter(|other| other.id() != id && other.is_active() && !other.kind().is_rider())
            .filter_map(|other| {
                let solid = other.collider.filter(|c| !c.is_trigger)?;
                let surface = solid.aabb_at(other.position());
                let top = surface.top();
                let crosses = before.bottom() >= surface.center().y && after.bottom() < top;
                let above = after.max.x > surface.min.x && after.min.x < surface.max.x;
                (crosses && above).then_some(top)
            })
            .reduce(f32::max)
    }

    /// Diffs this step's overlaps against the last step's.
    ///
    /// Ended edges come before began edges, each in (rider, other) order,
    /// followed by injected contacts. Riders whose body is suspended touch
    /// nothing.
    fn detect_contacts(&mut self) -> Vec<Contact> {
        let skin = self.config.contact_skin;
        let mut touching: BTreeMap<(EntityId, EntityId), ContactKind> = BTreeMap::new();

        for rider in self.scene.entities_sorted() {
            if !rider.is_active()
                || !rider.kind().is_rider()
                || rider.body.is_some_and(|b| !b.simulated)
            {
                continue;
            }
            let Some(rider_collider) = rider.collider else {
                continue;
            };
            let rider_box = rider_collider.aabb_at(rider.position());

            for other in self.scene.entities_sorted() {
                if other.id() == rider.id() || !other.is_active() || other.kind().is_rider() {
                    continue;
                }
                let Some(other_collider) = other.collider else {
                    continue;
                };
                if rider_box.overlaps(&other_collider.aabb_at(other.position()), skin) {
                    touching.insert(
                        (rider.id(), other.id()),
                        ContactKind::between(&rider_collider, &other_collider),
                    );
                }
            }
        }

        let mut contacts: Vec<Contact> = self
            .contacts
            .iter()
            .filter(|&pair| !touching.contains_key(pair))
            .map(|&(rider, other)| Contact::Ended { rider, other })
            .collect();
        for (&(rider, other), &kind) in &touching {
            if !self.contacts.contains(&(rider, other)) {
                contacts.push(Contact::Began { rider, other, kind });
            }
        }
        contacts.append(&mut self.injected);
        self.contacts = touching.into_keys().collect();
        contacts
    }

    fn dispatch(&mut self, contact: Contact) {
        match contact {
            Contact::Began { rider, other, kind } => self.contact_began(rider, other, kind),
            Contact::Ended { rider, other } => {
                if let Some(Behavior::Platform(platform)) = self.behaviors.get_mut(&other) {
                    let mut fx = Effects::new(other, &self.services, &mut self.events);
                    platform.on_rider_left(rider, &mut self.scene, &mut self.passengers, &mut fx);
                }
            }
        }
    }

    fn contact_began(&mut self, rider: EntityId, other: EntityId, kind: ContactKind) {
        let zone_target = match self.behaviors.get(&other) {
            Some(Behavior::SpikeZone { spikes }) => Some(*spikes),
            _ => None,
        };
        if let Some(spikes) = zone_target {
            if let Some(Behavior::Spikes(target)) = self.behaviors.get_mut(&spikes) {
                let mut fx = Effects::new(spikes, &self.services, &mut self.events);
                target.on_zone_entered(&self.scene, &mut fx);
            }
            return;
        }

        let death_effects = match self.behaviors.get(&rider) {
            Some(Behavior::Player(controller)) => controller.death_effects().cloned(),
            _ => None,
        };
        let victim = Victim {
            id: rider,
            death_effects: death_effects.as_ref(),
        };

        let captured = {
            let Some(behavior) = self.behaviors.get_mut(&other) else {
                return;
            };
            let mut fx = Effects::new(other, &self.services, &mut self.events);
            match behavior {
                Behavior::Platform(platform) => {
                    platform.on_rider_entered(rider, &mut self.scene, &mut self.passengers, &mut fx);
                    false
                }
                Behavior::Spikes(spikes) => spikes.on_contact(victim, kind, &mut self.scene, &mut fx),
                Behavior::DeathFloor(floor) => {
                    floor.on_contact(victim, kind, &mut self.scene, &mut fx)
                }
                Behavior::MovingBox(trap) => {
                    trap.on_contact(rider, &mut self.scene, &mut fx);
                    false
                }
                Behavior::Portal(portal) => portal.on_contact(rider, &mut self.scene, &mut fx),
                Behavior::Player(_) | Behavior::SpikeZone { .. } => false,
            }
        };

        if captured {
            self.release_ride(rider);
        }
    }

    fn frame_update(&mut self, frame: FrameTime) {
        self.events.set_tick(self.tick);
        for (id, behavior) in &mut self.behaviors {
            if !self.scene.is_active(*id) {
                continue;
            }
            let mut fx = Effects::new(*id, &self.services, &mut self.events);
            match behavior {
                Behavior::Player(controller) => controller.frame_update(frame),
                Behavior::Spikes(spikes) => spikes.frame_update(frame, &mut self.scene, &mut fx),
                Behavior::DeathFloor(floor) => floor.frame_update(frame, &mut self.scene, &mut fx),
                Behavior::MovingBox(trap) => trap.frame_update(frame, &mut self.scene, &mut fx),
                Behavior::Portal(portal) => portal.frame_update(frame, &mut self.scene, &mut fx),
                Behavior::Platform(_) | Behavior::SpikeZone { .. } => {}
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Stepping settings.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Fixed steps run so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access for hosts that move entities directly.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Behavior attached to `id`.
    #[must_use]
    pub fn behavior(&self, id: EntityId) -> Option<&Behavior> {
        self.behaviors.get(&id)
    }

    /// Controller of the player `id`.
    #[must_use]
    pub fn player(&self, id: EntityId) -> Option<&PlayerController> {
        match self.behaviors.get(&id) {
            Some(Behavior::Player(controller)) => Some(controller),
            _ => None,
        }
    }

    /// Current platform rides.
    #[must_use]
    pub fn passengers(&self) -> &PassengerTable {
        &self.passengers
    }

    /// Entity spawned for a level name.
    #[must_use]
    pub fn entity_named(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    /// Whether scaled time is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Scaled-time multiplier, ignoring pause.
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    fn effective_time_scale(&self) -> f32 {
        if self.paused {
            0.0
        } else {
            self.time_scale
        }
    }

    /// Events recorded since the last [`take_events`](Self::take_events).
    #[must_use]
    pub fn events(&self) -> &[EventEnvelope] {
        self.events.events()
    }

    /// Drains the event log.
    pub fn take_events(&mut self) -> Vec<EventEnvelope> {
        self.events.take_events()
    }
}

/// Keeps a platform whose only problem is a missing endpoint, disabled.
fn or_disabled(
    built: Result<Platform, ConfigError>,
    carry: CarryMode,
) -> Result<Platform, ConfigError> {
    match built {
        Err(err @ ConfigError::MissingEndpoint { .. }) => {
            warn!(%err, "platform disabled");
            Ok(Platform::disabled(carry))
        }
        other => other,
    }
}
