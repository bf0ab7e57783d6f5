//! Observable gameplay events.
//!
//! Every effect the presentation layer might care about (sounds, animation
//! triggers, particle bursts, progression calls) is also recorded as an
//! [`Event`]. The log does not drive gameplay; it exists for telemetry,
//! replays and tests, and is drained with [`EventLog::take_events`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::motion::CarryMode;
use crate::player::Facing;
use crate::services::{ClipId, RestartRoute, Services};

/// Something observable that happened during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The player touched walkable ground after being airborne.
    Landed,
    /// A jump was executed.
    JumpPerformed,
    /// The running animation state flipped.
    RunningChanged {
        /// New running state.
        running: bool,
    },
    /// The sprite facing flipped.
    FacingChanged {
        /// New facing.
        facing: Facing,
    },
    /// A mover reached the end of a leg.
    PlatformArrived {
        /// Arrival position.
        position: Vec2,
    },
    /// A rider started being carried.
    RiderAttached {
        /// The rider.
        rider: EntityId,
        /// Carrying discipline in use.
        mode: CarryMode,
    },
    /// A rider stopped being carried.
    RiderDetached {
        /// The rider.
        rider: EntityId,
    },
    /// Spikes started rising.
    SpikesRaised,
    /// Spikes started lowering.
    SpikesLowered,
    /// A hazard fired its one-shot death sequence.
    HazardTriggered {
        /// The entity that was killed.
        victim: EntityId,
    },
    /// The victim's own death effects (particles and clip) were used.
    DeathEffectsSpawned {
        /// The entity that was killed.
        victim: EntityId,
        /// Where the particles spawn.
        position: Vec2,
    },
    /// Deaths were reported to progression.
    DeathCounted {
        /// Number of deaths added.
        count: u32,
    },
    /// A level restart was requested.
    RestartRequested {
        /// Who handled the request.
        route: RestartRoute,
    },
    /// A moving box started a displacement.
    BoxMoved {
        /// Destination of the move.
        target: Vec2,
    },
    /// A moving box restored its original scale and headed home.
    BoxReturned,
    /// The portal fired (sound and activation animation).
    PortalActivated {
        /// The player entering the portal.
        player: EntityId,
    },
    /// The portal sequence ended.
    LevelCompleted {
        /// Whether a progression service received the completion.
        delivered: bool,
    },
}

/// An event stamped with the fixed tick and the entity that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Number of fixed steps completed when the event was recorded.
    pub tick: u64,
    /// Emitting entity.
    pub source: EntityId,
    /// The event.
    pub event: Event,
}

/// Append-only event record.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    tick: u64,
    events: Vec<EventEnvelope>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tick stamped on subsequent events.
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Records an event from `source`.
    pub fn push(&mut self, source: EntityId, event: Event) {
        self.events.push(EventEnvelope {
            tick: self.tick,
            source,
            event,
        });
    }

    /// Drains and returns all recorded events in recording order.
    pub fn take_events(&mut self) -> Vec<EventEnvelope> {
        std::mem::take(&mut self.events)
    }

    /// Recorded events not yet drained.
    #[must_use]
    pub fn events(&self) -> &[EventEnvelope] {
        &self.events
    }

    /// Number of events in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Outward channel handed to a component while it runs: collaborators plus
/// the event log, stamped with the running entity.
pub struct Effects<'a> {
    source: EntityId,
    services: &'a Services,
    log: &'a mut EventLog,
}

impl<'a> Effects<'a> {
    /// Creates the channel for `source`.
    pub fn new(source: EntityId, services: &'a Services, log: &'a mut EventLog) -> Self {
        Self {
            source,
            services,
            log,
        }
    }

    /// The running entity.
    #[must_use]
    pub fn source(&self) -> EntityId {
        self.source
    }

    /// Injected collaborators.
    #[must_use]
    pub fn services(&self) -> &Services {
        self.services
    }

    /// Records an event.
    pub fn emit(&mut self, event: Event) {
        self.log.push(self.source, event);
    }

    /// Plays an optional clip.
    pub fn play(&self, clip: Option<&ClipId>, volume: f32) -> bool {
        self.services.play(clip, volume)
    }
}
