//! Player movement and jump arbitration.
//!
//! # Fixed step
//!
//! 1. Ground check: grounded refills coyote time, airborne decays it
//! 2. Jump: fires iff the jump buffer and the coyote window are both open;
//!    firing clears both
//! 3. Horizontal velocity from the latest processed input
//! 4. Running state, reported on change only
//!
//! Facing is derived from input edges (see [`PlayerController::handle_input`]).
//!
//! # Per frame
//!
//! The jump buffer and the reversed-controls timer decay on scaled frame time.

use glam::Vec2;
use lilt::{Countdown, FrameTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collision::ShapeCast;
use crate::config::{DeathEffectsConfig, PlayerConfig};
use crate::entity::Body;
use crate::events::{Effects, Event};
use crate::input::InputEvent;

use super::ground::{GroundProbe, GroundSample, GroundSensor};

/// Inputs closer than this are treated as unchanged.
const INPUT_EPSILON: f32 = 1e-6;

/// Inputs smaller than this leave the facing alone.
const FACING_DEADZONE: f32 = 1e-3;

/// Which way the sprite faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Unmirrored.
    #[default]
    Right,
    /// Mirrored.
    Left,
}

/// Grounded flag and the coyote window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundState {
    /// Standing on ground this step.
    pub is_grounded: bool,
    /// Remaining coyote time. Never negative.
    pub coyote: Countdown,
}

/// A remembered jump press.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JumpRequest {
    /// Remaining buffer time. Never negative.
    pub buffer: Countdown,
}

/// Per-player movement state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerController {
    config: PlayerConfig,
    sensor: GroundSensor,
    ground: GroundState,
    jump: JumpRequest,
    input_x: f32,
    facing: Facing,
    running: bool,
    reversed: bool,
    reverse_timer: Countdown,
}

impl PlayerController {
    /// Builds a controller; the probe comes from `config.probe`.
    #[must_use]
    pub fn new(config: PlayerConfig) -> Self {
        let sensor = GroundSensor::new(config.probe.map(GroundProbe::from));
        Self {
            config,
            sensor,
            ground: GroundState::default(),
            jump: JumpRequest::default(),
            input_x: 0.0,
            facing: Facing::Right,
            running: false,
            reversed: false,
            reverse_timer: Countdown::idle(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The configuration this controller was built with.
    #[must_use]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Grounded flag and coyote window.
    #[must_use]
    pub fn ground(&self) -> GroundState {
        self.ground
    }

    /// Pending jump request.
    #[must_use]
    pub fn jump(&self) -> JumpRequest {
        self.jump
    }

    /// Processed horizontal input (already sign-inverted while reversed).
    #[must_use]
    pub fn input_x(&self) -> f32 {
        self.input_x
    }

    /// Current sprite facing.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Current running state.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether controls are reversed.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Death effects carried by this player, if any.
    #[must_use]
    pub fn death_effects(&self) -> Option<&DeathEffectsConfig> {
        self.config.death_effects.as_ref()
    }

    // =========================================================================
    // Status effects
    // =========================================================================

    /// Reverses horizontal controls for `duration` seconds of scaled time.
    ///
    /// A non-positive duration reverses until [`clear_reverse`](Self::clear_reverse).
    /// Only move edges processed afterwards are affected.
    pub fn apply_reverse(&mut self, duration: f32) {
        self.reversed = true;
        self.reverse_timer.set(duration);
    }

    /// Restores normal controls immediately.
    pub fn clear_reverse(&mut self) {
        self.reversed = false;
        self.reverse_timer.clear();
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Consumes one decoded input edge.
    pub fn handle_input(&mut self, event: InputEvent, fx: &mut Effects<'_>) {
        match event {
            InputEvent::Move(raw) => self.set_input_x(raw, fx),
            InputEvent::MoveCanceled => self.set_input_x(0.0, fx),
            InputEvent::JumpPressed => self.jump.buffer.set(self.config.jump_buffer_time),
        }
    }

    fn set_input_x(&mut self, raw: f32, fx: &mut Effects<'_>) {
        let value = if self.reversed { -raw } else { raw };
        if (value - self.input_x).abs() <= INPUT_EPSILON {
            return;
        }
        self.input_x = value;

        if value.abs() > FACING_DEADZONE {
            let facing = if value < 0.0 { Facing::Left } else { Facing::Right };
            if facing != self.facing {
                self.facing = facing;
                fx.emit(Event::FacingChanged { facing });
            }
        }
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Runs one fixed step against `body`, located at `position`.
    pub fn fixed_update<W: ShapeCast + ?Sized>(
        &mut self,
        dt: f32,
        body: &mut Body,
        position: Vec2,
        world: &W,
        fx: &mut Effects<'_>,
    ) -> GroundSample {
        let sample = self.update_ground(dt, position, world, fx);
        self.try_jump(body, fx);

        body.velocity.x = self.input_x * self.config.move_speed;

        let running = body.velocity.x.abs() > self.config.footstep_threshold;
        if running != self.running {
            self.running = running;
            fx.emit(Event::RunningChanged { running });
        }
        sample
    }

    fn update_ground<W: ShapeCast + ?Sized>(
        &mut self,
        dt: f32,
        position: Vec2,
        world: &W,
        fx: &mut Effects<'_>,
    ) -> GroundSample {
        let sample = self.sensor.sense(world, position, fx.source());
        self.ground.is_grounded = sample.grounded;
        if sample.grounded {
            self.ground.coyote.set(self.config.coyote_time);
        } else {
            self.ground.coyote.tick(dt);
        }
        if sample.landed {
            fx.play(self.config.land_clip.as_ref(), self.config.land_volume);
            fx.emit(Event::Landed);
        }
        sample
    }

    fn try_jump(&mut self, body: &mut Body, fx: &mut Effects<'_>) {
        if !(self.jump.buffer.is_running() && self.ground.coyote.is_running()) {
            return;
        }
        body.velocity.y = self.config.jump_force;
        self.jump.buffer.clear();
        self.ground.coyote.clear();
        fx.play(self.config.jump_clip.as_ref(), self.config.jump_volume);
        fx.emit(Event::JumpPerformed);
        debug!(entity = %fx.source(), "jump");
    }

    /// Per-frame bookkeeping on scaled time.
    pub fn frame_update(&mut self, frame: FrameTime) {
        if self.reverse_timer.tick(frame.scaled) {
            self.reversed = false;
        }
        self.jump.buffer.tick(frame.scaled);
    }
}
