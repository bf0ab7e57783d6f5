//! Already-decoded input edges.
//!
//! Device decoding happens outside the crate. An adapter pushes the resulting
//! axis values and edges once per frame; the simulation drains them before
//! stepping.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// One input edge for a player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    /// The horizontal move axis changed to this raw value.
    Move(f32),
    /// The move action was released.
    MoveCanceled,
    /// Jump was pressed this frame.
    JumpPressed,
}

/// FIFO of input edges addressed to players.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    pending: VecDeque<(EntityId, InputEvent)>,
}

impl InputQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an edge for `player`.
    pub fn push(&mut self, player: EntityId, event: InputEvent) {
        self.pending.push_back((player, event));
    }

    /// Removes and returns every queued edge in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = (EntityId, InputEvent)> + '_ {
        self.pending.drain(..)
    }

    /// Number of queued edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
