// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animated transition collection.
//!
//! A [`Transition`] groups the containers affected by one animated state
//! change so an external player can animate them together. The engine only
//! *collects*: timing, interpolation, and playback live outside this crate,
//! behind the [`TransitionPlayer`] trait.
//!
//! # Phase machine
//!
//! ```text
//! Created ──start()──► Started ──collect()──► Collecting ──set_ready()──► Ready
//!                         │                                                │
//!                         └───────────── set_ready() ─────────────────────┤
//!                                                                 finish() ──► Finishing
//! ```
//!
//! Collection is add-only and deduplicating; participant order is the order
//! of first collection.

use alloc::boxed::Box;
use alloc::vec::Vec;

use core::fmt;

use crate::container::ContainerId;

/// Identifies an active transition.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionId(pub(crate) u32);

impl fmt::Debug for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransitionId({})", self.0)
    }
}

/// What kind of state change a transition animates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// Containers becoming visible.
    Open,
    /// Containers becoming invisible.
    Close,
    /// Containers moving to the front.
    ToFront,
    /// Containers moving to the back.
    ToBack,
    /// Containers changing in place (bounds, mode).
    Change,
}

/// Where a transition is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    /// Created, not yet started.
    Created,
    /// Started; no participants collected yet.
    Started,
    /// At least one participant collected.
    Collecting,
    /// All participants collected; ready to play.
    Ready,
    /// Finished by the organizer.
    Finishing,
}

/// An animated state-change session collecting participating containers.
#[derive(Debug)]
pub struct Transition {
    id: TransitionId,
    kind: TransitionKind,
    phase: TransitionPhase,
    participants: Vec<ContainerId>,
}

impl Transition {
    fn new(id: TransitionId, kind: TransitionKind) -> Self {
        Self {
            id,
            kind,
            phase: TransitionPhase::Created,
            participants: Vec::new(),
        }
    }

    /// The transition's handle.
    #[must_use]
    pub fn id(&self) -> TransitionId {
        self.id
    }

    /// The kind of state change being animated.
    #[must_use]
    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    /// The current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// The collected participants, in order of first collection.
    #[must_use]
    pub fn participants(&self) -> &[ContainerId] {
        &self.participants
    }

    /// Marks the transition started.
    pub fn start(&mut self) {
        if self.phase == TransitionPhase::Created {
            self.phase = TransitionPhase::Started;
        }
    }

    /// Collects a container into the transition. Add-only; collecting the
    /// same container again is a no-op.
    pub fn collect(&mut self, container: ContainerId) {
        if self.phase == TransitionPhase::Started {
            self.phase = TransitionPhase::Collecting;
        }
        if !self.participants.contains(&container) {
            self.participants.push(container);
        }
    }

    /// Marks the participant set complete.
    pub fn set_ready(&mut self) {
        if self.phase != TransitionPhase::Finishing {
            self.phase = TransitionPhase::Ready;
        }
    }

    fn finish(&mut self) {
        self.phase = TransitionPhase::Finishing;
    }
}

/// Receives transition lifecycle notifications for playback.
///
/// All methods default to no-ops. Implementations must not call back into
/// the container tree (lock-ordering contract).
pub trait TransitionPlayer {
    /// A transition's participant set is complete.
    fn on_ready(&mut self, id: TransitionId, kind: TransitionKind, participants: &[ContainerId]) {
        _ = (id, kind, participants);
    }

    /// A transition was finished by the organizer.
    fn on_finished(&mut self, id: TransitionId) {
        _ = id;
    }
}

/// Tracks active transitions and the registered player.
#[derive(Default)]
pub struct TransitionRegistry {
    next_id: u32,
    active: Vec<Transition>,
    player: Option<Box<dyn TransitionPlayer + Send>>,
}

impl fmt::Debug for TransitionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRegistry")
            .field("next_id", &self.next_id)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl TransitionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the transition player, replacing any previous one.
    pub fn register_player(&mut self, player: Box<dyn TransitionPlayer + Send>) {
        self.player = Some(player);
    }

    /// Creates a new transition of the given kind.
    pub fn create(&mut self, kind: TransitionKind) -> TransitionId {
        let id = TransitionId(self.next_id);
        self.next_id += 1;
        self.active.push(Transition::new(id, kind));
        id
    }

    /// Resolves an active transition by handle.
    #[must_use]
    pub fn get_mut(&mut self, id: TransitionId) -> Option<&mut Transition> {
        self.active.iter_mut().find(|t| t.id == id)
    }

    /// Read-only variant of [`get_mut`](Self::get_mut).
    #[must_use]
    pub fn get(&self, id: TransitionId) -> Option<&Transition> {
        self.active.iter().find(|t| t.id == id)
    }

    /// Marks a transition's participant set complete and notifies the
    /// player.
    pub fn set_ready(&mut self, id: TransitionId) {
        let Some(transition) = self.active.iter_mut().find(|t| t.id == id) else {
            return;
        };
        transition.set_ready();
        if let Some(player) = &mut self.player {
            player.on_ready(id, transition.kind, &transition.participants);
        }
    }

    /// Finishes and removes a transition. Returns whether the handle named
    /// an active transition.
    pub fn finish(&mut self, id: TransitionId) -> bool {
        let Some(i) = self.active.iter().position(|t| t.id == id) else {
            return false;
        };
        self.active[i].finish();
        self.active.remove(i);
        if let Some(player) = &mut self.player {
            player.on_finished(id);
        }
        true
    }
}
