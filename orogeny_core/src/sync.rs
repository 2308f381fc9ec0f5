// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sync barrier engine.
//!
//! A *sync set* defers delivering the result of a transaction until every
//! tagged container has confirmed its pending visual commit. The flow is:
//!
//! 1. [`SyncEngine::start_sync_set`] allocates a set bound to a completion.
//! 2. The applier tags each container it is about to mutate with
//!    [`add_to_sync_set`](SyncEngine::add_to_sync_set) — strictly *before*
//!    the mutation, so the barrier's bookkeeping for a container can never
//!    race ahead of the mutation it confirms.
//! 3. The façade calls [`set_ready`](SyncEngine::set_ready) once no further
//!    containers will be added.
//! 4. As the compositor finishes each container's commit, it reports
//!    [`confirm_commit`](SyncEngine::confirm_commit) with the container's
//!    staged surface changes. Once the set is ready and fully confirmed, the
//!    merged transaction is delivered to the completion exactly once and the
//!    set is removed.
//!
//! # Deliver-or-fallback
//!
//! If the completion reports a delivery failure (the original requester is
//! gone), the merged transaction is applied locally through the
//! [`Compositor`] instead — a confirmed visual commit is never lost. The
//! bookkeeping entry is removed either way.
//!
//! The engine defines no timeouts: a set that is never marked ready never
//! completes. That is a caller-correctness requirement, not an engine
//! responsibility.

use alloc::boxed::Box;
use alloc::vec::Vec;

use core::fmt;

use thiserror::Error;

use crate::container::ContainerId;
use crate::surface::{Compositor, SurfaceTransaction};

/// Identifies an active sync set. Allocation is monotonic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyncId(pub(crate) u32);

impl fmt::Debug for SyncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyncId({})", self.0)
    }
}

/// The completion target could not be reached.
#[derive(Clone, Copy, Debug, Error)]
#[error("sync completion target unreachable")]
pub struct DeliveryError;

/// Completion invoked exactly once when a sync set's merged transaction is
/// ready. Returning `Err` triggers the local-apply fallback.
pub type Completion =
    Box<dyn FnOnce(SyncId, &SurfaceTransaction) -> Result<(), DeliveryError> + Send>;

struct SyncSet {
    id: SyncId,
    containers: Vec<ContainerId>,
    confirmed: Vec<ContainerId>,
    merged: SurfaceTransaction,
    ready: bool,
    completion: Option<Completion>,
}

impl SyncSet {
    fn is_complete(&self) -> bool {
        self.ready && self.confirmed.len() == self.containers.len()
    }
}

impl fmt::Debug for SyncSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSet")
            .field("id", &self.id)
            .field("containers", &self.containers)
            .field("confirmed", &self.confirmed)
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

/// Accumulates sync sets and resolves them against commit confirmations.
///
/// The engine is single-threaded data logic; the shell wraps it in its own
/// lock. Neither the completion nor the compositor may call back into the
/// container tree (lock-ordering contract).
#[derive(Debug, Default)]
pub struct SyncEngine {
    next_id: u32,
    active: Vec<SyncSet>,
}

impl SyncEngine {
    /// Creates an engine with no active sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new sync set bound to `completion`.
    pub fn start_sync_set(&mut self, completion: Completion) -> SyncId {
        let id = SyncId(self.next_id);
        self.next_id += 1;
        self.active.push(SyncSet {
            id,
            containers: Vec::new(),
            confirmed: Vec::new(),
            merged: SurfaceTransaction::new(),
            ready: false,
            completion: Some(completion),
        });
        id
    }

    /// Tags `container` into the set. Add-only; tagging the same container
    /// again is a no-op. Unknown ids are logged and ignored.
    pub fn add_to_sync_set(&mut self, id: SyncId, container: ContainerId) {
        let Some(set) = self.active.iter_mut().find(|s| s.id == id) else {
            log::warn!("add_to_sync_set: no active sync set {id:?}");
            return;
        };
        if !set.containers.contains(&container) {
            set.containers.push(container);
        }
    }

    /// Returns the containers currently tagged into `id`, if the set is
    /// still active.
    #[must_use]
    pub fn tagged(&self, id: SyncId) -> Option<&[ContainerId]> {
        self.active
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.containers.as_slice())
    }

    /// Declares that no further containers will be added to `id`, and
    /// resolves the set immediately if everything has already confirmed
    /// (including the empty set).
    pub fn set_ready(&mut self, id: SyncId, compositor: &mut dyn Compositor) {
        let Some(set) = self.active.iter_mut().find(|s| s.id == id) else {
            log::warn!("set_ready: no active sync set {id:?}");
            return;
        };
        set.ready = true;
        self.resolve_complete(compositor);
    }

    /// Records that `container`'s pending visual commit finished, merging
    /// its staged surface changes into every set awaiting it. Sets that
    /// become complete are delivered.
    pub fn confirm_commit(
        &mut self,
        container: ContainerId,
        staged: &SurfaceTransaction,
        compositor: &mut dyn Compositor,
    ) {
        for set in &mut self.active {
            if set.containers.contains(&container) && !set.confirmed.contains(&container) {
                set.confirmed.push(container);
                set.merged.merge(staged.clone());
            }
        }
        self.resolve_complete(compositor);
    }

    /// Delivers and removes every complete set.
    fn resolve_complete(&mut self, compositor: &mut dyn Compositor) {
        let mut i = 0;
        while i < self.active.len() {
            if !self.active[i].is_complete() {
                i += 1;
                continue;
            }
            let mut set = self.active.remove(i);
            if let Some(completion) = set.completion.take() {
                if completion(set.id, &set.merged).is_err() {
                    // The requester is gone; apply the confirmed result
                    // locally rather than dropping it.
                    log::warn!(
                        "sync {id:?}: completion unreachable, applying locally",
                        id = set.id
                    );
                    compositor.apply(&set.merged);
                }
            }
        }
    }
}
