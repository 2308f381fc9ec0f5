// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The externally callable organizer façade.
//!
//! [`WindowOrganizer`] wires submitted transactions to the core engine, a
//! sync barrier, and transitions. Every entry point:
//!
//! 1. checks the caller against the [`Permissions`] boundary,
//! 2. suppresses the caller's ambient identity to the server's own for the
//!    locked section (restored on all exit paths), and
//! 3. holds the global tree lock for its entire duration — no partial
//!    application is ever observable to a second lock-holder.
//!
//! # Lock ordering
//!
//! Locks are acquired in this order and never in reverse:
//!
//! ```text
//! tree ──► transitions ──► sync ──► compositor
//! ```
//!
//! The sync barrier and transition services are internally synchronized and
//! must never re-enter the tree lock; compositor-side commit confirmations
//! enter through [`on_surface_committed`](WindowOrganizer::on_surface_committed),
//! which takes only the sync and compositor locks. [`Lifecycle`],
//! [`Compositor`], completion, and player implementations are invoked with
//! locks held and must not call back into the organizer.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use orogeny_core::apply::{ApplyError, SyncRef, apply_transaction};
use orogeny_core::container::{ContainerId, ContainerStore};
use orogeny_core::lifecycle::Lifecycle;
use orogeny_core::surface::{Compositor, SurfaceId, SurfaceTransaction};
use orogeny_core::sync::{Completion, SyncEngine, SyncId};
use orogeny_core::transaction::Transaction;
use orogeny_core::transition::{TransitionId, TransitionKind, TransitionPlayer, TransitionRegistry};

use crate::identity::{CallerId, IdentityContext};
use crate::organizers::{DisplayAreaOrganizerRegistry, TaskOrganizerRegistry};

/// A caller failed a permission check.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("{caller:?} lacks the {permission} permission")]
pub struct PermissionDenied {
    /// The rejected caller.
    pub caller: CallerId,
    /// Which permission was required.
    pub permission: &'static str,
}

/// The permission boundary. Policy computation is external; the façade only
/// asks yes-or-no questions.
pub trait Permissions: Send + Sync {
    /// May `caller` organize containers (apply transactions, drive
    /// transitions)?
    fn check_organize(&self, caller: CallerId) -> Result<(), PermissionDenied>;

    /// May `caller` capture composited frame content?
    fn check_capture(&self, caller: CallerId) -> Result<(), PermissionDenied>;
}

/// A [`Permissions`] policy that admits every caller. Intended for tests and
/// single-tenant embeddings.
#[derive(Clone, Copy, Debug, Default)]
pub struct PermitAll;

impl Permissions for PermitAll {
    fn check_organize(&self, _caller: CallerId) -> Result<(), PermissionDenied> {
        Ok(())
    }
    fn check_capture(&self, _caller: CallerId) -> Result<(), PermissionDenied> {
        Ok(())
    }
}

/// A failure surfaced to façade callers. Recoverable conditions (stale
/// tokens inside a batch, delivery failures) are absorbed by the engine and
/// never appear here.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum OrganizerError {
    /// The caller failed a permission check.
    #[error(transparent)]
    Permission(#[from] PermissionDenied),
    /// The transaction violated a structural or legality contract.
    #[error(transparent)]
    Apply(#[from] ApplyError),
    /// A token named no live container.
    #[error("unresolvable container token")]
    InvalidToken,
    /// A transition was to be created but no kind was given.
    #[error("cannot create a transition without a kind")]
    NoTransitionKind,
    /// A transition handle named no active transition.
    #[error("unknown transition handle")]
    UnknownTransition,
}

struct TreeState {
    store: ContainerStore,
    lifecycle: Box<dyn Lifecycle + Send>,
}

/// Server-side coordinator for organizing windows.
///
/// Owns the container tree behind the global lock, the sync barrier, the
/// transition registry, and the organizer registries. See the module docs
/// for the locking contract.
pub struct WindowOrganizer {
    tree: Mutex<TreeState>,
    sync: Mutex<SyncEngine>,
    transitions: Mutex<TransitionRegistry>,
    compositor: Mutex<Box<dyn Compositor + Send>>,
    permissions: Box<dyn Permissions>,
    identity: Arc<IdentityContext>,
    task_organizers: Arc<Mutex<TaskOrganizerRegistry>>,
    display_area_organizers: Arc<Mutex<DisplayAreaOrganizerRegistry>>,
}

impl core::fmt::Debug for WindowOrganizer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WindowOrganizer").finish_non_exhaustive()
    }
}

impl WindowOrganizer {
    /// Creates an organizer with an empty container tree.
    #[must_use]
    pub fn new(
        lifecycle: Box<dyn Lifecycle + Send>,
        compositor: Box<dyn Compositor + Send>,
        permissions: Box<dyn Permissions>,
    ) -> Self {
        Self::with_identity(
            Arc::new(IdentityContext::new()),
            lifecycle,
            compositor,
            permissions,
        )
    }

    /// Like [`new`](Self::new), with a caller-provided identity context so
    /// the embedding can share it with its own permission evaluations.
    #[must_use]
    pub fn with_identity(
        identity: Arc<IdentityContext>,
        lifecycle: Box<dyn Lifecycle + Send>,
        compositor: Box<dyn Compositor + Send>,
        permissions: Box<dyn Permissions>,
    ) -> Self {
        Self {
            tree: Mutex::new(TreeState {
                store: ContainerStore::new(),
                lifecycle,
            }),
            sync: Mutex::new(SyncEngine::new()),
            transitions: Mutex::new(TransitionRegistry::new()),
            compositor: Mutex::new(compositor),
            permissions,
            identity,
            task_organizers: Arc::new(Mutex::new(TaskOrganizerRegistry::new())),
            display_area_organizers: Arc::new(Mutex::new(DisplayAreaOrganizerRegistry::new())),
        }
    }

    /// The identity context consulted by internal permission evaluations.
    #[must_use]
    pub fn identity(&self) -> Arc<IdentityContext> {
        Arc::clone(&self.identity)
    }

    /// Runs `f` with exclusive access to the container tree. This is the
    /// tree owner's entry point for creating, attaching, and destroying
    /// containers.
    pub fn with_tree<R>(&self, f: impl FnOnce(&mut ContainerStore) -> R) -> R {
        let mut tree = self.tree.lock().expect("tree lock poisoned");
        f(&mut tree.store)
    }

    /// Applies a transaction, fire-and-forget.
    pub fn apply(&self, caller: CallerId, txn: &Transaction) -> Result<(), OrganizerError> {
        self.permissions.check_organize(caller)?;
        let _call = self.identity.act_as(caller);
        let _sys = self.identity.act_as_system();
        let mut tree = self.tree.lock().expect("tree lock poisoned");
        let TreeState { store, lifecycle } = &mut *tree;
        apply_transaction(store, txn, None, None, lifecycle.as_mut())?;
        Ok(())
    }

    /// Applies a transaction on the confirmed path.
    ///
    /// With a completion, a sync set is allocated *before* applying, every
    /// touched container is tagged into it, and the set is marked ready
    /// immediately after — the completion itself fires later, once the
    /// compositor confirms every tagged container's commit (or right away
    /// for an empty set). Without a completion this degenerates to
    /// [`apply`](Self::apply) and returns `None`.
    pub fn apply_sync(
        &self,
        caller: CallerId,
        txn: &Transaction,
        completion: Option<Completion>,
    ) -> Result<Option<SyncId>, OrganizerError> {
        self.permissions.check_organize(caller)?;
        let _call = self.identity.act_as(caller);
        let _sys = self.identity.act_as_system();
        let mut tree = self.tree.lock().expect("tree lock poisoned");
        let TreeState { store, lifecycle } = &mut *tree;

        let Some(completion) = completion else {
            apply_transaction(store, txn, None, None, lifecycle.as_mut())?;
            return Ok(None);
        };

        let mut sync = self.sync.lock().expect("sync lock poisoned");
        let id = sync.start_sync_set(completion);
        apply_transaction(
            store,
            txn,
            Some(SyncRef {
                engine: &mut sync,
                id,
            }),
            None,
            lifecycle.as_mut(),
        )?;
        log::debug!("sync ready: {id:?}");
        let mut compositor = self.compositor.lock().expect("compositor lock poisoned");
        sync.set_ready(id, compositor.as_mut());
        Ok(Some(id))
    }

    /// Resolves or creates a transition, starts it, and applies an
    /// (optionally empty) transaction under it.
    ///
    /// When the caller passes no existing handle, `kind` is required; and if
    /// a transaction was passed too, the transition's whole lifecycle is
    /// contained in this call, so it is marked ready immediately after the
    /// apply. With an existing handle, readiness stays externally driven.
    pub fn start_transition(
        &self,
        caller: CallerId,
        kind: Option<TransitionKind>,
        existing: Option<TransitionId>,
        txn: Option<&Transaction>,
    ) -> Result<TransitionId, OrganizerError> {
        self.permissions.check_organize(caller)?;
        let _call = self.identity.act_as(caller);
        let _sys = self.identity.act_as_system();
        let mut tree = self.tree.lock().expect("tree lock poisoned");
        let mut transitions = self.transitions.lock().expect("transition lock poisoned");

        let id = match existing {
            Some(id) => {
                if transitions.get(id).is_none() {
                    return Err(OrganizerError::UnknownTransition);
                }
                id
            }
            None => {
                let kind = kind.ok_or(OrganizerError::NoTransitionKind)?;
                transitions.create(kind)
            }
        };
        let needs_set_ready = existing.is_none() && txn.is_some();

        let empty = Transaction::new();
        let txn = txn.unwrap_or(&empty);
        let transition = transitions.get_mut(id).expect("resolved above");
        transition.start();
        let TreeState { store, lifecycle } = &mut *tree;
        apply_transaction(store, txn, None, Some(transition), lifecycle.as_mut())?;
        if needs_set_ready {
            transitions.set_ready(id);
        }
        Ok(id)
    }

    /// Finishes a transition, optionally applying a trailing transaction on
    /// the confirmed path.
    ///
    /// A sync set is allocated only when both a trailing transaction and a
    /// completion are given; its id is returned.
    pub fn finish_transition(
        &self,
        caller: CallerId,
        handle: TransitionId,
        txn: Option<&Transaction>,
        completion: Option<Completion>,
    ) -> Result<Option<SyncId>, OrganizerError> {
        self.permissions.check_organize(caller)?;
        let _call = self.identity.act_as(caller);
        let _sys = self.identity.act_as_system();
        let mut tree = self.tree.lock().expect("tree lock poisoned");
        let mut transitions = self.transitions.lock().expect("transition lock poisoned");
        if transitions.get(handle).is_none() {
            return Err(OrganizerError::UnknownTransition);
        }

        let mut sync = self.sync.lock().expect("sync lock poisoned");
        let sync_id = match (txn.is_some(), completion) {
            (true, Some(completion)) => Some(sync.start_sync_set(completion)),
            _ => None,
        };

        transitions.finish(handle);

        let TreeState { store, lifecycle } = &mut *tree;
        if let Some(txn) = txn {
            match sync_id {
                Some(id) => {
                    apply_transaction(
                        store,
                        txn,
                        Some(SyncRef {
                            engine: &mut sync,
                            id,
                        }),
                        None,
                        lifecycle.as_mut(),
                    )?;
                }
                None => {
                    apply_transaction(store, txn, None, None, lifecycle.as_mut())?;
                }
            }
        }
        if let Some(id) = sync_id {
            log::debug!("sync ready: {id:?}");
            let mut compositor = self.compositor.lock().expect("compositor lock poisoned");
            sync.set_ready(id, compositor.as_mut());
        }
        Ok(sync_id)
    }

    /// Returns the task and display-area organizer registries.
    pub fn organizer_controllers(
        &self,
        caller: CallerId,
    ) -> Result<
        (
            Arc<Mutex<TaskOrganizerRegistry>>,
            Arc<Mutex<DisplayAreaOrganizerRegistry>>,
        ),
        OrganizerError,
    > {
        self.permissions.check_organize(caller)?;
        Ok((
            Arc::clone(&self.task_organizers),
            Arc::clone(&self.display_area_organizers),
        ))
    }

    /// Registers the transition player.
    pub fn register_transition_player(
        &self,
        caller: CallerId,
        player: Box<dyn TransitionPlayer + Send>,
    ) -> Result<(), OrganizerError> {
        self.permissions.check_organize(caller)?;
        let _call = self.identity.act_as(caller);
        let _sys = self.identity.act_as_system();
        self.transitions
            .lock()
            .expect("transition lock poisoned")
            .register_player(player);
        Ok(())
    }

    /// Captures the currently composited pixels of the subtree rooted at
    /// `token` into `out`.
    ///
    /// Returns `Ok(false)` on any empty or failed capture; an unresolvable
    /// token is a caller error.
    pub fn take_screenshot(
        &self,
        caller: CallerId,
        token: ContainerId,
        out: SurfaceId,
    ) -> Result<bool, OrganizerError> {
        self.permissions.check_capture(caller)?;
        let _call = self.identity.act_as(caller);
        let _sys = self.identity.act_as_system();
        let tree = self.tree.lock().expect("tree lock poisoned");
        if !tree.store.is_alive(token) {
            return Err(OrganizerError::InvalidToken);
        }
        let Some(surface) = tree.store.surface(token) else {
            return Ok(false);
        };
        let bounds = tree.store.override_configuration(token).window.bounds;
        // Capture in surface-local coordinates.
        let bounds = bounds.with_origin((0.0, 0.0));

        let mut compositor = self.compositor.lock().expect("compositor lock poisoned");
        let Some(buffer) = compositor.capture(surface, bounds) else {
            return Ok(false);
        };
        if buffer.is_empty() {
            return Ok(false);
        }
        compositor.present(out, &buffer);
        Ok(true)
    }

    /// Reports that `container`'s pending visual commit finished, with its
    /// staged surface changes.
    ///
    /// Compositor-side entry point: takes only the sync and compositor
    /// locks, never the tree lock, so it may be called concurrently with
    /// façade traffic without deadlock.
    pub fn on_surface_committed(&self, container: ContainerId, staged: &SurfaceTransaction) {
        let mut sync = self.sync.lock().expect("sync lock poisoned");
        let mut compositor = self.compositor.lock().expect("compositor lock poisoned");
        sync.confirm_commit(container, staged, compositor.as_mut());
    }
}
