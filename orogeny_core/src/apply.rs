// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transaction application.
//!
//! [`apply_transaction`] runs an organizer transaction against the container
//! tree in three ordered passes, then finalizes the aggregated effects. The
//! pass order is load-bearing, not an implementation detail — later passes
//! depend on the final parentage and configuration produced by earlier ones:
//!
//! 1. **Changes**, in the caller's insertion order. Unresolvable or detached
//!    containers are skipped with a diagnostic; the batch continues. When a
//!    sync set or transition is active, the container is tagged/collected
//!    strictly *before* its mutation.
//! 2. **Hierarchy operations**, strictly in submission order, each with its
//!    own legality checks (see the module docs in `hierarchy.rs`).
//! 3. **Surface-bounds finalization**: raw-bounds directives are validated
//!    against the now-final parentage and staged against each task's
//!    composition surface.
//! 4. **Effect finalization**: lifecycle effects trigger a full
//!    visibility-and-focus pass; otherwise client-config effects trigger
//!    targeted configuration reconciliation; otherwise a generic re-layout
//!    is requested.
//!
//! The whole call is bracketed by [`Lifecycle::defer_layout`] /
//! [`Lifecycle::continue_layout`] (on all exit paths) so intermediate states
//! are never observed as a completed layout pass.
//!
//! # Failure model
//!
//! Per-container resolution failures never fail the call. Structural and
//! legality violations do, as typed [`ApplyError`]s — and entries applied
//! before the failing one are *not* rolled back. That is documented
//! behavior: the batch bracket bounds observability, and retries are the
//! organizer's responsibility.
//!
//! The caller must hold the global tree lock for the whole call.

use alloc::vec::Vec;

use core::ops::{BitOr, BitOrAssign};

use kurbo::Point;
use thiserror::Error;

use crate::config::{
    CONFIG_WINDOW_CONFIGURATION, CONTROLLABLE_CONFIGS, CONTROLLABLE_WINDOW_CONFIGS,
    WINDOW_CONFIG_BOUNDS, WindowingMode,
};
use crate::container::{ContainerId, ContainerKind, ContainerStore, HiddenReason};
use crate::hierarchy::apply_hierarchy_op;
use crate::lifecycle::{LayoutReason, Lifecycle};
use crate::surface::SurfaceTransaction;
use crate::sync::{SyncEngine, SyncId};
use crate::transaction::{
    CHANGE_FOCUSABLE, CHANGE_HIDDEN, CHANGE_IGNORE_ORIENTATION_REQUEST, Change, Transaction,
};
use crate::transition::Transition;

/// Aggregated side-effect bits from applying a transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Effects(u32);

impl Effects {
    /// No effects.
    pub const NONE: Self = Self(0);
    /// A client-visible configuration change occurred.
    pub const CLIENT_CONFIG: Self = Self(1 << 0);
    /// A change occurred that may affect container lifecycle (visibility,
    /// focus, structure).
    pub const LIFECYCLE: Self = Self(1 << 1);

    /// Returns whether every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns whether no bits are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Effects {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Effects {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A fatal transaction failure. Everything else is skip-and-log.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ApplyError {
    /// A change targeted a container that is neither a task nor a display
    /// area.
    #[error("change targets a container that is neither a task nor a display area")]
    UnsupportedContainer,
    /// A hierarchy operation required a task container and got something
    /// else.
    #[error("hierarchy operation requires a task container")]
    InvalidHierarchyTarget,
    /// A children-reparent operation named no resolvable endpoint at all.
    #[error("children reparent names no endpoints")]
    MissingReparentEndpoints,
    /// Reparenting was requested for a task that is neither a root task nor
    /// a child of an organizer-created task.
    #[error("reparenting a leaf task is not supported")]
    UnsupportedReparent,
    /// A raw surface-bounds directive targeted a task that is not organized
    /// and not a direct child of an organizer-created task.
    #[error("cannot manipulate the surface of a non-organized task")]
    NonOrganizedSurface,
}

/// Borrow of the sync engine plus the active set to tag containers into.
#[derive(Debug)]
pub struct SyncRef<'a> {
    /// The barrier engine.
    pub engine: &'a mut SyncEngine,
    /// The set being populated by this apply.
    pub id: SyncId,
}

/// Applies `txn` to the tree, optionally tagging touched containers into a
/// sync set and collecting them into a transition.
///
/// Returns the OR of all effect bits. See the module docs for the pass
/// order, failure model, and locking contract.
pub fn apply_transaction(
    store: &mut ContainerStore,
    txn: &Transaction,
    mut sync: Option<SyncRef<'_>>,
    mut transition: Option<&mut Transition>,
    lifecycle: &mut dyn Lifecycle,
) -> Result<Effects, ApplyError> {
    log::debug!(
        "apply transaction: {} changes, {} hierarchy ops, sync={:?}",
        txn.changes().count(),
        txn.hierarchy_ops().len(),
        sync.as_ref().map(|s| s.id),
    );
    lifecycle.defer_layout();
    let result = apply_inner(store, txn, &mut sync, &mut transition, lifecycle);
    lifecycle.continue_layout();
    result
}

fn apply_inner(
    store: &mut ContainerStore,
    txn: &Transaction,
    sync: &mut Option<SyncRef<'_>>,
    transition: &mut Option<&mut Transition>,
    lifecycle: &mut dyn Lifecycle,
) -> Result<Effects, ApplyError> {
    let mut effects = Effects::NONE;
    let mut have_config_changes: Vec<ContainerId> = Vec::new();

    // Pass 1: per-container changes, in caller order.
    for (id, change) in txn.changes() {
        if !store.is_attached(id) {
            log::error!("attempt to operate on detached container: {id:?}");
            continue;
        }
        // Tag into the sync set before mutating, so the barrier's
        // bookkeeping for this container cannot race ahead of the mutation
        // it confirms. Same for transition collection.
        if let Some(sync) = sync.as_mut() {
            sync.engine.add_to_sync_set(sync.id, id);
        }
        if let Some(t) = transition.as_deref_mut() {
            t.collect(id);
        }

        let container_effects = apply_container_change(store, id, change, lifecycle)?;
        effects |= container_effects;

        // Lifecycle effects trigger reconciliation for everything; only
        // remember targets for the narrow config pass while none occurred.
        if !effects.contains(Effects::LIFECYCLE)
            && container_effects.contains(Effects::CLIENT_CONFIG)
            && !have_config_changes.contains(&id)
        {
            have_config_changes.push(id);
        }
    }

    // Pass 2: hierarchy operations, strictly in submission order.
    for op in txn.hierarchy_ops() {
        effects |= apply_hierarchy_op(store, op, sync, transition)?;
    }

    // Pass 3: stage raw-bounds directives now that parentage is final.
    for (id, change) in txn.changes() {
        let Some(bounds) = change.bounds_change_surface_bounds() else {
            continue;
        };
        if !store.is_attached(id) {
            log::error!("attempt to operate on detached container: {id:?}");
            continue;
        }
        let Some(task) = store.task_state(id) else {
            continue;
        };
        if !task.is_organized() {
            // Direct children of organizer-created tasks may also be
            // controlled; anything else is a caller error.
            let parent_created = store
                .parent(id)
                .and_then(|p| store.task_state(p))
                .is_some_and(|t| t.created_by_organizer());
            if !parent_created {
                return Err(ApplyError::NonOrganizedSurface);
            }
        }
        let Some(surface) = store.surface(id) else {
            log::warn!("no composition surface bound to {id:?}");
            continue;
        };
        let mut staged = SurfaceTransaction::new();
        staged.set_position(surface, Point::new(bounds.x0, bounds.y0));
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            staged.set_crop(surface, None);
        } else {
            staged.set_crop(surface, Some(bounds.size()));
        }
        store.set_pending_surface_transaction(id, staged);
    }

    // Pass 4: effect finalization.
    if effects.contains(Effects::LIFECYCLE) {
        lifecycle.ensure_visibility_and_focus();
    } else if effects.contains(Effects::CLIENT_CONFIG) {
        lifecycle.reconcile_configuration(&have_config_changes);
    } else {
        lifecycle.request_layout(LayoutReason::ConfigChanged);
    }

    Ok(effects)
}

fn apply_container_change(
    store: &mut ContainerStore,
    id: ContainerId,
    change: &Change,
    lifecycle: &mut dyn Lifecycle,
) -> Result<Effects, ApplyError> {
    let kind = store.kind(id);
    if kind == ContainerKind::Container {
        return Err(ApplyError::UnsupportedContainer);
    }

    let mut effects = apply_common_changes(store, id, change, lifecycle);
    match kind {
        ContainerKind::Task => effects |= apply_task_changes(store, id, change, lifecycle),
        ContainerKind::DisplayArea => effects |= apply_display_area_changes(store, id, change),
        ContainerKind::Container => unreachable!("rejected above"),
    }
    Ok(effects)
}

fn apply_common_changes(
    store: &mut ContainerStore,
    id: ContainerId,
    change: &Change,
    lifecycle: &mut dyn Lifecycle,
) -> Effects {
    // The organizer-facing API should prevent bad changes; sanitize the
    // masks here regardless.
    let config_mask = change.config_mask() & CONTROLLABLE_CONFIGS;
    let window_mask = change.window_mask() & CONTROLLABLE_WINDOW_CONFIGS;
    let mut effects = Effects::NONE;
    let windowing_mode = change.windowing_mode();

    if config_mask != 0 {
        if windowing_mode.is_some_and(|mode| mode != store.windowing_mode(id)) {
            // A windowing-mode change rides in the same entry. Merge the
            // override configuration silently and let the mode change below
            // emit the one combined notification, so the container never
            // observes an intermediate half-updated configuration.
            store.merge_override_configuration(id, change.configuration(), config_mask, window_mask);
        } else {
            let mut merged = store.override_configuration(id).clone();
            merged.set_to(change.configuration(), config_mask, window_mask);
            store.set_override_configuration(id, merged);
        }
        resize_pinned_if_needed(store, id, config_mask, window_mask, lifecycle);
        effects |= Effects::CLIENT_CONFIG;
    }

    if change.change_mask() & CHANGE_FOCUSABLE != 0
        && store.set_focusable(id, change.focusable())
    {
        effects |= Effects::LIFECYCLE;
    }

    if let Some(mode) = windowing_mode {
        store.set_windowing_mode(id, mode);
    }
    effects
}

/// Legacy special case: a bounded-configuration change on a pinned container
/// additionally resizes it to the new bounds, deferring resume.
fn resize_pinned_if_needed(
    store: &mut ContainerStore,
    id: ContainerId,
    config_mask: u32,
    window_mask: u32,
    lifecycle: &mut dyn Lifecycle,
) {
    if store.task_state(id).is_some()
        && config_mask & CONFIG_WINDOW_CONFIGURATION != 0
        && window_mask & WINDOW_CONFIG_BOUNDS != 0
        && store.effective_windowing_mode(id) == WindowingMode::Pinned
    {
        let bounds = store.override_configuration(id).window.bounds;
        lifecycle.resize_pinned(id, bounds);
    }
}

fn apply_task_changes(
    store: &mut ContainerStore,
    id: ContainerId,
    change: &Change,
    lifecycle: &mut dyn Lifecycle,
) -> Effects {
    let mut effects = Effects::NONE;

    if change.change_mask() & CHANGE_HIDDEN != 0
        && store.set_force_hidden(id, HiddenReason::Organizer, change.hidden())
    {
        effects = Effects::LIFECYCLE;
    }

    if let Some(mode) = change.activity_windowing_mode() {
        if let Some(task) = store.task_state_mut(id) {
            task.set_activity_windowing_mode(mode);
        }
    }

    if let Some(staged) = change.bounds_change_transaction() {
        store.set_pending_surface_transaction(id, staged.clone());
    }

    if let Some(bounds) = change.enter_pip_bounds() {
        lifecycle.enter_pip(id, bounds);
    }

    effects
}

fn apply_display_area_changes(
    store: &mut ContainerStore,
    id: ContainerId,
    change: &Change,
) -> Effects {
    let mut effects = Effects::NONE;

    if change.change_mask() & CHANGE_IGNORE_ORIENTATION_REQUEST != 0
        && store.set_ignore_orientation_request(id, change.ignore_orientation_request())
    {
        effects |= Effects::LIFECYCLE;
    }

    if change.change_mask() & CHANGE_HIDDEN != 0 {
        // Fan the hidden change out to every task in the subtree. Snapshot
        // first: hiding does not restructure, but the traversal must not
        // alias the mutation.
        for task in store.tasks_of(id, true) {
            if store.set_force_hidden(task, HiddenReason::Organizer, change.hidden()) {
                effects |= Effects::LIFECYCLE;
            }
        }
    }

    effects
}
