// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Organizer-submitted transactions.
//!
//! A [`Transaction`] batches two kinds of mutation against the container
//! tree:
//!
//! - **Changes** — per-container property diffs, keyed by container
//!   identity. A container appears at most once; repeated builder calls for
//!   the same container merge into its existing [`Change`] record. Entries
//!   are applied in insertion order.
//! - **Hierarchy operations** — structural mutations ([`HierarchyOp`]),
//!   applied strictly in the order they were added. Order is significant and
//!   preserved exactly.
//!
//! Transactions are built by the organizer, then submitted by reference;
//! the engine never mutates a submitted transaction.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::config::{ActivityType, Configuration, WindowingMode};
use crate::config::{
    CONFIG_SCREEN_SIZE, CONFIG_SMALLEST_SCREEN_SIZE, CONFIG_WINDOW_CONFIGURATION,
    WINDOW_CONFIG_APP_BOUNDS, WINDOW_CONFIG_BOUNDS,
};
use crate::container::ContainerId;
use crate::surface::SurfaceTransaction;

/// Change-mask bit: the focusable flag is being changed.
pub const CHANGE_FOCUSABLE: u32 = 1 << 0;
/// Change-mask bit: the forced-hidden flag is being changed.
pub const CHANGE_HIDDEN: u32 = 1 << 1;
/// Change-mask bit: the ignore-orientation-request flag is being changed.
pub const CHANGE_IGNORE_ORIENTATION_REQUEST: u32 = 1 << 2;

/// A per-container property diff.
///
/// Which scalar fields are meaningful is described by
/// [`change_mask`](Self::change_mask); which configuration axes are
/// meaningful is described by [`config_mask`](Self::config_mask) and
/// [`window_mask`](Self::window_mask). Optional payloads are `None` when not
/// requested.
#[derive(Clone, Debug, Default)]
pub struct Change {
    change_mask: u32,
    focusable: bool,
    hidden: bool,
    ignore_orientation_request: bool,
    configuration: Configuration,
    config_mask: u32,
    window_mask: u32,
    windowing_mode: Option<WindowingMode>,
    activity_windowing_mode: Option<WindowingMode>,
    bounds_change_transaction: Option<SurfaceTransaction>,
    bounds_change_surface_bounds: Option<Rect>,
    enter_pip_bounds: Option<Rect>,
}

impl Change {
    /// The scalar-field mask (`CHANGE_*` bits).
    #[must_use]
    pub fn change_mask(&self) -> u32 {
        self.change_mask
    }

    /// The requested focusable value; meaningful iff [`CHANGE_FOCUSABLE`] is
    /// set.
    #[must_use]
    pub fn focusable(&self) -> bool {
        self.focusable
    }

    /// The requested hidden value; meaningful iff [`CHANGE_HIDDEN`] is set.
    #[must_use]
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    /// The requested ignore-orientation value; meaningful iff
    /// [`CHANGE_IGNORE_ORIENTATION_REQUEST`] is set.
    #[must_use]
    pub fn ignore_orientation_request(&self) -> bool {
        self.ignore_orientation_request
    }

    /// The partial configuration payload.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Which configuration axes the payload populates.
    #[must_use]
    pub fn config_mask(&self) -> u32 {
        self.config_mask
    }

    /// Which window-configuration axes the payload populates.
    #[must_use]
    pub fn window_mask(&self) -> u32 {
        self.window_mask
    }

    /// The requested windowing mode, if any.
    #[must_use]
    pub fn windowing_mode(&self) -> Option<WindowingMode> {
        self.windowing_mode
    }

    /// The requested child-activity windowing mode, if any.
    #[must_use]
    pub fn activity_windowing_mode(&self) -> Option<WindowingMode> {
        self.activity_windowing_mode
    }

    /// A surface transaction to stage as the task's pending main-window
    /// commit, if any.
    #[must_use]
    pub fn bounds_change_transaction(&self) -> Option<&SurfaceTransaction> {
        self.bounds_change_transaction.as_ref()
    }

    /// Raw composition-surface bounds to drive directly, if any.
    #[must_use]
    pub fn bounds_change_surface_bounds(&self) -> Option<Rect> {
        self.bounds_change_surface_bounds
    }

    /// Bounds for programmatic picture-in-picture entry, if any.
    #[must_use]
    pub fn enter_pip_bounds(&self) -> Option<Rect> {
        self.enter_pip_bounds
    }
}

/// A structural tree mutation, distinct from a property edit.
#[derive(Clone, Debug)]
pub enum HierarchyOp {
    /// Move a container to the top or bottom among its current siblings.
    Reorder {
        /// Target container.
        container: ContainerId,
        /// Top of the sibling list when set, bottom otherwise.
        to_top: bool,
    },
    /// Move a task under a new parent.
    Reparent {
        /// Target task.
        container: ContainerId,
        /// Destination; the display's default task area when `None`.
        new_parent: Option<ContainerId>,
        /// Top of the destination's children when set, bottom otherwise.
        to_top: bool,
    },
    /// Move all direct, non-organizer-created child tasks of one parent that
    /// match both filter sets under a new parent.
    ReparentChildren {
        /// Source parent; inferred as the default task area of
        /// `new_parent`'s display when `None`.
        current_parent: Option<ContainerId>,
        /// Destination parent; inferred as the default task area of
        /// `current_parent`'s display when `None`.
        new_parent: Option<ContainerId>,
        /// Windowing modes a child must match to move.
        windowing_modes: Vec<WindowingMode>,
        /// Activity types a child must match to move.
        activity_types: Vec<ActivityType>,
        /// Top of the destination's children when set, bottom otherwise.
        to_top: bool,
    },
    /// Register a task as its display area's default landing root for tasks
    /// matching the filter sets.
    SetLaunchRoot {
        /// The task to register.
        container: ContainerId,
        /// Windowing modes the registration applies to.
        windowing_modes: Vec<WindowingMode>,
        /// Activity types the registration applies to.
        activity_types: Vec<ActivityType>,
    },
}

/// A batched, ordered set of container mutations.
#[derive(Clone, Debug, Default)]
pub struct Transaction {
    changes: Vec<(ContainerId, Change)>,
    hierarchy_ops: Vec<HierarchyOp>,
}

impl Transaction {
    /// Creates an empty transaction.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
            hierarchy_ops: Vec::new(),
        }
    }

    /// Returns whether the transaction carries no changes and no hierarchy
    /// operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.hierarchy_ops.is_empty()
    }

    /// The change entries in insertion order.
    pub fn changes(&self) -> impl Iterator<Item = (ContainerId, &Change)> {
        self.changes.iter().map(|(id, change)| (*id, change))
    }

    /// The hierarchy operations in submission order.
    #[must_use]
    pub fn hierarchy_ops(&self) -> &[HierarchyOp] {
        &self.hierarchy_ops
    }

    /// Returns the change record for `container`, creating it on first use.
    fn change_mut(&mut self, container: ContainerId) -> &mut Change {
        let i = match self.changes.iter().position(|(id, _)| *id == container) {
            Some(i) => i,
            None => {
                self.changes.push((container, Change::default()));
                self.changes.len() - 1
            }
        };
        &mut self.changes[i].1
    }

    // -- Property builders --

    /// Requests new window bounds for `container`.
    pub fn set_bounds(&mut self, container: ContainerId, bounds: Rect) -> &mut Self {
        let change = self.change_mut(container);
        change.configuration.window.bounds = bounds;
        change.config_mask |= CONFIG_WINDOW_CONFIGURATION;
        change.window_mask |= WINDOW_CONFIG_BOUNDS;
        self
    }

    /// Requests new application bounds for `container`.
    pub fn set_app_bounds(&mut self, container: ContainerId, app_bounds: Option<Rect>) -> &mut Self {
        let change = self.change_mut(container);
        change.configuration.window.app_bounds = app_bounds;
        change.config_mask |= CONFIG_WINDOW_CONFIGURATION;
        change.window_mask |= WINDOW_CONFIG_APP_BOUNDS;
        self
    }

    /// Requests new screen dimensions for `container`.
    pub fn set_screen_sizes(
        &mut self,
        container: ContainerId,
        width_dp: u32,
        height_dp: u32,
        smallest_width_dp: u32,
    ) -> &mut Self {
        let change = self.change_mut(container);
        change.configuration.screen_width_dp = width_dp;
        change.configuration.screen_height_dp = height_dp;
        change.configuration.smallest_screen_width_dp = smallest_width_dp;
        change.config_mask |= CONFIG_SCREEN_SIZE | CONFIG_SMALLEST_SCREEN_SIZE;
        self
    }

    /// Requests a focusable-flag change for `container`.
    pub fn set_focusable(&mut self, container: ContainerId, focusable: bool) -> &mut Self {
        let change = self.change_mut(container);
        change.focusable = focusable;
        change.change_mask |= CHANGE_FOCUSABLE;
        self
    }

    /// Requests a forced-hidden change for `container` (task or display
    /// area; on a display area the change fans out to every task in its
    /// subtree).
    pub fn set_hidden(&mut self, container: ContainerId, hidden: bool) -> &mut Self {
        let change = self.change_mut(container);
        change.hidden = hidden;
        change.change_mask |= CHANGE_HIDDEN;
        self
    }

    /// Requests an ignore-orientation-request change for a display area.
    pub fn set_ignore_orientation_request(
        &mut self,
        container: ContainerId,
        ignore: bool,
    ) -> &mut Self {
        let change = self.change_mut(container);
        change.ignore_orientation_request = ignore;
        change.change_mask |= CHANGE_IGNORE_ORIENTATION_REQUEST;
        self
    }

    /// Requests a windowing-mode change for `container`.
    pub fn set_windowing_mode(&mut self, container: ContainerId, mode: WindowingMode) -> &mut Self {
        self.change_mut(container).windowing_mode = Some(mode);
        self
    }

    /// Requests a child-activity windowing-mode change for a task.
    pub fn set_activity_windowing_mode(
        &mut self,
        container: ContainerId,
        mode: WindowingMode,
    ) -> &mut Self {
        self.change_mut(container).activity_windowing_mode = Some(mode);
        self
    }

    /// Stages a surface transaction as the task's pending main-window
    /// commit.
    pub fn set_bounds_change_transaction(
        &mut self,
        container: ContainerId,
        txn: SurfaceTransaction,
    ) -> &mut Self {
        self.change_mut(container).bounds_change_transaction = Some(txn);
        self
    }

    /// Drives the task's raw composition-surface bounds directly. Only
    /// organized tasks (or direct children of organizer-created tasks) may
    /// do this; anything else fails the whole apply.
    pub fn set_bounds_change_surface_bounds(
        &mut self,
        container: ContainerId,
        bounds: Rect,
    ) -> &mut Self {
        self.change_mut(container).bounds_change_surface_bounds = Some(bounds);
        self
    }

    /// Requests programmatic picture-in-picture entry for a task.
    pub fn set_enter_pip_bounds(&mut self, container: ContainerId, bounds: Rect) -> &mut Self {
        self.change_mut(container).enter_pip_bounds = Some(bounds);
        self
    }

    // -- Hierarchy builders --

    /// Appends a reorder operation.
    pub fn reorder(&mut self, container: ContainerId, to_top: bool) -> &mut Self {
        self.hierarchy_ops
            .push(HierarchyOp::Reorder { container, to_top });
        self
    }

    /// Appends a reparent operation. `new_parent` of `None` targets the
    /// display's default task area.
    pub fn reparent(
        &mut self,
        container: ContainerId,
        new_parent: Option<ContainerId>,
        to_top: bool,
    ) -> &mut Self {
        self.hierarchy_ops.push(HierarchyOp::Reparent {
            container,
            new_parent,
            to_top,
        });
        self
    }

    /// Appends a bulk children-reparent operation.
    pub fn reparent_children(
        &mut self,
        current_parent: Option<ContainerId>,
        new_parent: Option<ContainerId>,
        windowing_modes: Vec<WindowingMode>,
        activity_types: Vec<ActivityType>,
        to_top: bool,
    ) -> &mut Self {
        self.hierarchy_ops.push(HierarchyOp::ReparentChildren {
            current_parent,
            new_parent,
            windowing_modes,
            activity_types,
            to_top,
        });
        self
    }

    /// Appends a set-launch-root operation.
    pub fn set_launch_root(
        &mut self,
        container: ContainerId,
        windowing_modes: Vec<WindowingMode>,
        activity_types: Vec<ActivityType>,
    ) -> &mut Self {
        self.hierarchy_ops.push(HierarchyOp::SetLaunchRoot {
            container,
            windowing_modes,
            activity_types,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::container::{ContainerStore, TaskParams};

    use super::*;

    fn two_ids() -> (ContainerId, ContainerId) {
        let mut store = ContainerStore::new();
        let a = store.create_task(TaskParams::default());
        let b = store.create_task(TaskParams::default());
        (a, b)
    }

    #[test]
    fn repeated_builders_merge_into_one_change() {
        let (a, _) = two_ids();
        let mut txn = Transaction::new();
        txn.set_focusable(a, false)
            .set_hidden(a, true)
            .set_bounds(a, Rect::new(0.0, 0.0, 10.0, 10.0));

        let entries: Vec<_> = txn.changes().collect();
        assert_eq!(entries.len(), 1, "one entry per container");
        let change = entries[0].1;
        assert_eq!(
            change.change_mask(),
            CHANGE_FOCUSABLE | CHANGE_HIDDEN,
            "masks accumulate"
        );
        assert_eq!(change.config_mask(), CONFIG_WINDOW_CONFIGURATION);
        assert_eq!(change.window_mask(), WINDOW_CONFIG_BOUNDS);
    }

    #[test]
    fn change_entries_keep_insertion_order() {
        let (a, b) = two_ids();
        let mut txn = Transaction::new();
        txn.set_focusable(b, false);
        txn.set_focusable(a, false);
        // Touching b again must not move it behind a.
        txn.set_hidden(b, true);

        let order: Vec<_> = txn.changes().map(|(id, _)| id).collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn hierarchy_ops_keep_submission_order() {
        let (a, b) = two_ids();
        let mut txn = Transaction::new();
        txn.reorder(a, true);
        txn.reparent(b, None, false);
        txn.reorder(b, false);

        let kinds: Vec<_> = txn
            .hierarchy_ops()
            .iter()
            .map(|op| match op {
                HierarchyOp::Reorder { container, .. } => ("reorder", *container),
                HierarchyOp::Reparent { container, .. } => ("reparent", *container),
                _ => panic!("unexpected op"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![("reorder", a), ("reparent", b), ("reorder", b)]
        );
    }

    #[test]
    fn empty_transaction_reports_empty() {
        let txn = Transaction::new();
        assert!(txn.is_empty());

        let (a, _) = two_ids();
        let mut txn = Transaction::new();
        txn.reorder(a, true);
        assert!(!txn.is_empty());
    }
}
