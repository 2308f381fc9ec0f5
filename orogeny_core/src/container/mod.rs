// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window container tree data model.
//!
//! A *container* is a node in the organized window hierarchy. Each container
//! has:
//!
//! - An identity ([`ContainerId`]) — a generational handle that becomes
//!   stale when the container is destroyed. Organizers hold these as opaque
//!   tokens; resolution reports stale handles as absent instead of
//!   dereferencing them.
//! - Topology — parent, first-child, and sibling links forming an ordered
//!   tree. Sibling order is z-order: first child is bottommost.
//! - A kind — plain container, [task](TaskState), or
//!   [display area](DisplayAreaState) — expressed as a tagged payload with
//!   capability accessors ([`task_state`](ContainerStore::task_state),
//!   [`display_area_state`](ContainerStore::display_area_state)) that return
//!   `None` on a kind mismatch rather than casting.
//! - Common properties: requested override configuration, windowing mode,
//!   focusable flag, optional composition surface.
//!
//! Containers are stored in struct-of-arrays layout with index-based handles
//! for cache-friendly traversal. The tree owner creates and destroys nodes;
//! the transaction engine only edits properties and restructures.
//!
//! # Attachment
//!
//! A container is *attached* when its topmost ancestor is a display area.
//! Transactions refuse to touch detached containers: the affected entry is
//! skipped with a diagnostic and the rest of the batch proceeds.

mod id;
mod store;
mod traverse;

use alloc::vec::Vec;

use crate::config::{ActivityType, WindowingMode};
use crate::surface::SurfaceTransaction;

pub use id::{ContainerId, INVALID};
pub use store::{ContainerStore, HiddenReason, Position, TreeChanges};
pub use traverse::Children;

/// Discriminant for the container kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// A plain grouping container.
    Container,
    /// A task hosting application activities.
    Task,
    /// A display area holding a subtree of tasks.
    DisplayArea,
}

/// Per-slot payload: the kind tag plus kind-specific state.
#[derive(Clone, Debug)]
pub(crate) enum Payload {
    Container,
    Task(TaskState),
    DisplayArea(DisplayAreaState),
}

/// Creation parameters for a task container.
#[derive(Clone, Debug, Default)]
pub struct TaskParams {
    /// What kind of activity the task hosts.
    pub activity_type: ActivityType,
    /// Whether the task supports resizing (and thus multi-window).
    pub resizeable: bool,
    /// Whether an organizer requested this task's creation.
    pub created_by_organizer: bool,
}

/// Task-specific container state.
#[derive(Clone, Debug)]
pub struct TaskState {
    pub(crate) created_by_organizer: bool,
    pub(crate) organized: bool,
    pub(crate) hidden_reasons: u32,
    pub(crate) activity_type: ActivityType,
    pub(crate) resizeable: bool,
    pub(crate) activity_windowing_mode: WindowingMode,
    pub(crate) pending_surface_transaction: Option<SurfaceTransaction>,
}

impl TaskState {
    /// Whether an organizer requested this task's creation.
    #[must_use]
    pub fn created_by_organizer(&self) -> bool {
        self.created_by_organizer
    }

    /// Whether the task has been claimed by an organizer.
    #[must_use]
    pub fn is_organized(&self) -> bool {
        self.organized
    }

    /// Whether any owner currently forces the task hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden_reasons != 0
    }

    /// The kind of activity the task hosts.
    #[must_use]
    pub fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    /// Whether the task supports resizing (and thus multi-window).
    #[must_use]
    pub fn resizeable(&self) -> bool {
        self.resizeable
    }

    /// The windowing mode applied to activities launched into this task.
    #[must_use]
    pub fn activity_windowing_mode(&self) -> WindowingMode {
        self.activity_windowing_mode
    }

    /// Sets the windowing mode applied to activities launched into this
    /// task.
    pub fn set_activity_windowing_mode(&mut self, mode: WindowingMode) {
        self.activity_windowing_mode = mode;
    }

    /// The staged main-window surface transaction, if any.
    #[must_use]
    pub fn pending_surface_transaction(&self) -> Option<&SurfaceTransaction> {
        self.pending_surface_transaction.as_ref()
    }
}

/// A launch-root registration on a display area: tasks matching the filters
/// land in `task` by default.
#[derive(Clone, Debug)]
pub struct LaunchRoot {
    /// The designated landing root task.
    pub task: ContainerId,
    /// Windowing modes the registration applies to.
    pub windowing_modes: Vec<WindowingMode>,
    /// Activity types the registration applies to.
    pub activity_types: Vec<ActivityType>,
}

/// Display-area-specific container state.
#[derive(Clone, Debug)]
pub struct DisplayAreaState {
    pub(crate) ignore_orientation_request: bool,
    pub(crate) default_task_area: bool,
    pub(crate) launch_roots: Vec<LaunchRoot>,
}

impl DisplayAreaState {
    /// Whether the display area ignores orientation requests from its
    /// content.
    #[must_use]
    pub fn ignore_orientation_request(&self) -> bool {
        self.ignore_orientation_request
    }

    /// Whether this area is the default landing area for its display.
    #[must_use]
    pub fn is_default_task_area(&self) -> bool {
        self.default_task_area
    }

    /// The launch-root registrations, oldest first.
    #[must_use]
    pub fn launch_roots(&self) -> &[LaunchRoot] {
        &self.launch_roots
    }
}
