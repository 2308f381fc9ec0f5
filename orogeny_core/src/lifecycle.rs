// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle boundary for the surrounding window-management system.
//!
//! The transaction engine mutates the container tree, but visibility
//! reconciliation, activity configuration delivery, layout, task resizing,
//! and picture-in-picture are owned by external subsystems. This module
//! defines the [`Lifecycle`] trait those subsystems implement so the engine
//! can trigger the correct refresh after a batch.
//!
//! All methods default to no-ops, so implementing only the events you care
//! about is fine; test doubles typically record invocations.

use kurbo::Rect;

use crate::container::ContainerId;

/// Why a re-layout is being requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutReason {
    /// A configuration axis changed without any client-visible config
    /// delivery.
    ConfigChanged,
    /// Visibility of one or more containers changed.
    VisibilityChanged,
}

/// Receives lifecycle triggers from the transaction engine.
///
/// Implementations must not call back into the container tree or the engine:
/// they are invoked while the global tree lock is held (see the shell
/// crate's lock-ordering contract).
pub trait Lifecycle {
    /// Called before a transaction's passes begin. Layout triggered between
    /// this call and [`continue_layout`](Self::continue_layout) must be
    /// deferred so intermediate states are never observed as a completed
    /// layout pass.
    fn defer_layout(&mut self) {}

    /// Called after a transaction's passes end, on all exit paths. Deferred
    /// layout may resume.
    fn continue_layout(&mut self) {}

    /// A batch had lifecycle-level effects: re-evaluate visibility and
    /// focus (and with it, activity configuration) over the whole tree.
    fn ensure_visibility_and_focus(&mut self) {}

    /// A batch changed client-visible configuration on exactly these
    /// containers and had no lifecycle-level effects: deliver configuration
    /// to them only.
    fn reconcile_configuration(&mut self, containers: &[ContainerId]) {
        _ = containers;
    }

    /// A batch had no client-visible configuration effects: schedule a
    /// generic re-layout.
    fn request_layout(&mut self, reason: LayoutReason) {
        _ = reason;
    }

    /// A pinned container's bounded configuration changed: resize it to the
    /// new bounds, deferring resume.
    fn resize_pinned(&mut self, container: ContainerId, bounds: Rect) {
        _ = (container, bounds);
    }

    /// A task requested programmatic picture-in-picture entry with the given
    /// bounds.
    fn enter_pip(&mut self, task: ContainerId, bounds: Rect) {
        _ = (task, bounds);
    }
}

/// A [`Lifecycle`] that ignores all triggers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLifecycle;

impl Lifecycle for NoopLifecycle {}
