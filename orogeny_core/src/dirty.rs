// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The container tree is read by layout and render subsystems that are not
//! part of this crate. Orogeny uses multi-channel dirty tracking (via
//! [`understory_dirty`]) so those readers can consume incremental change sets
//! instead of rescanning the tree after every transaction. Each channel
//! represents an independent category of change.
//!
//! All channels are local-only: a mark names exactly the container that
//! changed. Structural effects on descendants (a reparented subtree moving
//! between displays, say) are conveyed by [`TOPOLOGY`] marks on the moved
//! container and its old and new parents.
//!
//! # Consumption
//!
//! Callers never query dirty state directly. Each
//! [`ContainerStore::drain_changes`](crate::container::ContainerStore::drain_changes)
//! call drains all channels and surfaces the results as
//! [`TreeChanges`](crate::container::TreeChanges).

use understory_dirty::Channel;

/// Requested override configuration or windowing mode changed.
pub const CONFIG: Channel = Channel::new(0);

/// Focusable or forced-hidden state changed — visibility reconciliation may
/// be required.
pub const VISIBILITY: Channel = Channel::new(1);

/// Tree topology changed (reorder, reparent, attach, detach).
pub const TOPOLOGY: Channel = Channel::new(2);
