// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types and container tree for transactional window organization.
//!
//! `orogeny_core` provides the data structures and engine for applying
//! batched, transactional mutations to a tree of on-screen window
//! containers, coordinated with asynchronous surface-composition commits and
//! animated transitions. It is `no_std` compatible (with `alloc`) and
//! single-threaded by construction: the embedding shell provides mutual
//! exclusion (see the `orogeny_shell` crate).
//!
//! # Architecture
//!
//! An organizer-submitted transaction flows through the engine as follows:
//!
//! ```text
//!   Transaction ──► apply_transaction()
//!                        │ changes pass ──► ContainerStore property edits
//!                        │ hierarchy pass ──► reorder / reparent / launch roots
//!                        │ bounds pass ──► staged SurfaceTransactions
//!                        ▼
//!                    Effects ──► Lifecycle (visibility / config / layout)
//!
//!   SyncEngine ◄── tagged containers          Transition ◄── collected
//!        │                                         participants
//!        ▼
//!   Compositor commit confirmations ──► completion (or local fallback)
//! ```
//!
//! **[`container`]** — Struct-of-arrays container tree with generational
//! handles, tagged task/display-area payloads, capability accessors, and
//! dirty-channel change draining.
//!
//! **[`config`]** — Partial configuration model with masked merges and the
//! controllable-axis allow-lists.
//!
//! **[`transaction`]** — The organizer-facing transaction: an insertion-
//! ordered change map plus an ordered hierarchy-operation list.
//!
//! **[`apply`]** — The three-pass transaction applier and effect
//! aggregation, backed by an internal hierarchy-operation processor with
//! per-op legality checks.
//!
//! **[`sync`]** — The sync barrier engine: add-only container tagging,
//! readiness, commit confirmation, and deliver-or-fallback completion.
//!
//! **[`transition`]** — Animated-transition collection and the player
//! boundary.
//!
//! **[`surface`]** — Staged surface transactions and the [`Compositor`]
//! boundary trait.
//!
//! **[`lifecycle`]** — The [`Lifecycle`] boundary trait for visibility,
//! configuration, and layout reconciliation.
//!
//! **[`dirty`]** — Dirty-tracking channels consumed by external
//! layout/render subsystems via
//! [`ContainerStore::drain_changes`](container::ContainerStore::drain_changes).
//!
//! [`Compositor`]: surface::Compositor
//! [`Lifecycle`]: lifecycle::Lifecycle

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod apply;
pub mod config;
pub mod container;
pub mod dirty;
mod hierarchy;
pub mod lifecycle;
pub mod surface;
pub mod sync;
pub mod transaction;
pub mod transition;
