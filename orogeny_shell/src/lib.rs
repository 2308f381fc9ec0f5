// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Locking coordination façade for transactional window organization.
//!
//! `orogeny_shell` wraps the single-threaded engine in `orogeny_core` with
//! the pieces a live window-management server needs:
//!
//! - **[`organizer`]** — [`WindowOrganizer`](organizer::WindowOrganizer),
//!   the externally callable entry points (fire-and-forget apply,
//!   synchronous-confirmed apply, transition-scoped apply,
//!   transition-finish, screenshot capture), each permission-checked and
//!   executed under the global tree lock for its whole duration.
//! - **[`identity`]** — scoped caller-identity suppression: the locked
//!   section always runs as the server, with guaranteed restoration.
//! - **[`organizers`]** — task and display-area organizer registries
//!   (boundary bookkeeping; callback delivery lives outside this
//!   workspace).
//!
//! # Concurrency contract
//!
//! The container tree is one shared mutable resource guarded by one global
//! lock. Façade entry points hold it for their entire call, so no partial
//! transaction is ever observable. The sync barrier and transition services
//! have their own locks, acquired strictly after the tree lock; neither
//! they, nor any [`Lifecycle`](orogeny_core::lifecycle::Lifecycle) /
//! [`Compositor`](orogeny_core::surface::Compositor) / completion / player
//! implementation, may re-enter the tree lock. Compositor commit
//! confirmations enter through
//! [`on_surface_committed`](organizer::WindowOrganizer::on_surface_committed),
//! which takes only the barrier-side locks.

pub mod identity;
pub mod organizer;
pub mod organizers;
