// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition-surface boundary.
//!
//! Containers present through *composition surfaces* owned by an external
//! compositor. This crate never talks to the compositor directly; it stages
//! [`SurfaceTransaction`]s (ordered position/crop directives) and hands them
//! across the [`Compositor`] trait, which the embedding platform implements.
//! Test doubles implement the same trait to observe staged output.

use alloc::vec::Vec;

use core::fmt;

use kurbo::{Point, Rect, Size};

/// An opaque reference to a composition surface.
///
/// Surfaces are created and managed externally (by the compositor or the
/// tree owner). Core code passes them through without interpreting the
/// value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// A single staged directive against a composition surface.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    /// Move the surface's top-left corner to `position`.
    SetPosition {
        /// Target surface.
        surface: SurfaceId,
        /// New top-left corner in parent-surface coordinates.
        position: Point,
    },
    /// Crop the surface to `size`, or clear the crop when `None`.
    SetCrop {
        /// Target surface.
        surface: SurfaceId,
        /// Crop extent, or `None` to remove any crop.
        size: Option<Size>,
    },
}

/// An ordered batch of surface directives, applied atomically by the
/// compositor.
///
/// Transactions are value objects: they can be staged on a task, merged into
/// a sync set's pending commit, and eventually applied through a
/// [`Compositor`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceTransaction {
    ops: Vec<SurfaceOp>,
}

impl SurfaceTransaction {
    /// Creates an empty transaction.
    #[must_use]
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Stages a position change for `surface`.
    pub fn set_position(&mut self, surface: SurfaceId, position: Point) {
        self.ops.push(SurfaceOp::SetPosition { surface, position });
    }

    /// Stages a crop for `surface`; `None` clears any existing crop.
    pub fn set_crop(&mut self, surface: SurfaceId, size: Option<Size>) {
        self.ops.push(SurfaceOp::SetCrop { surface, size });
    }

    /// Appends all of `other`'s directives after this transaction's own.
    pub fn merge(&mut self, other: Self) {
        self.ops.extend(other.ops);
    }

    /// Returns the staged directives in order.
    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Returns whether no directives are staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Pixels captured from a composited subtree.
///
/// Produced by [`Compositor::capture`]. An all-zero extent means the capture
/// produced nothing usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Raw pixel bytes; layout is a compositor-side contract.
    pub bytes: Vec<u8>,
}

impl CaptureBuffer {
    /// Returns whether the capture holds no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.bytes.is_empty()
    }
}

/// The external compositor boundary.
///
/// The embedding platform implements this to receive staged surface
/// transactions and serve capture requests. Implementations must not call
/// back into the container tree: they are invoked while engine locks are
/// held (see the shell crate's lock-ordering contract).
pub trait Compositor {
    /// Applies a surface transaction to the live composition state.
    fn apply(&mut self, txn: &SurfaceTransaction);

    /// Captures the currently composited pixels of the subtree rooted at
    /// `surface`, cropped to `bounds`. Returns `None` when nothing could be
    /// captured.
    fn capture(&mut self, surface: SurfaceId, bounds: Rect) -> Option<CaptureBuffer>;

    /// Queues `buffer` for presentation on `target`.
    fn present(&mut self, target: SurfaceId, buffer: &CaptureBuffer);
}
