// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped caller-identity suppression.
//!
//! Permission-sensitive code deeper in the call stack consults the ambient
//! [`Identity`]. Façade entry points run their locked section *as the
//! server*: the caller's identity is suppressed on entry and restored on
//! every exit path, including errors, via the [`IdentityScope`] drop guard.

use std::fmt;
use std::sync::Mutex;

/// An opaque caller principal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallerId(pub u32);

impl fmt::Debug for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallerId({})", self.0)
    }
}

/// Who the ambient identity currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    /// The window-management server itself.
    System,
    /// An external caller.
    Caller(CallerId),
}

/// Holds the ambient identity consulted by internal permission evaluations.
#[derive(Debug)]
pub struct IdentityContext {
    current: Mutex<Identity>,
}

impl Default for IdentityContext {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityContext {
    /// Creates a context whose ambient identity is the server's own.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Identity::System),
        }
    }

    /// Returns the ambient identity.
    #[must_use]
    pub fn current(&self) -> Identity {
        *self.current.lock().expect("identity lock poisoned")
    }

    /// Makes `caller` the ambient identity until the returned scope drops.
    #[must_use]
    pub fn act_as(&self, caller: CallerId) -> IdentityScope<'_> {
        self.push(Identity::Caller(caller))
    }

    /// Suppresses the ambient identity to the server's own until the
    /// returned scope drops. Restoration is guaranteed on all exit paths.
    #[must_use]
    pub fn act_as_system(&self) -> IdentityScope<'_> {
        self.push(Identity::System)
    }

    fn push(&self, identity: Identity) -> IdentityScope<'_> {
        let mut current = self.current.lock().expect("identity lock poisoned");
        let saved = core::mem::replace(&mut *current, identity);
        IdentityScope { ctx: self, saved }
    }
}

/// Restores the previous ambient identity on drop.
#[derive(Debug)]
pub struct IdentityScope<'a> {
    ctx: &'a IdentityContext,
    saved: Identity,
}

impl Drop for IdentityScope<'_> {
    fn drop(&mut self) {
        *self.ctx.current.lock().expect("identity lock poisoned") = self.saved;
    }
}
