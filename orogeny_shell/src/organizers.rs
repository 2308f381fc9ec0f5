// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Organizer registries.
//!
//! External organizers claim management rights over containers of a given
//! kind: task organizers register per windowing mode, display-area
//! organizers per display-area feature. The transaction engine only
//! consumes the boolean facts recorded on task state
//! ([`TaskState::is_organized`](orogeny_core::container::TaskState::is_organized));
//! everything else about organizer callbacks and lifecycles lives outside
//! this workspace.

use std::fmt;

use orogeny_core::config::WindowingMode;

/// Identifies a registered organizer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrganizerId(u32);

impl fmt::Debug for OrganizerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrganizerId({})", self.0)
    }
}

/// An opaque display-area feature tag organizers register against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DisplayAreaFeature(pub u32);

/// Registry of task organizers, keyed by windowing mode.
///
/// One organizer per mode; a later registration for the same mode replaces
/// the earlier one, matching the last-wins contract organizers expect.
#[derive(Debug, Default)]
pub struct TaskOrganizerRegistry {
    next_id: u32,
    registered: Vec<(OrganizerId, WindowingMode)>,
}

impl TaskOrganizerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an organizer for `mode`, replacing any previous one.
    pub fn register(&mut self, mode: WindowingMode) -> OrganizerId {
        let id = OrganizerId(self.next_id);
        self.next_id += 1;
        self.registered.retain(|(_, m)| *m != mode);
        self.registered.push((id, mode));
        id
    }

    /// Removes a registration. Returns whether it existed.
    pub fn unregister(&mut self, id: OrganizerId) -> bool {
        let before = self.registered.len();
        self.registered.retain(|(i, _)| *i != id);
        self.registered.len() != before
    }

    /// Returns the organizer registered for `mode`, if any.
    #[must_use]
    pub fn organizer_for(&self, mode: WindowingMode) -> Option<OrganizerId> {
        self.registered
            .iter()
            .find(|(_, m)| *m == mode)
            .map(|(id, _)| *id)
    }

    /// Returns whether any organizer claims `mode`.
    #[must_use]
    pub fn is_organized(&self, mode: WindowingMode) -> bool {
        self.organizer_for(mode).is_some()
    }
}

/// Registry of display-area organizers, keyed by feature.
#[derive(Debug, Default)]
pub struct DisplayAreaOrganizerRegistry {
    next_id: u32,
    registered: Vec<(OrganizerId, DisplayAreaFeature)>,
}

impl DisplayAreaOrganizerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an organizer for `feature`, replacing any previous one.
    pub fn register(&mut self, feature: DisplayAreaFeature) -> OrganizerId {
        let id = OrganizerId(self.next_id);
        self.next_id += 1;
        self.registered.retain(|(_, f)| *f != feature);
        self.registered.push((id, feature));
        id
    }

    /// Removes a registration. Returns whether it existed.
    pub fn unregister(&mut self, id: OrganizerId) -> bool {
        let before = self.registered.len();
        self.registered.retain(|(i, _)| *i != id);
        self.registered.len() != before
    }

    /// Returns the organizer registered for `feature`, if any.
    #[must_use]
    pub fn organizer_for(&self, feature: DisplayAreaFeature) -> Option<OrganizerId> {
        self.registered
            .iter()
            .find(|(_, f)| *f == feature)
            .map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_registration_is_last_wins_per_mode() {
        let mut registry = TaskOrganizerRegistry::new();
        let first = registry.register(WindowingMode::MultiWindow);
        let second = registry.register(WindowingMode::MultiWindow);

        assert_eq!(
            registry.organizer_for(WindowingMode::MultiWindow),
            Some(second)
        );
        assert!(!registry.unregister(first), "replaced registration is gone");
        assert!(registry.is_organized(WindowingMode::MultiWindow));
    }

    #[test]
    fn unregister_clears_the_claim() {
        let mut registry = TaskOrganizerRegistry::new();
        let id = registry.register(WindowingMode::Pinned);
        assert!(registry.unregister(id));
        assert!(!registry.is_organized(WindowingMode::Pinned));
    }

    #[test]
    fn display_area_registry_keys_by_feature() {
        let mut registry = DisplayAreaOrganizerRegistry::new();
        let root = registry.register(DisplayAreaFeature(0));
        let ime = registry.register(DisplayAreaFeature(1));

        assert_eq!(registry.organizer_for(DisplayAreaFeature(0)), Some(root));
        assert_eq!(registry.organizer_for(DisplayAreaFeature(1)), Some(ime));
        assert!(registry.unregister(root));
        assert_eq!(registry.organizer_for(DisplayAreaFeature(0)), None);
    }
}
