// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{ContainerId, INVALID};
use super::store::ContainerStore;

/// An iterator over the direct children of a container, bottom to top.
///
/// Created by [`ContainerStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a ContainerStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a ContainerStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = ContainerId;

    fn next(&mut self) -> Option<ContainerId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(ContainerId {
            idx,
            generation: self.store.generation[idx as usize],
        })
    }
}
