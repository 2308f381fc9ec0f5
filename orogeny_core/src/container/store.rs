// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays container storage with allocation, topology, and
//! property management.

use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker};

use crate::config::{Configuration, WindowingMode};
use crate::dirty;
use crate::surface::{SurfaceId, SurfaceTransaction};

use super::id::{ContainerId, INVALID};
use super::traverse::Children;
use super::{
    ActivityType, ContainerKind, DisplayAreaState, LaunchRoot, Payload, TaskParams, TaskState,
};

/// Why a task is forcibly hidden; stored as a bitmask so independent owners
/// can hide the same task without clobbering each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HiddenReason {
    /// Hidden on behalf of a task organizer.
    Organizer,
    /// Hidden while leaving pinned mode.
    Pinned,
}

impl HiddenReason {
    pub(crate) const fn bit(self) -> u32 {
        match self {
            Self::Organizer => 1 << 0,
            Self::Pinned => 1 << 1,
        }
    }
}

/// Sibling-list position for reorder and reparent operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    /// Topmost among siblings (end of the child list).
    Top,
    /// Bottommost among siblings (front of the child list).
    Bottom,
}

impl Position {
    /// Maps an organizer-supplied `to_top` flag to a position.
    #[must_use]
    pub const fn from_to_top(to_top: bool) -> Self {
        if to_top { Self::Top } else { Self::Bottom }
    }
}

/// The set of changes produced by a single
/// [`ContainerStore::drain_changes`] call.
///
/// Each field contains the raw slot indices of containers that changed in
/// the corresponding category. External layout/render subsystems use these
/// to apply incremental updates instead of rescanning the tree.
#[derive(Clone, Debug, Default)]
pub struct TreeChanges {
    /// Containers whose requested override configuration or windowing mode
    /// changed.
    pub configs: Vec<u32>,
    /// Containers whose focusable or forced-hidden state changed.
    pub visibility: Vec<u32>,
    /// Containers involved in a structural change.
    pub topology: Vec<u32>,
}

impl TreeChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.configs.clear();
        self.visibility.clear();
        self.topology.clear();
    }

    /// Returns whether no changes were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty() && self.visibility.is_empty() && self.topology.is_empty()
    }
}

/// Struct-of-arrays storage for all window containers.
///
/// Containers are addressed by [`ContainerId`] handles. Internally, each
/// container occupies a slot in parallel arrays. Destroyed containers are
/// recycled via a free list, and generation counters prevent stale handle
/// access.
///
/// The store distinguishes two API surfaces:
///
/// - The **owner API** (create/destroy/attach) panics on stale handles,
///   matching the single-owner discipline: the tree owner is the only code
///   that creates or destroys nodes, and handing it a stale handle is a
///   programming error.
/// - The **resolution API** used by the transaction engine
///   ([`is_alive`](Self::is_alive), [`is_attached`](Self::is_attached),
///   capability accessors) reports stale or mismatched handles as absent so
///   organizer-supplied tokens can be skipped rather than crash the batch.
#[derive(Debug)]
pub struct ContainerStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Node identity & payload --
    payload: Vec<Payload>,
    pub(crate) generation: Vec<u32>,

    // -- Common properties --
    config: Vec<Configuration>,
    windowing_mode: Vec<WindowingMode>,
    focusable: Vec<bool>,
    surface: Vec<Option<SurfaceId>>,

    // -- Allocation --
    free_list: Vec<u32>,
    len: u32,

    // -- Dirty tracking --
    dirty: DirtyTracker<u32>,
}

impl Default for ContainerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerStore {
    /// Creates an empty container store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            payload: Vec::new(),
            generation: Vec::new(),
            config: Vec::new(),
            windowing_mode: Vec::new(),
            focusable: Vec::new(),
            surface: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Allocation API (owner only) --

    /// Creates a new generic container and returns its handle.
    pub fn create_container(&mut self) -> ContainerId {
        self.alloc(Payload::Container)
    }

    /// Creates a new task container.
    pub fn create_task(&mut self, params: TaskParams) -> ContainerId {
        self.alloc(Payload::Task(TaskState {
            created_by_organizer: params.created_by_organizer,
            organized: false,
            hidden_reasons: 0,
            activity_type: params.activity_type,
            resizeable: params.resizeable,
            activity_windowing_mode: WindowingMode::Undefined,
            pending_surface_transaction: None,
        }))
    }

    /// Creates a new display-area container.
    ///
    /// A display area with `default_task_area` set is where tasks land when
    /// a reparent names no explicit destination on its display.
    pub fn create_display_area(&mut self, default_task_area: bool) -> ContainerId {
        self.alloc(Payload::DisplayArea(DisplayAreaState {
            ignore_orientation_request: false,
            default_task_area,
            launch_roots: Vec::new(),
        }))
    }

    fn alloc(&mut self, payload: Payload) -> ContainerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            self.generation[idx as usize] += 1;
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.payload[idx as usize] = payload;
            self.config[idx as usize] = Configuration::default();
            self.windowing_mode[idx as usize] = WindowingMode::Undefined;
            self.focusable[idx as usize] = true;
            self.surface[idx as usize] = None;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.payload.push(payload);
            self.config.push(Configuration::default());
            self.windowing_mode.push(WindowingMode::Undefined);
            self.focusable.push(true);
            self.surface.push(None);
            self.generation.push(0);
            idx
        };

        ContainerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a container, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the container has children (remove them first) or if the
    /// handle is stale.
    pub fn destroy(&mut self, id: ContainerId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy container with children"
        );

        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::TOPOLOGY);
        }

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail resolution.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live container.
    #[must_use]
    pub fn is_alive(&self, id: ContainerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API (owner + hierarchy processor) --

    /// Adds `child` as the topmost child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: ContainerId, child: ContainerId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );
        self.link_child(parent.idx, child.idx, Position::Top);
        self.mark_topology(parent.idx);
        self.mark_topology(child.idx);
    }

    /// Removes `child` from its current parent, detaching its subtree.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the container has no parent.
    pub fn remove_from_parent(&mut self, child: ContainerId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "container has no parent");
        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.mark_topology(p);
        self.mark_topology(c);
    }

    /// Moves `child` under `new_parent` at the given sibling position.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn reparent(&mut self, child: ContainerId, new_parent: ContainerId, pos: Position) {
        self.validate(child);
        self.validate(new_parent);

        if self.parent[child.idx as usize] != INVALID {
            let old_p = self.parent[child.idx as usize];
            self.unlink_from_parent(child.idx);
            self.mark_topology(old_p);
        }
        self.link_child(new_parent.idx, child.idx, pos);
        self.mark_topology(new_parent.idx);
        self.mark_topology(child.idx);
    }

    /// Repositions `child` among its current siblings without changing its
    /// parent. Returns whether the container actually moved; repositioning
    /// to an already-held end is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the container has no parent.
    pub fn position_child(&mut self, child: ContainerId, pos: Position) -> bool {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "container has no parent");
        let already_there = match pos {
            Position::Top => self.next_sibling[c as usize] == INVALID,
            Position::Bottom => self.prev_sibling[c as usize] == INVALID,
        };
        if already_there {
            return false;
        }
        self.unlink_from_parent(c);
        self.link_child(p, c, pos);
        self.mark_topology(p);
        self.mark_topology(c);
        true
    }

    /// Returns the parent of a container, if any.
    #[must_use]
    pub fn parent(&self, id: ContainerId) -> Option<ContainerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns an iterator over the direct children of a container, bottom
    /// to top.
    #[must_use]
    pub fn children(&self, id: ContainerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    // -- Resolution API (transaction engine) --

    /// Returns whether the container is attached: live, with its topmost
    /// ancestor being a display area.
    ///
    /// Stale handles resolve to `false` rather than panicking, so
    /// organizer-supplied tokens can be rejected gracefully.
    #[must_use]
    pub fn is_attached(&self, id: ContainerId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let root = self.root_idx(id.idx);
        matches!(self.payload[root as usize], Payload::DisplayArea(_))
    }

    /// Returns the container's kind discriminant.
    #[must_use]
    pub fn kind(&self, id: ContainerId) -> ContainerKind {
        self.validate(id);
        match self.payload[id.idx as usize] {
            Payload::Container => ContainerKind::Container,
            Payload::Task(_) => ContainerKind::Task,
            Payload::DisplayArea(_) => ContainerKind::DisplayArea,
        }
    }

    /// Returns the task payload of a container, or `None` when the handle is
    /// stale or the container is not a task.
    #[must_use]
    pub fn task_state(&self, id: ContainerId) -> Option<&TaskState> {
        if !self.is_alive(id) {
            return None;
        }
        match &self.payload[id.idx as usize] {
            Payload::Task(task) => Some(task),
            _ => None,
        }
    }

    /// Mutable variant of [`task_state`](Self::task_state).
    #[must_use]
    pub fn task_state_mut(&mut self, id: ContainerId) -> Option<&mut TaskState> {
        if !self.is_alive(id) {
            return None;
        }
        match &mut self.payload[id.idx as usize] {
            Payload::Task(task) => Some(task),
            _ => None,
        }
    }

    /// Returns the display-area payload of a container, or `None` when the
    /// handle is stale or the container is not a display area.
    #[must_use]
    pub fn display_area_state(&self, id: ContainerId) -> Option<&DisplayAreaState> {
        if !self.is_alive(id) {
            return None;
        }
        match &self.payload[id.idx as usize] {
            Payload::DisplayArea(area) => Some(area),
            _ => None,
        }
    }

    /// Mutable variant of [`display_area_state`](Self::display_area_state).
    #[must_use]
    pub fn display_area_state_mut(&mut self, id: ContainerId) -> Option<&mut DisplayAreaState> {
        if !self.is_alive(id) {
            return None;
        }
        match &mut self.payload[id.idx as usize] {
            Payload::DisplayArea(area) => Some(area),
            _ => None,
        }
    }

    /// Returns the nearest display area at or above `id`.
    #[must_use]
    pub fn display_area_of(&self, id: ContainerId) -> Option<ContainerId> {
        self.validate(id);
        let mut cur = id.idx;
        loop {
            if matches!(self.payload[cur as usize], Payload::DisplayArea(_)) {
                return Some(self.handle(cur));
            }
            let p = self.parent[cur as usize];
            if p == INVALID {
                return None;
            }
            cur = p;
        }
    }

    /// Returns the default task area of the display containing `id`: the
    /// first display area in the display's subtree flagged as the default
    /// landing area, falling back to the display root itself.
    ///
    /// Returns `None` when `id` is not attached to a display.
    #[must_use]
    pub fn default_task_area(&self, id: ContainerId) -> Option<ContainerId> {
        if !self.is_alive(id) {
            return None;
        }
        let root = self.root_idx(id.idx);
        if !matches!(self.payload[root as usize], Payload::DisplayArea(_)) {
            return None;
        }
        self.find_default_area(root).or(Some(self.handle(root)))
    }

    fn find_default_area(&self, idx: u32) -> Option<ContainerId> {
        if let Payload::DisplayArea(area) = &self.payload[idx as usize] {
            if area.default_task_area {
                return Some(self.handle(idx));
            }
        }
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            if let Some(found) = self.find_default_area(child) {
                return Some(found);
            }
            child = self.next_sibling[child as usize];
        }
        None
    }

    /// Returns whether `id` is a root task: a task parented directly to a
    /// display area.
    #[must_use]
    pub fn is_root_task(&self, id: ContainerId) -> bool {
        if self.task_state(id).is_none() {
            return false;
        }
        let p = self.parent[id.idx as usize];
        p != INVALID && matches!(self.payload[p as usize], Payload::DisplayArea(_))
    }

    /// Returns whether `id` is a leaf task: a task with no task children.
    #[must_use]
    pub fn is_leaf_task(&self, id: ContainerId) -> bool {
        if self.task_state(id).is_none() {
            return false;
        }
        let mut child = self.first_child[id.idx as usize];
        while child != INVALID {
            if matches!(self.payload[child as usize], Payload::Task(_)) {
                return false;
            }
            child = self.next_sibling[child as usize];
        }
        true
    }

    /// Returns the topmost task at or above `id` (the root-task ancestor).
    #[must_use]
    pub fn root_task_of(&self, id: ContainerId) -> Option<ContainerId> {
        if self.task_state(id).is_none() {
            return None;
        }
        let mut cur = id.idx;
        loop {
            let p = self.parent[cur as usize];
            if p == INVALID || !matches!(self.payload[p as usize], Payload::Task(_)) {
                return Some(self.handle(cur));
            }
            cur = p;
        }
    }

    /// Collects every task in the subtree rooted at `id`, depth first.
    ///
    /// With `top_down` set, topmost siblings are visited first; otherwise
    /// bottommost first. The result is a snapshot, safe to mutate the tree
    /// against while iterating.
    #[must_use]
    pub fn tasks_of(&self, id: ContainerId, top_down: bool) -> Vec<ContainerId> {
        self.validate(id);
        let mut out = Vec::new();
        self.collect_tasks(id.idx, top_down, &mut out);
        out
    }

    fn collect_tasks(&self, idx: u32, top_down: bool, out: &mut Vec<ContainerId>) {
        if matches!(self.payload[idx as usize], Payload::Task(_)) {
            out.push(self.handle(idx));
        }
        let mut siblings = Vec::new();
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            siblings.push(child);
            child = self.next_sibling[child as usize];
        }
        if top_down {
            siblings.reverse();
        }
        for child in siblings {
            self.collect_tasks(child, top_down, out);
        }
    }

    // -- Common property access --

    /// Returns the requested override configuration of a container.
    #[must_use]
    pub fn override_configuration(&self, id: ContainerId) -> &Configuration {
        self.validate(id);
        &self.config[id.idx as usize]
    }

    /// Replaces the requested override configuration through the normal
    /// configuration-changed notification path.
    pub fn set_override_configuration(&mut self, id: ContainerId, config: Configuration) {
        self.validate(id);
        self.config[id.idx as usize] = config;
        self.dirty.mark(id.idx, dirty::CONFIG);
    }

    /// Merges the masked axes of `incoming` into the requested override
    /// configuration *without* emitting a configuration change.
    ///
    /// Used when a windowing-mode change rides in the same transaction
    /// entry: the caller must follow up with
    /// [`set_windowing_mode`](Self::set_windowing_mode), which emits the one
    /// combined change.
    pub fn merge_override_configuration(
        &mut self,
        id: ContainerId,
        incoming: &Configuration,
        config_mask: u32,
        window_mask: u32,
    ) {
        self.validate(id);
        self.config[id.idx as usize].set_to(incoming, config_mask, window_mask);
    }

    /// Returns the container's own windowing mode.
    #[must_use]
    pub fn windowing_mode(&self, id: ContainerId) -> WindowingMode {
        self.validate(id);
        self.windowing_mode[id.idx as usize]
    }

    /// Returns the effective windowing mode: the container's own mode, or
    /// the nearest ancestor's mode when the container's is undefined.
    #[must_use]
    pub fn effective_windowing_mode(&self, id: ContainerId) -> WindowingMode {
        self.validate(id);
        let mut cur = id.idx;
        loop {
            let mode = self.windowing_mode[cur as usize];
            if mode != WindowingMode::Undefined {
                return mode;
            }
            let p = self.parent[cur as usize];
            if p == INVALID {
                return WindowingMode::Undefined;
            }
            cur = p;
        }
    }

    /// Sets the container's windowing mode.
    pub fn set_windowing_mode(&mut self, id: ContainerId, mode: WindowingMode) {
        self.validate(id);
        self.windowing_mode[id.idx as usize] = mode;
        self.dirty.mark(id.idx, dirty::CONFIG);
    }

    /// Returns whether the container is focusable.
    #[must_use]
    pub fn is_focusable(&self, id: ContainerId) -> bool {
        self.validate(id);
        self.focusable[id.idx as usize]
    }

    /// Sets the focusable flag; returns whether the value actually changed.
    pub fn set_focusable(&mut self, id: ContainerId, focusable: bool) -> bool {
        self.validate(id);
        if self.focusable[id.idx as usize] == focusable {
            return false;
        }
        self.focusable[id.idx as usize] = focusable;
        self.dirty.mark(id.idx, dirty::VISIBILITY);
        true
    }

    /// Returns the container's composition surface, if one is bound.
    #[must_use]
    pub fn surface(&self, id: ContainerId) -> Option<SurfaceId> {
        self.validate(id);
        self.surface[id.idx as usize]
    }

    /// Binds (or unbinds) the container's composition surface.
    pub fn set_surface(&mut self, id: ContainerId, surface: Option<SurfaceId>) {
        self.validate(id);
        self.surface[id.idx as usize] = surface;
    }

    // -- Task property access --

    /// Sets or clears a forced-hidden reason on a task; returns whether the
    /// task's overall hidden state flipped.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the container is not a task.
    pub fn set_force_hidden(&mut self, id: ContainerId, reason: HiddenReason, hidden: bool) -> bool {
        let idx = id.idx;
        let task = self
            .task_state_mut(id)
            .expect("set_force_hidden requires a task");
        let was_hidden = task.hidden_reasons != 0;
        if hidden {
            task.hidden_reasons |= reason.bit();
        } else {
            task.hidden_reasons &= !reason.bit();
        }
        let now_hidden = task.hidden_reasons != 0;
        if was_hidden != now_hidden {
            self.dirty.mark(idx, dirty::VISIBILITY);
            return true;
        }
        false
    }

    /// Marks a task as claimed (or released) by an organizer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the container is not a task.
    pub fn set_task_organized(&mut self, id: ContainerId, organized: bool) {
        let task = self
            .task_state_mut(id)
            .expect("set_task_organized requires a task");
        task.organized = organized;
    }

    /// Stages a pending main-window surface transaction on a task, replacing
    /// any previous one.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the container is not a task.
    pub fn set_pending_surface_transaction(&mut self, id: ContainerId, txn: SurfaceTransaction) {
        let task = self
            .task_state_mut(id)
            .expect("set_pending_surface_transaction requires a task");
        task.pending_surface_transaction = Some(txn);
    }

    /// Takes the pending main-window surface transaction off a task.
    #[must_use]
    pub fn take_pending_surface_transaction(
        &mut self,
        id: ContainerId,
    ) -> Option<SurfaceTransaction> {
        self.task_state_mut(id)?.pending_surface_transaction.take()
    }

    // -- Display-area property access --

    /// Sets the ignore-orientation-request flag on a display area; returns
    /// whether the value actually changed.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the container is not a display area.
    pub fn set_ignore_orientation_request(&mut self, id: ContainerId, ignore: bool) -> bool {
        let idx = id.idx;
        let area = self
            .display_area_state_mut(id)
            .expect("set_ignore_orientation_request requires a display area");
        if area.ignore_orientation_request == ignore {
            return false;
        }
        area.ignore_orientation_request = ignore;
        self.dirty.mark(idx, dirty::CONFIG);
        true
    }

    /// Registers `task` as the launch root on display area `area` for tasks
    /// matching the given windowing-mode and activity-type filters,
    /// replacing any previous registration for the same task.
    ///
    /// # Panics
    ///
    /// Panics if `area` is not a display area.
    pub fn set_launch_root(
        &mut self,
        area: ContainerId,
        task: ContainerId,
        windowing_modes: Vec<WindowingMode>,
        activity_types: Vec<ActivityType>,
    ) {
        let state = self
            .display_area_state_mut(area)
            .expect("set_launch_root requires a display area");
        let root = LaunchRoot {
            task,
            windowing_modes,
            activity_types,
        };
        if let Some(existing) = state.launch_roots.iter_mut().find(|r| r.task == task) {
            *existing = root;
        } else {
            state.launch_roots.push(root);
        }
    }

    /// Looks up the launch root registered on `area` for the given mode and
    /// activity type, most recent registration first.
    #[must_use]
    pub fn launch_root_for(
        &self,
        area: ContainerId,
        mode: WindowingMode,
        activity_type: ActivityType,
    ) -> Option<ContainerId> {
        let state = self.display_area_state(area)?;
        state
            .launch_roots
            .iter()
            .rev()
            .find(|r| r.windowing_modes.contains(&mode) && r.activity_types.contains(&activity_type))
            .map(|r| r.task)
    }

    // -- Change draining --

    /// Drains all dirty channels, returning the accumulated change sets.
    pub fn drain_changes(&mut self) -> TreeChanges {
        let mut changes = TreeChanges::default();
        self.drain_changes_into(&mut changes);
        changes
    }

    /// Like [`drain_changes`](Self::drain_changes), but reuses a
    /// caller-provided buffer to avoid allocation.
    pub fn drain_changes_into(&mut self, changes: &mut TreeChanges) {
        changes.clear();
        changes.configs = self
            .dirty
            .drain(dirty::CONFIG)
            .deterministic()
            .run()
            .collect();
        changes.visibility = self
            .dirty
            .drain(dirty::VISIBILITY)
            .deterministic()
            .run()
            .collect();
        changes.topology = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    fn validate(&self, id: ContainerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale ContainerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn handle(&self, idx: u32) -> ContainerId {
        ContainerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn root_idx(&self, mut idx: u32) -> u32 {
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
        }
        idx
    }

    fn mark_topology(&mut self, idx: u32) {
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Links `c` into `p`'s child list at the given end.
    fn link_child(&mut self, p: u32, c: u32, pos: Position) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        match pos {
            Position::Top => {
                if self.first_child[p as usize] == INVALID {
                    self.first_child[p as usize] = c;
                } else {
                    // Walk to the topmost child.
                    let mut last = self.first_child[p as usize];
                    while self.next_sibling[last as usize] != INVALID {
                        last = self.next_sibling[last as usize];
                    }
                    self.next_sibling[last as usize] = c;
                    self.prev_sibling[c as usize] = last;
                }
            }
            Position::Bottom => {
                let head = self.first_child[p as usize];
                if head != INVALID {
                    self.next_sibling[c as usize] = head;
                    self.prev_sibling[head as usize] = c;
                }
                self.first_child[p as usize] = c;
            }
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty
    /// state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn task(store: &mut ContainerStore) -> ContainerId {
        store.create_task(TaskParams::default())
    }

    #[test]
    fn create_and_destroy() {
        let mut store = ContainerStore::new();
        let id = store.create_container();
        assert!(store.is_alive(id));
        store.destroy(id);
        assert!(!store.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = ContainerStore::new();
        let id1 = store.create_container();
        store.destroy(id1);
        let id2 = store.create_container();
        // id2 reuses the same slot but has a different generation.
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn add_child_and_query() {
        let mut store = ContainerStore::new();
        let parent = store.create_display_area(true);
        let a = task(&mut store);
        let b = task(&mut store);

        store.add_child(parent, a);
        store.add_child(parent, b);

        assert_eq!(store.parent(a), Some(parent));
        assert_eq!(store.parent(b), Some(parent));

        // Bottom to top: a was added first, so it is bottommost.
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn position_child_moves_within_siblings() {
        let mut store = ContainerStore::new();
        let parent = store.create_display_area(true);
        let a = task(&mut store);
        let b = task(&mut store);
        let c = task(&mut store);
        store.add_child(parent, a);
        store.add_child(parent, b);
        store.add_child(parent, c);

        assert!(store.position_child(a, Position::Top));
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![b, c, a]);

        assert!(
            !store.position_child(a, Position::Top),
            "already topmost: no move"
        );

        assert!(store.position_child(a, Position::Bottom));
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
    }

    #[test]
    fn reparent_positions_at_requested_end() {
        let mut store = ContainerStore::new();
        let p1 = store.create_display_area(true);
        let p2 = store.create_display_area(false);
        let a = task(&mut store);
        let b = task(&mut store);
        store.add_child(p1, a);
        store.add_child(p2, b);

        store.reparent(a, p2, Position::Bottom);
        assert_eq!(store.parent(a), Some(p2));
        let kids: Vec<_> = store.children(p2).collect();
        assert_eq!(kids, vec![a, b]);
        assert!(store.children(p1).next().is_none());
    }

    #[test]
    fn attachment_requires_display_area_root() {
        let mut store = ContainerStore::new();
        let display = store.create_display_area(true);
        let t = task(&mut store);
        let orphan = task(&mut store);

        assert!(store.is_attached(display), "display roots are attached");
        assert!(!store.is_attached(t), "unparented task is detached");

        store.add_child(display, t);
        assert!(store.is_attached(t));

        store.remove_from_parent(t);
        assert!(!store.is_attached(t));
        assert!(!store.is_attached(orphan));
    }

    #[test]
    fn stale_handle_is_not_attached() {
        let mut store = ContainerStore::new();
        let t = task(&mut store);
        store.destroy(t);
        assert!(!store.is_attached(t));
    }

    #[test]
    fn capability_accessors_return_none_on_kind_mismatch() {
        let mut store = ContainerStore::new();
        let t = task(&mut store);
        let area = store.create_display_area(true);
        let generic = store.create_container();

        assert!(store.task_state(t).is_some());
        assert!(store.task_state(area).is_none());
        assert!(store.task_state(generic).is_none());
        assert!(store.display_area_state(area).is_some());
        assert!(store.display_area_state(t).is_none());
    }

    #[test]
    fn default_task_area_prefers_flagged_descendant() {
        let mut store = ContainerStore::new();
        let display = store.create_display_area(false);
        let nested = store.create_display_area(true);
        let t = task(&mut store);
        store.add_child(display, nested);
        store.add_child(nested, t);

        assert_eq!(store.default_task_area(t), Some(nested));
        assert_eq!(store.default_task_area(display), Some(nested));
    }

    #[test]
    fn default_task_area_falls_back_to_display_root() {
        let mut store = ContainerStore::new();
        let display = store.create_display_area(false);
        let t = task(&mut store);
        store.add_child(display, t);

        assert_eq!(store.default_task_area(t), Some(display));
    }

    #[test]
    fn default_task_area_none_when_detached() {
        let mut store = ContainerStore::new();
        let t = task(&mut store);
        assert_eq!(store.default_task_area(t), None);
    }

    #[test]
    fn root_and_leaf_task_are_derived_from_topology() {
        let mut store = ContainerStore::new();
        let display = store.create_display_area(true);
        let root = task(&mut store);
        let leaf = task(&mut store);
        store.add_child(display, root);
        store.add_child(root, leaf);

        assert!(store.is_root_task(root));
        assert!(!store.is_root_task(leaf));
        assert!(store.is_leaf_task(leaf));
        assert!(!store.is_leaf_task(root));
        assert_eq!(store.root_task_of(leaf), Some(root));
        assert_eq!(store.root_task_of(root), Some(root));
    }

    #[test]
    fn effective_windowing_mode_inherits_from_ancestors() {
        let mut store = ContainerStore::new();
        let display = store.create_display_area(true);
        let root = task(&mut store);
        let leaf = task(&mut store);
        store.add_child(display, root);
        store.add_child(root, leaf);
        store.set_windowing_mode(root, WindowingMode::MultiWindow);

        assert_eq!(
            store.effective_windowing_mode(leaf),
            WindowingMode::MultiWindow
        );
        assert_eq!(store.windowing_mode(leaf), WindowingMode::Undefined);
    }

    #[test]
    fn tasks_of_orders_by_direction() {
        let mut store = ContainerStore::new();
        let display = store.create_display_area(true);
        let a = task(&mut store);
        let b = task(&mut store);
        store.add_child(display, a);
        store.add_child(display, b);

        assert_eq!(store.tasks_of(display, false), vec![a, b]);
        assert_eq!(store.tasks_of(display, true), vec![b, a]);
    }

    #[test]
    fn set_focusable_reports_flips_only() {
        let mut store = ContainerStore::new();
        let t = task(&mut store);
        assert!(store.is_focusable(t));
        assert!(store.set_focusable(t, false));
        assert!(!store.set_focusable(t, false), "no flip on same value");
        assert!(store.set_focusable(t, true));
    }

    #[test]
    fn force_hidden_tracks_reasons_independently() {
        let mut store = ContainerStore::new();
        let t = task(&mut store);

        assert!(store.set_force_hidden(t, HiddenReason::Organizer, true));
        // Second reason does not flip the overall state.
        assert!(!store.set_force_hidden(t, HiddenReason::Pinned, true));
        // Clearing one reason leaves the task hidden by the other.
        assert!(!store.set_force_hidden(t, HiddenReason::Organizer, false));
        assert!(store.set_force_hidden(t, HiddenReason::Pinned, false));
        assert!(!store.task_state(t).unwrap().is_hidden());
    }

    #[test]
    fn launch_root_registration_replaces_per_task() {
        let mut store = ContainerStore::new();
        let display = store.create_display_area(true);
        let t = task(&mut store);
        store.add_child(display, t);

        store.set_launch_root(
            display,
            t,
            vec![WindowingMode::MultiWindow],
            vec![ActivityType::Standard],
        );
        assert_eq!(
            store.launch_root_for(display, WindowingMode::MultiWindow, ActivityType::Standard),
            Some(t)
        );
        assert_eq!(
            store.launch_root_for(display, WindowingMode::Pinned, ActivityType::Standard),
            None
        );

        // Re-registering the same task replaces its filters.
        store.set_launch_root(
            display,
            t,
            vec![WindowingMode::Fullscreen],
            vec![ActivityType::Home],
        );
        assert_eq!(
            store.launch_root_for(display, WindowingMode::MultiWindow, ActivityType::Standard),
            None
        );
        assert_eq!(
            store.launch_root_for(display, WindowingMode::Fullscreen, ActivityType::Home),
            Some(t)
        );
    }

    #[test]
    fn drain_changes_reports_channels() {
        let mut store = ContainerStore::new();
        let display = store.create_display_area(true);
        let t = task(&mut store);
        let other = task(&mut store);
        store.add_child(display, t);
        store.add_child(display, other);
        let _ = store.drain_changes();

        assert!(store.set_focusable(t, false));
        store.set_windowing_mode(t, WindowingMode::MultiWindow);
        assert!(store.position_child(t, Position::Top));

        let changes = store.drain_changes();
        assert!(changes.visibility.contains(&t.idx));
        assert!(changes.configs.contains(&t.idx));
        assert!(changes.topology.contains(&t.idx));
        assert!(changes.topology.contains(&display.idx));

        // Second drain is empty.
        assert!(store.drain_changes().is_empty());
    }

    #[test]
    #[should_panic(expected = "cannot destroy container with children")]
    fn destroy_with_children_panics() {
        let mut store = ContainerStore::new();
        let parent = store.create_display_area(true);
        let child = task(&mut store);
        store.add_child(parent, child);
        store.destroy(parent);
    }

    #[test]
    #[should_panic(expected = "stale ContainerId")]
    fn destroyed_handle_panics_on_add_child() {
        let mut store = ContainerStore::new();
        let root = store.create_display_area(true);
        let id = store.create_container();
        store.destroy(id);
        store.add_child(root, id);
    }

    #[test]
    #[should_panic(expected = "stale ContainerId")]
    fn destroyed_handle_panics_on_parent() {
        let mut store = ContainerStore::new();
        let id = store.create_container();
        store.destroy(id);
        let _ = store.parent(id);
    }
}
