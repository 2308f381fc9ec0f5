// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchy operation processing.
//!
//! Each [`HierarchyOp`] variant has bespoke legality checks and tree-mutation
//! semantics. The processor holds no state of its own; everything is per
//! call. Two failure grades exist:
//!
//! - **Stale or unresolvable references** short-circuit the single operation
//!   as a logged no-op; the rest of the batch proceeds.
//! - **Structural violations** (non-task targets, unsupported leaf-task
//!   reparents, children-reparents with no endpoints) fail the whole apply
//!   with a typed error.
//!
//! Successful structural mutations contribute the lifecycle effect; no-ops
//! contribute nothing.

use alloc::vec::Vec;

use crate::apply::{ApplyError, Effects, SyncRef};
use crate::config::{ActivityType, WindowingMode};
use crate::container::{ContainerId, ContainerKind, ContainerStore, Position};
use crate::transaction::HierarchyOp;
use crate::transition::Transition;

pub(crate) fn apply_hierarchy_op(
    store: &mut ContainerStore,
    op: &HierarchyOp,
    sync: &mut Option<SyncRef<'_>>,
    transition: &mut Option<&mut Transition>,
) -> Result<Effects, ApplyError> {
    match op {
        HierarchyOp::SetLaunchRoot {
            container,
            windowing_modes,
            activity_types,
        } => set_launch_root(store, *container, windowing_modes, activity_types),
        HierarchyOp::ReparentChildren {
            current_parent,
            new_parent,
            windowing_modes,
            activity_types,
            to_top,
        } => reparent_children(
            store,
            sync,
            transition,
            *current_parent,
            *new_parent,
            windowing_modes,
            activity_types,
            *to_top,
        ),
        HierarchyOp::Reorder { container, to_top } => {
            reorder_or_reparent(store, sync, transition, *container, None, false, *to_top)
        }
        HierarchyOp::Reparent {
            container,
            new_parent,
            to_top,
        } => reorder_or_reparent(store, sync, transition, *container, *new_parent, true, *to_top),
    }
}

/// Shared front half of Reorder and Reparent: resolution, sync tagging, and
/// transition collection, then the sanitized mutation.
fn reorder_or_reparent(
    store: &mut ContainerStore,
    sync: &mut Option<SyncRef<'_>>,
    transition: &mut Option<&mut Transition>,
    container: ContainerId,
    new_parent: Option<ContainerId>,
    is_reparent: bool,
    to_top: bool,
) -> Result<Effects, ApplyError> {
    if !store.is_attached(container) {
        log::error!("attempt to operate on detached container: {container:?}");
        return Ok(Effects::NONE);
    }
    if let Some(sync) = sync.as_mut() {
        sync.engine.add_to_sync_set(sync.id, container);
    }
    if let Some(t) = transition.as_deref_mut() {
        t.collect(container);
        if is_reparent {
            // The current parent's visibility may change as a result of this
            // reparenting.
            if let Some(parent) = store.parent(container) {
                t.collect(parent);
            }
            if let Some(requested) = new_parent {
                if !store.is_alive(requested) {
                    log::error!("can't resolve new parent from token {requested:?}");
                    return Ok(Effects::NONE);
                }
                t.collect(requested);
            }
        }
    }
    sanitize_and_apply(store, container, new_parent, is_reparent, to_top)
}

fn sanitize_and_apply(
    store: &mut ContainerStore,
    container: ContainerId,
    new_parent: Option<ContainerId>,
    is_reparent: bool,
    to_top: bool,
) -> Result<Effects, ApplyError> {
    if store.task_state(container).is_none() {
        return Err(ApplyError::InvalidHierarchyTarget);
    }
    let pos = Position::from_to_top(to_top);

    if !is_reparent {
        return Ok(if store.position_child(container, pos) {
            Effects::LIFECYCLE
        } else {
            Effects::NONE
        });
    }

    // A task may only be reparented when it is a root task, or its current
    // parent was itself created by an organizer. Anything else is an
    // unsupported leaf-task move.
    let rootable = store.is_root_task(container)
        || store
            .parent(container)
            .and_then(|p| store.task_state(p))
            .is_some_and(|t| t.created_by_organizer());
    if !rootable {
        return Err(ApplyError::UnsupportedReparent);
    }

    let resolved = match new_parent {
        Some(requested) => {
            if !store.is_alive(requested) {
                log::error!("can't resolve new parent from token {requested:?}");
                return Ok(Effects::NONE);
            }
            requested
        }
        None => match store.default_task_area(container) {
            Some(area) => area,
            None => {
                log::error!("no default task area for {container:?}");
                return Ok(Effects::NONE);
            }
        },
    };

    if store.parent(container) != Some(resolved) {
        match store.kind(resolved) {
            ContainerKind::DisplayArea => {
                // Display-area destinations take the dedicated path, which
                // also relocates the task's surface under the new area.
                store.reparent(container, resolved, pos);
            }
            ContainerKind::Task => {
                if store.effective_windowing_mode(resolved).is_multi_window()
                    && !store
                        .task_state(container)
                        .is_some_and(|t| t.resizeable())
                    && store.is_leaf_task(container)
                {
                    log::warn!(
                        "can't place a task without multi-window support in a multi-window parent: {container:?}"
                    );
                    return Ok(Effects::NONE);
                }
                store.reparent(container, resolved, pos);
            }
            ContainerKind::Container => return Err(ApplyError::InvalidHierarchyTarget),
        }
    } else {
        // Parent unchanged: treat as a reorder of the containing root task.
        let root = if store.kind(resolved) == ContainerKind::Task {
            resolved
        } else {
            store.root_task_of(container).unwrap_or(container)
        };
        if !store.position_child(root, pos) {
            return Ok(Effects::NONE);
        }
    }
    Ok(Effects::LIFECYCLE)
}

fn reparent_children(
    store: &mut ContainerStore,
    sync: &mut Option<SyncRef<'_>>,
    transition: &mut Option<&mut Transition>,
    current_parent: Option<ContainerId>,
    new_parent: Option<ContainerId>,
    windowing_modes: &[WindowingMode],
    activity_types: &[ActivityType],
    to_top: bool,
) -> Result<Effects, ApplyError> {
    let current_parent = current_parent.filter(|&id| store.is_alive(id));
    let new_parent = new_parent.filter(|&id| store.is_alive(id));

    // Either endpoint may be inferred as the default task area on the
    // other's display; naming neither is a caller error.
    let (current, new) = match (current_parent, new_parent) {
        (None, None) => return Err(ApplyError::MissingReparentEndpoints),
        (Some(c), Some(n)) => (c, n),
        (None, Some(n)) => match store.default_task_area(n) {
            Some(area) => (area, n),
            None => {
                log::error!("children reparent: no default task area for {n:?}");
                return Ok(Effects::NONE);
            }
        },
        (Some(c), None) => match store.default_task_area(c) {
            Some(area) => (c, area),
            None => {
                log::error!("children reparent: no default task area for {c:?}");
                return Ok(Effects::NONE);
            }
        },
    };

    if current == new {
        log::error!("children reparent: parent not changing: {current:?}");
        return Ok(Effects::NONE);
    }
    if !store.is_attached(current) {
        log::error!("children reparent: current parent detached: {current:?}");
        return Ok(Effects::NONE);
    }
    if !store.is_attached(new) {
        log::error!("children reparent: new parent detached: {new:?}");
        return Ok(Effects::NONE);
    }

    let new_is_area = store.kind(new) == ContainerKind::DisplayArea;
    if !new_is_area && store.task_state(new).is_none() {
        return Err(ApplyError::InvalidHierarchyTarget);
    }
    let new_in_multi_window = store.effective_windowing_mode(new).is_multi_window();
    log::info!("children reparent: current={current:?} new={new:?} to_top={to_top}");

    // Snapshot before mutating: reparenting shifts sibling links mid
    // iteration. Only direct, non-organizer-created children matching both
    // filters move.
    let to_reparent: Vec<ContainerId> = store
        .tasks_of(current, !to_top)
        .into_iter()
        .filter(|&task| {
            let state = store.task_state(task).expect("tasks_of yields tasks");
            if state.created_by_organizer() || store.parent(task) != Some(current) {
                return false;
            }
            if new_in_multi_window && !state.resizeable() {
                log::error!("children reparent: non-resizeable task {task:?}");
            }
            activity_types.contains(&state.activity_type())
                && windowing_modes.contains(&store.effective_windowing_mode(task))
        })
        .collect();

    let pos = Position::from_to_top(to_top);
    for task in to_reparent {
        if let Some(sync) = sync.as_mut() {
            sync.engine.add_to_sync_set(sync.id, task);
        }
        if let Some(t) = transition.as_deref_mut() {
            t.collect(task);
        }
        store.reparent(task, new, pos);
    }

    if let Some(t) = transition.as_deref_mut() {
        t.collect(new);
    }
    Ok(Effects::LIFECYCLE)
}

fn set_launch_root(
    store: &mut ContainerStore,
    container: ContainerId,
    windowing_modes: &[WindowingMode],
    activity_types: &[ActivityType],
) -> Result<Effects, ApplyError> {
    if !store.is_attached(container) {
        log::error!("attempt to operate on detached container: {container:?}");
        return Ok(Effects::NONE);
    }
    if store.task_state(container).is_none() {
        return Err(ApplyError::InvalidHierarchyTarget);
    }
    let Some(area) = store.display_area_of(container) else {
        log::error!("no display area above {container:?}");
        return Ok(Effects::NONE);
    };
    store.set_launch_root(
        area,
        container,
        windowing_modes.to_vec(),
        activity_types.to_vec(),
    );
    Ok(Effects::LIFECYCLE)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use crate::container::TaskParams;
    use crate::lifecycle::NoopLifecycle;
    use crate::transaction::Transaction;

    use crate::apply::apply_transaction;

    use super::*;

    struct Tree {
        store: ContainerStore,
        display: ContainerId,
    }

    fn tree() -> Tree {
        let mut store = ContainerStore::new();
        let display = store.create_display_area(true);
        Tree { store, display }
    }

    fn root_task(t: &mut Tree) -> ContainerId {
        let task = t.store.create_task(TaskParams {
            activity_type: ActivityType::Standard,
            resizeable: true,
            created_by_organizer: false,
        });
        t.store.add_child(t.display, task);
        task
    }

    fn apply(t: &mut Tree, txn: &Transaction) -> Result<Effects, ApplyError> {
        apply_transaction(&mut t.store, txn, None, None, &mut NoopLifecycle)
    }

    #[test]
    fn reorder_moves_to_requested_end() {
        let mut t = tree();
        let a = root_task(&mut t);
        let b = root_task(&mut t);

        let mut txn = Transaction::new();
        txn.reorder(a, true);
        let effects = apply(&mut t, &txn).unwrap();
        assert!(effects.contains(Effects::LIFECYCLE));
        let kids: Vec<_> = t.store.children(t.display).collect();
        assert_eq!(kids, vec![b, a]);

        let mut txn = Transaction::new();
        txn.reorder(a, false);
        apply(&mut t, &txn).unwrap();
        let kids: Vec<_> = t.store.children(t.display).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn reparent_moves_root_task_between_areas() {
        let mut t = tree();
        let other_area = t.store.create_display_area(false);
        let task = root_task(&mut t);

        let mut txn = Transaction::new();
        txn.reparent(task, Some(other_area), true);
        // other_area is a detached root? Attach it under nothing: a display
        // area IS a root, so it is attached.
        let effects = apply(&mut t, &txn).unwrap();
        assert!(effects.contains(Effects::LIFECYCLE));
        assert_eq!(t.store.parent(task), Some(other_area));
    }

    #[test]
    fn reparent_without_parent_defaults_to_default_task_area() {
        let mut t = tree();
        let nested = t.store.create_display_area(false);
        t.store.add_child(t.display, nested);
        let task = t.store.create_task(TaskParams {
            resizeable: true,
            ..TaskParams::default()
        });
        t.store.add_child(nested, task);

        let mut txn = Transaction::new();
        txn.reparent(task, None, true);
        apply(&mut t, &txn).unwrap();
        // t.display is flagged as the default task area.
        assert_eq!(t.store.parent(task), Some(t.display));
    }

    #[test]
    fn same_parent_reparent_is_a_root_reorder() {
        let mut t = tree();
        let a = root_task(&mut t);
        let b = root_task(&mut t);

        // Reparent a to its current (default) area with to_top: no parent
        // change, but a moves to the top of the display area.
        let mut txn = Transaction::new();
        txn.reparent(a, None, true);
        let effects = apply(&mut t, &txn).unwrap();
        assert!(effects.contains(Effects::LIFECYCLE));
        assert_eq!(t.store.parent(a), Some(t.display));
        let kids: Vec<_> = t.store.children(t.display).collect();
        assert_eq!(kids, vec![b, a]);
    }

    #[test]
    fn repeated_reparent_to_same_parent_keeps_shape() {
        let mut t = tree();
        let a = root_task(&mut t);
        let b = root_task(&mut t);

        let mut txn = Transaction::new();
        txn.reorder(a, true);
        apply(&mut t, &txn).unwrap();
        let first: Vec<_> = t.store.children(t.display).collect();
        assert_eq!(first, vec![b, a]);
        let _ = t.store.drain_changes();

        // Second application targets an already-correct parent and position:
        // no mutation, no effect contribution.
        let mut txn = Transaction::new();
        txn.reparent(a, None, true);
        let effects = apply(&mut t, &txn).unwrap();
        assert!(effects.is_empty(), "no-op contributes no effects");
        let second: Vec<_> = t.store.children(t.display).collect();
        assert_eq!(first, second, "tree shape unchanged");
        assert!(t.store.drain_changes().topology.is_empty(), "no mutation");
    }

    #[test]
    fn leaf_task_reparent_is_rejected() {
        let mut t = tree();
        let parent = root_task(&mut t);
        let leaf = t.store.create_task(TaskParams {
            resizeable: true,
            ..TaskParams::default()
        });
        t.store.add_child(parent, leaf);
        let other = root_task(&mut t);

        let mut txn = Transaction::new();
        txn.reparent(leaf, Some(other), true);
        assert_eq!(apply(&mut t, &txn), Err(ApplyError::UnsupportedReparent));
        assert_eq!(t.store.parent(leaf), Some(parent), "nothing moved");
    }

    #[test]
    fn child_of_organizer_created_task_may_reparent() {
        let mut t = tree();
        let shell_root = t.store.create_task(TaskParams {
            created_by_organizer: true,
            resizeable: true,
            ..TaskParams::default()
        });
        t.store.add_child(t.display, shell_root);
        let child = t.store.create_task(TaskParams {
            resizeable: true,
            ..TaskParams::default()
        });
        t.store.add_child(shell_root, child);
        let other = root_task(&mut t);

        let mut txn = Transaction::new();
        txn.reparent(child, Some(other), true);
        apply(&mut t, &txn).unwrap();
        assert_eq!(t.store.parent(child), Some(other));
    }

    #[test]
    fn non_resizeable_leaf_into_multi_window_parent_is_a_noop() {
        let mut t = tree();
        let rigid = t.store.create_task(TaskParams {
            activity_type: ActivityType::Standard,
            resizeable: false,
            created_by_organizer: false,
        });
        t.store.add_child(t.display, rigid);
        let split = root_task(&mut t);
        t.store.set_windowing_mode(split, WindowingMode::MultiWindow);

        let mut txn = Transaction::new();
        txn.reparent(rigid, Some(split), true);
        let effects = apply(&mut t, &txn).unwrap();
        assert!(!effects.contains(Effects::LIFECYCLE), "rejected move is a no-op");
        assert_eq!(t.store.parent(rigid), Some(t.display));
    }

    #[test]
    fn unresolvable_new_parent_is_a_noop() {
        let mut t = tree();
        let task = root_task(&mut t);
        let ghost = t.store.create_task(TaskParams::default());
        t.store.destroy(ghost);

        let mut txn = Transaction::new();
        txn.reparent(task, Some(ghost), true);
        let effects = apply(&mut t, &txn).unwrap();
        assert!(effects.is_empty());
        assert_eq!(t.store.parent(task), Some(t.display));
    }

    #[test]
    fn reorder_of_non_task_is_rejected() {
        let mut t = tree();
        let nested = t.store.create_display_area(false);
        t.store.add_child(t.display, nested);

        let mut txn = Transaction::new();
        txn.reorder(nested, true);
        assert_eq!(apply(&mut t, &txn), Err(ApplyError::InvalidHierarchyTarget));
    }

    #[test]
    fn children_reparent_filters_on_both_predicates() {
        let mut t = tree();
        let source = t.store.create_display_area(false);
        t.store.add_child(t.display, source);
        let dest = root_task(&mut t);

        let make = |t: &mut Tree, atype, mode| {
            let task = t.store.create_task(TaskParams {
                activity_type: atype,
                resizeable: true,
                created_by_organizer: false,
            });
            t.store.add_child(source, task);
            t.store.set_windowing_mode(task, mode);
            task
        };
        let match_both = make(&mut t, ActivityType::Standard, WindowingMode::MultiWindow);
        let wrong_type = make(&mut t, ActivityType::Home, WindowingMode::MultiWindow);
        let wrong_mode = make(&mut t, ActivityType::Standard, WindowingMode::Fullscreen);
        let organizer_made = {
            let task = t.store.create_task(TaskParams {
                activity_type: ActivityType::Standard,
                resizeable: true,
                created_by_organizer: true,
            });
            t.store.add_child(source, task);
            t.store.set_windowing_mode(task, WindowingMode::MultiWindow);
            task
        };

        let mut txn = Transaction::new();
        txn.reparent_children(
            Some(source),
            Some(dest),
            vec![WindowingMode::MultiWindow],
            vec![ActivityType::Standard],
            true,
        );
        let effects = apply(&mut t, &txn).unwrap();
        assert!(effects.contains(Effects::LIFECYCLE));

        assert_eq!(t.store.parent(match_both), Some(dest));
        assert_eq!(t.store.parent(wrong_type), Some(source));
        assert_eq!(t.store.parent(wrong_mode), Some(source));
        assert_eq!(
            t.store.parent(organizer_made),
            Some(source),
            "organizer-created children never move"
        );
    }

    #[test]
    fn children_reparent_skips_grandchildren() {
        let mut t = tree();
        let source = root_task(&mut t);
        let child = t.store.create_task(TaskParams {
            activity_type: ActivityType::Standard,
            resizeable: true,
            created_by_organizer: false,
        });
        t.store.add_child(source, child);
        let grandchild = t.store.create_task(TaskParams {
            activity_type: ActivityType::Standard,
            resizeable: true,
            created_by_organizer: false,
        });
        t.store.add_child(child, grandchild);
        t.store.set_windowing_mode(child, WindowingMode::MultiWindow);
        t.store.set_windowing_mode(grandchild, WindowingMode::MultiWindow);
        let dest = root_task(&mut t);

        let mut txn = Transaction::new();
        txn.reparent_children(
            Some(source),
            Some(dest),
            vec![WindowingMode::MultiWindow],
            vec![ActivityType::Standard],
            false,
        );
        apply(&mut t, &txn).unwrap();

        assert_eq!(t.store.parent(child), Some(dest));
        assert_eq!(
            t.store.parent(grandchild),
            Some(child),
            "only direct children move"
        );
    }

    #[test]
    fn children_reparent_same_endpoints_is_a_noop() {
        let mut t = tree();
        let source = root_task(&mut t);

        let mut txn = Transaction::new();
        txn.reparent_children(
            Some(source),
            Some(source),
            vec![WindowingMode::MultiWindow],
            vec![ActivityType::Standard],
            false,
        );
        let effects = apply(&mut t, &txn).unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn children_reparent_without_endpoints_is_fatal() {
        let mut t = tree();
        let mut txn = Transaction::new();
        txn.reparent_children(None, None, vec![], vec![], false);
        assert_eq!(
            apply(&mut t, &txn),
            Err(ApplyError::MissingReparentEndpoints)
        );
    }

    #[test]
    fn children_reparent_infers_missing_endpoint() {
        let mut t = tree();
        let source = t.store.create_display_area(false);
        t.store.add_child(t.display, source);
        let task = t.store.create_task(TaskParams {
            activity_type: ActivityType::Standard,
            resizeable: true,
            created_by_organizer: false,
        });
        t.store.add_child(source, task);
        t.store.set_windowing_mode(task, WindowingMode::MultiWindow);

        // New parent omitted: inferred as the display's default task area.
        let mut txn = Transaction::new();
        txn.reparent_children(
            Some(source),
            None,
            vec![WindowingMode::MultiWindow],
            vec![ActivityType::Standard],
            true,
        );
        apply(&mut t, &txn).unwrap();
        assert_eq!(t.store.parent(task), Some(t.display));
    }

    #[test]
    fn set_launch_root_registers_on_display_area() {
        let mut t = tree();
        let task = root_task(&mut t);

        let mut txn = Transaction::new();
        txn.set_launch_root(
            task,
            vec![WindowingMode::MultiWindow],
            vec![ActivityType::Standard],
        );
        let effects = apply(&mut t, &txn).unwrap();
        assert!(effects.contains(Effects::LIFECYCLE));
        assert_eq!(
            t.store.launch_root_for(
                t.display,
                WindowingMode::MultiWindow,
                ActivityType::Standard
            ),
            Some(task)
        );
    }

    #[test]
    fn set_launch_root_on_non_task_is_rejected() {
        let mut t = tree();
        let nested = t.store.create_display_area(false);
        t.store.add_child(t.display, nested);

        let mut txn = Transaction::new();
        txn.set_launch_root(nested, vec![], vec![]);
        assert_eq!(apply(&mut t, &txn), Err(ApplyError::InvalidHierarchyTarget));
    }

    #[test]
    fn hierarchy_ops_apply_in_submission_order() {
        let mut t = tree();
        let a = root_task(&mut t);
        let b = root_task(&mut t);
        let c = root_task(&mut t);

        // Ops are order-sensitive: the final stacking depends on applying
        // them exactly as submitted.
        let mut txn = Transaction::new();
        txn.reorder(a, true);
        txn.reorder(b, true);
        txn.reorder(c, false);
        apply(&mut t, &txn).unwrap();

        let kids: Vec<_> = t.store.children(t.display).collect();
        assert_eq!(kids, vec![c, a, b]);
    }
}
