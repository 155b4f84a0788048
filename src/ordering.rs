//! Swap-based reordering of users and routines.
//!
//! Moving a record exchanges its sort key with the immediate neighbour in the
//! same scope (all users, or one user's routines) inside one transaction.
//! Sort keys are never renumbered here; dense renumbering happens only in the
//! v2→v3 schema migration.

use crate::storage::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Move a user one position earlier. A no-op when already first.
pub fn move_user_up(store: &Store, id: &str) -> Result<bool, StoreError> {
    move_user(store, id, Direction::Up)
}

/// Move a user one position later. A no-op when already last.
pub fn move_user_down(store: &Store, id: &str) -> Result<bool, StoreError> {
    move_user(store, id, Direction::Down)
}

/// Move a routine within its owning user's list. A no-op at the edge.
pub fn move_routine_up(store: &Store, id: &str) -> Result<bool, StoreError> {
    move_routine(store, id, Direction::Up)
}

pub fn move_routine_down(store: &Store, id: &str) -> Result<bool, StoreError> {
    move_routine(store, id, Direction::Down)
}

fn move_user(store: &Store, id: &str, direction: Direction) -> Result<bool, StoreError> {
    store.in_transaction(|s| {
        let siblings = s.list_users()?;
        let Some(swap) = neighbour_swap(
            &siblings
                .iter()
                .map(|u| (u.id.clone(), u.sort_order))
                .collect::<Vec<_>>(),
            id,
            direction,
        )?
        else {
            return Ok(false);
        };
        s.set_user_sort_order(&swap.0 .0, swap.1 .1)?;
        s.set_user_sort_order(&swap.1 .0, swap.0 .1)?;
        Ok(true)
    })
}

fn move_routine(store: &Store, id: &str, direction: Direction) -> Result<bool, StoreError> {
    store.in_transaction(|s| {
        let target = s
            .get_routine(id)?
            .ok_or_else(|| StoreError::NotFound(format!("routine {id}")))?;
        let siblings = s.list_routines_by_user(&target.user_id)?;
        let Some(swap) = neighbour_swap(
            &siblings
                .iter()
                .map(|r| (r.id.clone(), r.sort_order))
                .collect::<Vec<_>>(),
            id,
            direction,
        )?
        else {
            return Ok(false);
        };
        s.set_routine_sort_order(&swap.0 .0, swap.1 .1)?;
        s.set_routine_sort_order(&swap.1 .0, swap.0 .1)?;
        Ok(true)
    })
}

type Entry = (String, i64);

/// Given siblings already sorted by sort key, find the target and the
/// neighbour it swaps with. `None` when the target sits at the moving edge.
fn neighbour_swap(
    siblings: &[Entry],
    id: &str,
    direction: Direction,
) -> Result<Option<(Entry, Entry)>, StoreError> {
    let index = siblings
        .iter()
        .position(|(sid, _)| sid == id)
        .ok_or_else(|| StoreError::NotFound(format!("record {id}")))?;
    let other = match direction {
        Direction::Up => {
            if index == 0 {
                return Ok(None);
            }
            index - 1
        }
        Direction::Down => {
            if index + 1 >= siblings.len() {
                return Ok(None);
            }
            index + 1
        }
    };
    Ok(Some((siblings[index].clone(), siblings[other].clone())))
}
