//! Display ordering for lists and todos.
//!
//! Incomplete entries surface first. The partition is stable: relative order
//! within the incomplete group and within the complete group is preserved.
//! Each entry is yielded with its position in the original collection so
//! callers can still refer back to it.

use crate::types::{Todo, TodoList};

/// Stable partition of `items` with incomplete entries first.
///
/// Returns `(original_index, item)` pairs.
pub fn incomplete_first<T, F>(items: &[T], is_complete: F) -> Vec<(usize, &T)>
where
    F: Fn(&T) -> bool,
{
    let (complete, mut ordered): (Vec<_>, Vec<_>) = items
        .iter()
        .enumerate()
        .partition(|(_, item)| is_complete(item));
    ordered.extend(complete);
    ordered
}

/// Lists ordered for display, completed lists last.
pub fn sort_lists(lists: &[TodoList]) -> Vec<(usize, &TodoList)> {
    incomplete_first(lists, TodoList::is_completed)
}

/// Todos ordered for display, completed todos last.
pub fn sort_todos(todos: &[Todo]) -> Vec<(usize, &Todo)> {
    incomplete_first(todos, |todo| todo.completed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: u64, completed: bool) -> Todo {
        Todo {
            id,
            name: format!("todo-{id}"),
            completed,
        }
    }

    fn ids(sorted: &[(usize, &Todo)]) -> Vec<u64> {
        sorted.iter().map(|(_, todo)| todo.id).collect()
    }

    #[test]
    fn completed_todos_move_after_incomplete_ones() {
        let todos = vec![
            todo(1, true),
            todo(2, false),
            todo(3, true),
            todo(4, false),
        ];
        let sorted = sort_todos(&todos);
        assert_eq!(ids(&sorted), vec![2, 4, 1, 3]);
    }

    #[test]
    fn original_indices_are_preserved() {
        let todos = vec![todo(10, true), todo(20, false)];
        let sorted = sort_todos(&todos);
        assert_eq!(sorted[0].0, 1);
        assert_eq!(sorted[1].0, 0);
    }

    #[test]
    fn all_incomplete_keeps_order() {
        let todos = vec![todo(3, false), todo(1, false), todo(2, false)];
        assert_eq!(ids(&sort_todos(&todos)), vec![3, 1, 2]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(sort_todos(&[]).is_empty());
        assert!(sort_lists(&[]).is_empty());
    }

    #[test]
    fn completed_lists_sort_last_and_empty_lists_count_as_incomplete() {
        let mut done = TodoList::new(1, "done");
        done.add_todo("x");
        done.complete_all();
        let empty = TodoList::new(2, "empty");
        let mut open = TodoList::new(3, "open");
        open.add_todo("y");

        let lists = vec![done, empty, open];
        let names: Vec<&str> = sort_lists(&lists)
            .into_iter()
            .map(|(_, list)| list.name.as_str())
            .collect();
        assert_eq!(names, vec!["empty", "open", "done"]);
    }
}
