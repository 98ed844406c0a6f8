//! Mutations applied to a session's lists and todos.
//!
//! Every action takes the session data for the current request, applies at
//! most one change, records the outcome as a flash message, and returns a
//! [`Reply`] telling the HTTP layer what to send back. Validation failures
//! leave the data untouched and re-render the originating form. Lists and
//! todos are always addressed by id, never by display position.

use tracing::{debug, info};

use crate::types::SessionData;
use crate::validation::{validate_list_name, validate_todo_name};

pub const LIST_NOT_FOUND: &str = "The specified list was not found.";
pub const TODO_NOT_FOUND: &str = "The specified todo was not found.";
pub const LIST_CREATED: &str = "The list has been created.";
pub const LIST_RENAMED: &str = "The list has been renamed.";
pub const LIST_DELETED: &str = "The list has been deleted.";
pub const TODO_ADDED: &str = "The todo was added.";
pub const TODO_UPDATED: &str = "The todo has been updated.";
pub const TODO_DELETED: &str = "The todo has been deleted.";
pub const ALL_COMPLETED: &str = "All todos have been completed.";
pub const SESSION_FULL: &str = "Your session is full; delete some lists or todos.";

/// Path of the list overview.
pub const LISTS_PATH: &str = "/lists";

/// A page the HTTP layer can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Overview of all lists.
    Lists,
    /// Form for a new list.
    NewList,
    /// A single list with its todos.
    List(u64),
    /// Rename form for a list.
    EditList(u64),
}

/// What to send back after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Redirect the browser to a path.
    Redirect(String),
    /// Render a page, consuming pending flash messages.
    Render(Page),
    /// Empty `204` response for script-driven requests.
    NoContent,
    /// Plain-text body for script-driven requests.
    Text(String),
}

/// Path of a single list.
pub fn list_path(list_id: u64) -> String {
    format!("{LISTS_PATH}/{list_id}")
}

/// Parses an id path segment. Anything but a non-negative integer is `None`.
pub fn parse_id(raw: &str) -> Option<u64> {
    raw.parse().ok()
}

/// Redirects to the overview with a not-found error.
pub fn list_not_found(data: &mut SessionData) -> Reply {
    data.flash_error(LIST_NOT_FOUND);
    Reply::Redirect(LISTS_PATH.to_string())
}

/// Redirects to the list with a not-found error.
pub fn todo_not_found(data: &mut SessionData, list_id: u64) -> Reply {
    data.flash_error(TODO_NOT_FOUND);
    Reply::Redirect(list_path(list_id))
}

/// Shows a list, or redirects to the overview if it does not exist.
pub fn show_list(data: &mut SessionData, list_id: u64) -> Reply {
    if data.list(list_id).is_some() {
        Reply::Render(Page::List(list_id))
    } else {
        list_not_found(data)
    }
}

/// Shows the rename form for a list, or redirects if it does not exist.
pub fn edit_list(data: &mut SessionData, list_id: u64) -> Reply {
    if data.list(list_id).is_some() {
        Reply::Render(Page::EditList(list_id))
    } else {
        list_not_found(data)
    }
}

/// Creates a list from a submitted name.
pub fn create_list(data: &mut SessionData, raw_name: &str) -> Reply {
    let name = raw_name.trim();

    if let Err(err) = validate_list_name(name, &data.lists) {
        debug!(error = %err, "Rejected new list name");
        data.flash_error(err.to_string());
        return Reply::Render(Page::NewList);
    }

    let list_id = data.add_list(name);
    info!(list_id, "List created");
    data.flash_success(LIST_CREATED);
    Reply::Redirect(LISTS_PATH.to_string())
}

/// Renames a list.
pub fn rename_list(data: &mut SessionData, list_id: u64, raw_name: &str) -> Reply {
    let name = raw_name.trim();

    if data.list(list_id).is_none() {
        return list_not_found(data);
    }

    if let Err(err) = validate_list_name(name, &data.lists) {
        debug!(list_id, error = %err, "Rejected list rename");
        data.flash_error(err.to_string());
        return Reply::Render(Page::EditList(list_id));
    }

    if let Some(list) = data.list_mut(list_id) {
        list.name = name.to_string();
    }
    info!(list_id, "List renamed");
    data.flash_success(LIST_RENAMED);
    Reply::Redirect(list_path(list_id))
}

/// Deletes a list.
///
/// Script-driven requests get the overview path as a text body so the
/// client can navigate there itself.
pub fn delete_list(data: &mut SessionData, list_id: u64, xhr: bool) -> Reply {
    if data.remove_list(list_id).is_none() {
        return list_not_found(data);
    }

    info!(list_id, "List deleted");
    data.flash_success(LIST_DELETED);
    if xhr {
        Reply::Text(LISTS_PATH.to_string())
    } else {
        Reply::Redirect(LISTS_PATH.to_string())
    }
}

/// Adds a todo to a list.
pub fn add_todo(data: &mut SessionData, list_id: u64, raw_name: &str) -> Reply {
    let name = raw_name.trim();

    let Some(list) = data.list_mut(list_id) else {
        return list_not_found(data);
    };

    if let Err(err) = validate_todo_name(name) {
        debug!(list_id, error = %err, "Rejected todo name");
        data.flash_error(err.to_string());
        return Reply::Render(Page::List(list_id));
    }

    let todo_id = list.add_todo(name);
    info!(list_id, todo_id, "Todo added");
    data.flash_success(TODO_ADDED);
    Reply::Redirect(list_path(list_id))
}

/// Marks a todo completed or not completed.
pub fn set_todo_completed(
    data: &mut SessionData,
    list_id: u64,
    todo_id: u64,
    completed: bool,
) -> Reply {
    let Some(list) = data.list_mut(list_id) else {
        return list_not_found(data);
    };
    let Some(todo) = list.todo_mut(todo_id) else {
        return todo_not_found(data, list_id);
    };

    todo.completed = completed;
    info!(list_id, todo_id, completed, "Todo updated");
    data.flash_success(TODO_UPDATED);
    Reply::Redirect(list_path(list_id))
}

/// Deletes a todo from a list.
///
/// Script-driven requests get an empty `204` and no flash, since the page
/// is updated in place.
pub fn delete_todo(data: &mut SessionData, list_id: u64, todo_id: u64, xhr: bool) -> Reply {
    let Some(list) = data.list_mut(list_id) else {
        return list_not_found(data);
    };
    if list.remove_todo(todo_id).is_none() {
        return todo_not_found(data, list_id);
    }

    info!(list_id, todo_id, "Todo deleted");
    if xhr {
        return Reply::NoContent;
    }
    data.flash_success(TODO_DELETED);
    Reply::Redirect(list_path(list_id))
}

/// Marks every todo in a list completed.
pub fn complete_all(data: &mut SessionData, list_id: u64) -> Reply {
    let Some(list) = data.list_mut(list_id) else {
        return list_not_found(data);
    };

    list.complete_all();
    info!(list_id, todo_count = list.todos_size(), "All todos completed");
    data.flash_success(ALL_COMPLETED);
    Reply::Redirect(list_path(list_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    fn data_with_list(name: &str) -> (SessionData, u64) {
        let mut data = SessionData::default();
        let id = data.add_list(name);
        (data, id)
    }

    #[test]
    fn create_list_adds_trimmed_list_and_redirects() {
        let mut data = SessionData::default();
        let reply = create_list(&mut data, "  Groceries  ");

        assert_eq!(reply, Reply::Redirect("/lists".to_string()));
        assert_eq!(data.lists.len(), 1);
        assert_eq!(data.lists[0].name, "Groceries");
        assert_eq!(data.lists[0].id, 1);
        assert_eq!(data.flash.success.as_deref(), Some(LIST_CREATED));
    }

    #[test]
    fn create_list_with_duplicate_name_is_rejected() {
        let (mut data, _) = data_with_list("Groceries");
        let reply = create_list(&mut data, "Groceries");

        assert_eq!(reply, Reply::Render(Page::NewList));
        assert_eq!(data.lists.len(), 1);
        assert_eq!(
            data.flash.error.as_deref(),
            Some("List name must be unique.")
        );
        assert!(data.flash.success.is_none());
    }

    #[test]
    fn create_list_with_blank_name_is_rejected() {
        let mut data = SessionData::default();
        let reply = create_list(&mut data, "   ");

        assert_eq!(reply, Reply::Render(Page::NewList));
        assert!(data.lists.is_empty());
        assert_eq!(
            data.flash.error,
            Some(ValidationError::ListNameLength.to_string())
        );
    }

    #[test]
    fn show_and_edit_unknown_list_redirect_with_error() {
        let mut data = SessionData::default();
        assert_eq!(show_list(&mut data, 4), Reply::Redirect("/lists".to_string()));
        assert_eq!(data.take_flash().error.as_deref(), Some(LIST_NOT_FOUND));

        assert_eq!(edit_list(&mut data, 4), Reply::Redirect("/lists".to_string()));
        assert_eq!(data.take_flash().error.as_deref(), Some(LIST_NOT_FOUND));
    }

    #[test]
    fn show_existing_list_renders_it() {
        let (mut data, id) = data_with_list("Work");
        assert_eq!(show_list(&mut data, id), Reply::Render(Page::List(id)));
        assert_eq!(edit_list(&mut data, id), Reply::Render(Page::EditList(id)));
        assert!(data.flash.is_empty());
    }

    #[test]
    fn rename_list_updates_name() {
        let (mut data, id) = data_with_list("Work");
        let reply = rename_list(&mut data, id, " Office ");

        assert_eq!(reply, Reply::Redirect(list_path(id)));
        assert_eq!(data.lists[0].name, "Office");
        assert_eq!(data.flash.success.as_deref(), Some(LIST_RENAMED));
    }

    #[test]
    fn rename_list_to_another_lists_name_is_rejected() {
        let (mut data, work) = data_with_list("Work");
        data.add_list("Home");

        let reply = rename_list(&mut data, work, "Home");
        assert_eq!(reply, Reply::Render(Page::EditList(work)));
        assert_eq!(data.list(work).unwrap().name, "Work");
    }

    #[test]
    fn rename_list_to_its_own_name_is_rejected() {
        let (mut data, id) = data_with_list("Work");
        let reply = rename_list(&mut data, id, " Work ");

        assert_eq!(reply, Reply::Render(Page::EditList(id)));
        assert_eq!(
            data.flash.error,
            Some(ValidationError::ListNameTaken.to_string())
        );
        assert!(data.flash.success.is_none());
    }

    #[test]
    fn rename_unknown_list_redirects() {
        let mut data = SessionData::default();
        assert_eq!(
            rename_list(&mut data, 1, "Anything"),
            Reply::Redirect("/lists".to_string())
        );
        assert_eq!(data.flash.error.as_deref(), Some(LIST_NOT_FOUND));
    }

    #[test]
    fn delete_unknown_list_redirects_with_error() {
        let (mut data, _) = data_with_list("Work");
        for xhr in [false, true] {
            assert_eq!(
                delete_list(&mut data, 9, xhr),
                Reply::Redirect("/lists".to_string())
            );
            assert_eq!(data.take_flash().error.as_deref(), Some(LIST_NOT_FOUND));
        }
        assert_eq!(data.lists.len(), 1);
    }

    #[test]
    fn complete_all_on_unknown_list_redirects_with_error() {
        let mut data = SessionData::default();
        assert_eq!(
            complete_all(&mut data, 2),
            Reply::Redirect("/lists".to_string())
        );
        assert_eq!(data.flash.error.as_deref(), Some(LIST_NOT_FOUND));
        assert!(data.flash.success.is_none());
    }

    #[test]
    fn delete_list_redirects_or_returns_path() {
        let (mut data, first) = data_with_list("One");
        let second = data.add_list("Two");

        assert_eq!(
            delete_list(&mut data, first, false),
            Reply::Redirect("/lists".to_string())
        );
        assert_eq!(
            delete_list(&mut data, second, true),
            Reply::Text("/lists".to_string())
        );
        assert!(data.lists.is_empty());
        assert_eq!(data.flash.success.as_deref(), Some(LIST_DELETED));
    }

    #[test]
    fn deleted_list_ids_are_not_reused_while_later_ids_exist() {
        let (mut data, first) = data_with_list("One");
        let second = data.add_list("Two");
        delete_list(&mut data, first, false);

        create_list(&mut data, "Three");
        let ids: Vec<u64> = data.lists.iter().map(|list| list.id).collect();
        assert_eq!(ids, vec![second, second + 1]);
    }

    #[test]
    fn add_todo_with_empty_name_leaves_list_unchanged() {
        let (mut data, id) = data_with_list("Work");
        add_todo(&mut data, id, "write report");
        let before = data.list(id).cloned();
        data.take_flash();

        let reply = add_todo(&mut data, id, "  ");
        assert_eq!(reply, Reply::Render(Page::List(id)));
        assert_eq!(data.list(id).cloned(), before);
        assert_eq!(
            data.flash.error.as_deref(),
            Some("Todo must be between 1 and 100 characters.")
        );
    }

    #[test]
    fn add_todo_appends_incomplete_todo() {
        let (mut data, id) = data_with_list("Work");
        let reply = add_todo(&mut data, id, " write report ");

        assert_eq!(reply, Reply::Redirect(list_path(id)));
        let todo = &data.list(id).unwrap().todos[0];
        assert_eq!(todo.name, "write report");
        assert!(!todo.completed);
        assert_eq!(data.flash.success.as_deref(), Some(TODO_ADDED));
    }

    #[test]
    fn add_todo_to_unknown_list_redirects() {
        let mut data = SessionData::default();
        assert_eq!(
            add_todo(&mut data, 3, "anything"),
            Reply::Redirect("/lists".to_string())
        );
    }

    #[test]
    fn set_todo_completed_toggles_by_id() {
        let (mut data, id) = data_with_list("Work");
        add_todo(&mut data, id, "a");
        add_todo(&mut data, id, "b");

        set_todo_completed(&mut data, id, 2, true);
        let list = data.list(id).unwrap();
        assert!(!list.todo(1).unwrap().completed);
        assert!(list.todo(2).unwrap().completed);
        assert_eq!(data.flash.success.as_deref(), Some(TODO_UPDATED));

        set_todo_completed(&mut data, id, 2, false);
        assert!(!data.list(id).unwrap().todo(2).unwrap().completed);
    }

    #[test]
    fn set_unknown_todo_redirects_to_list() {
        let (mut data, id) = data_with_list("Work");
        let reply = set_todo_completed(&mut data, id, 99, true);

        assert_eq!(reply, Reply::Redirect(list_path(id)));
        assert_eq!(data.flash.error.as_deref(), Some(TODO_NOT_FOUND));
    }

    #[test]
    fn complete_all_completes_the_list() {
        let (mut data, id) = data_with_list("Work");
        add_todo(&mut data, id, "a");
        add_todo(&mut data, id, "b");

        let reply = complete_all(&mut data, id);
        assert_eq!(reply, Reply::Redirect(list_path(id)));
        assert!(data.list(id).unwrap().is_completed());
        assert_eq!(data.flash.success.as_deref(), Some(ALL_COMPLETED));
    }

    #[test]
    fn deleting_last_todo_of_completed_list_makes_it_incomplete() {
        let (mut data, id) = data_with_list("Work");
        add_todo(&mut data, id, "only");
        complete_all(&mut data, id);
        assert!(data.list(id).unwrap().is_completed());

        delete_todo(&mut data, id, 1, false);
        assert!(!data.list(id).unwrap().is_completed());
        assert_eq!(data.flash.success.as_deref(), Some(TODO_DELETED));
    }

    #[test]
    fn delete_todo_for_script_requests_returns_no_content_without_flash() {
        let (mut data, id) = data_with_list("Work");
        add_todo(&mut data, id, "a");
        data.take_flash();

        assert_eq!(delete_todo(&mut data, id, 1, true), Reply::NoContent);
        assert!(data.flash.is_empty());
        assert!(data.list(id).unwrap().todos.is_empty());
    }

    #[test]
    fn delete_unknown_todo_redirects_with_error() {
        let (mut data, id) = data_with_list("Work");
        assert_eq!(
            delete_todo(&mut data, id, 5, false),
            Reply::Redirect(list_path(id))
        );
        assert_eq!(data.flash.error.as_deref(), Some(TODO_NOT_FOUND));
    }

    #[test]
    fn parse_id_accepts_only_integers() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id(""), None);
    }
}
