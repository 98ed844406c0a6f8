//! Record types for the todo lists held in a session.
//!
//! A session owns an ordered collection of [`TodoList`]s, each of which owns
//! an ordered collection of [`Todo`]s. Ids are allocated per collection as
//! `max(existing) + 1`, so an id still present is never handed out again.

use serde::{Deserialize, Serialize};

/// A single completable unit of work belonging to a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique within the owning list.
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    /// Creates an incomplete todo.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            completed: false,
        }
    }
}

/// A named, ordered collection of todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    /// Unique within the session.
    pub id: u64,

    /// Unique among the session's lists.
    pub name: String,

    #[serde(default)]
    pub todos: Vec<Todo>,
}

impl TodoList {
    /// Creates an empty list.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            todos: Vec::new(),
        }
    }

    /// Returns `true` if the list has at least one todo and none are incomplete.
    ///
    /// An empty list is never considered complete.
    pub fn is_completed(&self) -> bool {
        self.todos_size() > 0 && self.todos_remaining_count() == 0
    }

    /// Number of todos in the list.
    pub fn todos_size(&self) -> usize {
        self.todos.len()
    }

    /// Number of todos not yet completed.
    pub fn todos_remaining_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }

    /// Display string of the form `"remaining/total"`.
    pub fn todos_total(&self) -> String {
        format!("{}/{}", self.todos_remaining_count(), self.todos_size())
    }

    /// Looks up a todo by id.
    pub fn todo(&self, todo_id: u64) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == todo_id)
    }

    /// Looks up a todo by id for mutation.
    pub fn todo_mut(&mut self, todo_id: u64) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id == todo_id)
    }

    /// Appends a new incomplete todo and returns its id.
    pub fn add_todo(&mut self, name: impl Into<String>) -> u64 {
        let id = next_todo_id(&self.todos);
        self.todos.push(Todo::new(id, name));
        id
    }

    /// Removes a todo by id, returning it if it existed.
    pub fn remove_todo(&mut self, todo_id: u64) -> Option<Todo> {
        let index = self.todos.iter().position(|todo| todo.id == todo_id)?;
        Some(self.todos.remove(index))
    }

    /// Marks every todo in the list as completed.
    pub fn complete_all(&mut self) {
        for todo in &mut self.todos {
            todo.completed = true;
        }
    }
}

/// Next unused list id: one past the largest id present, or 1 when empty.
pub fn next_list_id(lists: &[TodoList]) -> u64 {
    lists.iter().map(|list| list.id).max().map_or(1, |max| max + 1)
}

/// Next unused todo id: one past the largest id present, or 1 when empty.
pub fn next_todo_id(todos: &[Todo]) -> u64 {
    todos.iter().map(|todo| todo.id).max().map_or(1, |max| max + 1)
}

/// One-shot user-facing notices, cleared once displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
}

impl Flash {
    /// Returns `true` if there is nothing to display.
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.success.is_none()
    }
}

/// Everything stored in a user's session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub lists: Vec<TodoList>,

    #[serde(default, skip_serializing_if = "Flash::is_empty")]
    pub flash: Flash,
}

impl SessionData {
    /// Looks up a list by id.
    pub fn list(&self, list_id: u64) -> Option<&TodoList> {
        self.lists.iter().find(|list| list.id == list_id)
    }

    /// Looks up a list by id for mutation.
    pub fn list_mut(&mut self, list_id: u64) -> Option<&mut TodoList> {
        self.lists.iter_mut().find(|list| list.id == list_id)
    }

    /// Appends a new empty list and returns its id.
    pub fn add_list(&mut self, name: impl Into<String>) -> u64 {
        let id = next_list_id(&self.lists);
        self.lists.push(TodoList::new(id, name));
        id
    }

    /// Removes a list by id, returning it if it existed.
    pub fn remove_list(&mut self, list_id: u64) -> Option<TodoList> {
        let index = self.lists.iter().position(|list| list.id == list_id)?;
        Some(self.lists.remove(index))
    }

    /// Sets the error flash.
    pub fn flash_error(&mut self, message: impl Into<String>) {
        self.flash.error = Some(message.into());
    }

    /// Sets the success flash.
    pub fn flash_success(&mut self, message: impl Into<String>) {
        self.flash.success = Some(message.into());
    }

    /// Takes the pending flash messages, leaving none behind.
    pub fn take_flash(&mut self) -> Flash {
        std::mem::take(&mut self.flash)
    }
}
