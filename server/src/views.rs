//! HTML pages.
//!
//! Pages are plain string templates with every user-supplied value escaped.
//! Rendering never mutates the session; callers pass in the flash messages
//! they have already taken from it.

use std::fmt::Write;

use crate::actions::{list_path, Page};
use crate::ordering::{sort_lists, sort_todos};
use crate::types::{Flash, SessionData, Todo, TodoList};

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// CSS class for a completed list.
fn list_class(list: &TodoList) -> &'static str {
    if list.is_completed() {
        "complete"
    } else {
        ""
    }
}

/// CSS class for a completed todo.
fn todo_class(todo: &Todo) -> &'static str {
    if todo.completed {
        "complete"
    } else {
        ""
    }
}

/// Renders a full page.
///
/// A page for a list that no longer exists falls back to the overview.
pub fn render_page(page: Page, data: &SessionData, flash: &Flash) -> String {
    let (title, body) = match page {
        Page::Lists => ("Todo Lists".to_string(), render_lists(data)),
        Page::NewList => ("New List".to_string(), render_new_list()),
        Page::List(list_id) => match data.list(list_id) {
            Some(list) => (list.name.clone(), render_list(list)),
            None => ("Todo Lists".to_string(), render_lists(data)),
        },
        Page::EditList(list_id) => match data.list(list_id) {
            Some(list) => (format!("Edit {}", list.name), render_edit_list(list)),
            None => ("Todo Lists".to_string(), render_lists(data)),
        },
    };

    layout(&title, flash, &body)
}

fn layout(title: &str, flash: &Flash, body: &str) -> String {
    let mut messages = String::new();
    if let Some(error) = &flash.error {
        let _ = write!(
            messages,
            r#"<div class="flash error"><p>{}</p></div>"#,
            escape_html(error)
        );
    }
    if let Some(success) = &flash.success {
        let _ = write!(
            messages,
            r#"<div class="flash success"><p>{}</p></div>"#,
            escape_html(success)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
.complete {{ text-decoration: line-through; color: #888; }}
.flash.error {{ color: #b00; }}
.flash.success {{ color: #070; }}
</style>
</head>
<body>
<header><h1><a href="/lists">Todo Tracker</a></h1></header>
{messages}
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn render_lists(data: &SessionData) -> String {
    let mut items = String::new();
    for (_, list) in sort_lists(&data.lists) {
        let _ = write!(
            items,
            r#"<li class="{class}"><a href="{path}"><h2>{name}</h2><p>{total}</p></a></li>
"#,
            class = list_class(list),
            path = list_path(list.id),
            name = escape_html(&list.name),
            total = list.todos_total(),
        );
    }

    format!(
        r#"<ul id="lists">
{items}</ul>
<a class="add" href="/lists/new">New List</a>"#
    )
}

fn render_new_list() -> String {
    r#"<form action="/lists" method="post">
<label for="list_name">Enter the name for your new list:</label>
<input id="list_name" name="list_name" placeholder="List Name" type="text">
<input type="submit" value="Save">
<a href="/lists">Cancel</a>
</form>"#
        .to_string()
}

fn render_list(list: &TodoList) -> String {
    let path = list_path(list.id);
    let mut items = String::new();
    for (_, todo) in sort_todos(&list.todos) {
        let _ = write!(
            items,
            r#"<li class="{class}">
<form action="{path}/todo/complete/{id}" method="post" class="check">
<input type="hidden" name="completed" value="{next}">
<button type="submit">{label}</button>
</form>
<h3>{name}</h3>
<form action="{path}/todo/delete/{id}" method="post" class="delete">
<button type="submit">Delete</button>
</form>
</li>
"#,
            class = todo_class(todo),
            id = todo.id,
            next = !todo.completed,
            label = if todo.completed { "Undo" } else { "Complete" },
            name = escape_html(&todo.name),
        );
    }

    format!(
        r#"<section id="todos" class="{class}">
<header>
<h2>{name}</h2>
<p>{total}</p>
<form action="{path}/complete_all" method="post"><button type="submit">Complete All</button></form>
<a class="edit" href="{path}/edit">Edit List</a>
</header>
<ul>
{items}</ul>
</section>
<form action="{path}/todos" method="post">
<label for="todo">Enter a new todo item:</label>
<input id="todo" name="todo" placeholder="Something to do" type="text">
<input type="submit" value="Add">
</form>"#,
        class = list_class(list),
        name = escape_html(&list.name),
        total = list.todos_total(),
    )
}

fn render_edit_list(list: &TodoList) -> String {
    format!(
        r#"<form action="/lists/delete/{id}" method="post" class="delete">
<button type="submit">Delete List</button>
</form>
<form action="/edit/{id}" method="post">
<label for="list_rename">Enter the new name for the list:</label>
<input id="list_rename" name="list_rename" value="{name}" type="text">
<input type="submit" value="Save">
<a href="{path}">Cancel</a>
</form>"#,
        id = list.id,
        name = escape_html(&list.name),
        path = list_path(list.id),
    )
}
