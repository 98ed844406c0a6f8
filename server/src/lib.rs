//! Todos Server - Session-backed todo lists.
//!
//! This crate provides a small web application for keeping named todo lists:
//! - Creating, renaming and deleting lists
//! - Adding, completing and deleting todos
//! - One-shot flash messages reporting the outcome of each action
//!
//! # Architecture
//!
//! There is no database. Each visitor's lists live in their session, which
//! is held either in process memory or in a signed cookie depending on
//! [`config::SessionBackend`]. The [`actions`] module applies changes to a
//! session's data, [`views`] renders it, and [`routes`] wires both to HTTP.

pub mod actions;
pub mod config;
pub mod error;
pub mod ordering;
pub mod routes;
pub mod session;
pub mod types;
pub mod validation;
pub mod views;
