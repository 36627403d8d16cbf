// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing front end for NodeFlow libraries.
//!
//! [`LibraryController`] applies path-addressed edits to a
//! [`NodeLibrary`](nodeflow_graph::NodeLibrary) and records them in an undo
//! [`History`]. [`AppSettings`] holds the user's preferences. The `nodeflow`
//! binary is a thin command line client of this crate.

pub mod controller;
pub mod demo;
pub mod history;
pub mod settings;

pub use controller::{child_path, ControllerError, LibraryController};
pub use history::{History, HistoryError, HistoryStats, Operation, MAX_HISTORY};
pub use settings::{AppSettings, SETTINGS_FILE_NAME, SETTINGS_FORMAT_VERSION};
