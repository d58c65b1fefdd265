//! Terminal front end — ratatui view of the navigation tree.
//!
//! ## Architecture (TEA)
//!
//! Model (`TuiApp`) + Update (message handler) + View (render).
//! The tree itself is owned by the navigation controller; the TUI only
//! reads it each frame and turns keys into model commands. The runner's
//! tick drains the owner loop so updates published on other threads
//! reach the tree.

pub mod app;
pub mod event;
pub mod input;
pub mod layout;
pub mod panes;
pub mod runner;
