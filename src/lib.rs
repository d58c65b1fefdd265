//! gtd-nav — event-driven navigation core for a GTD outline client.
//!
//! A typed in-process event bus, an affinity dispatcher that marshals
//! work onto the thread owning the display, and a reconciling controller
//! that keeps an Inbox + per-project navigation tree in step with the
//! client model.

pub mod bus;
pub mod config;
pub mod dispatch;
pub mod headless;
pub mod model;
pub mod nav;
pub mod shell;
pub mod tui;
