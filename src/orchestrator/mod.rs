//! Application-level orchestration.
//!
//! `lifecycle` holds the submission state machine; `controller` runs it behind a command
//! channel for interactive front-ends. `post_process` turns a finished session into
//! exports.

mod controller;
mod lifecycle;
mod post_process;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use lifecycle::LifecycleController;
pub(crate) use post_process::{export_history, export_notice};
