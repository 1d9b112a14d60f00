//! chanflow CLI library.
//!
//! Configuration loading, signal handling and the workflow start action,
//! shared by the `chanflow` binary and by embedders that bring their own
//! channel engine.

pub mod config;
pub mod listener;
pub mod shutdown;
pub mod workflow;

pub use workflow::run_workflow;
