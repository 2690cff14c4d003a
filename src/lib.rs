//! Interactive bulk administration of course groups on a remote learning
//! platform: log in, pick a course, select groups and apply an action to all
//! of them, with every per-group failure reported back.
pub mod actions;
pub mod cli;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod input;
pub mod logging;
pub mod node;
pub mod report;
pub mod util;
pub mod walker;
pub mod workflow;
