//! # Botic Framework
//!
//! Command routing on top of the core data model.
//!
//! This layer provides:
//! - [`CommandRouter`] with its command table and interceptor chain
//! - Help text rendering for registered commands
//! - Built-in interceptors for logging and access control
//! - Tower `Service` integration so middleware can wrap the router

pub mod help;
pub mod interceptor;
pub mod router;

pub use router::{CommandRouter, DEFAULT_HELP_COMMAND, RouterConfig};

pub use botic_core::{Command, DispatchError, DispatchResult, Interceptor, MessageEvent};
