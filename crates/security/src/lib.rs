//! Security module for Robert: the tool sandbox policies.
//!
//! Provides:
//! - **Path validation**: confine file tools to the workspace root
//! - **Command allowlist**: default-deny program list for the shell tool

pub mod allowlist;
pub mod path;

pub use allowlist::{CommandAllowlist, CommandCheck, SHELL_OPERATORS};
pub use path::{PathValidationError, Workspace, is_safe};
