//! Output utilities for CLI commands
//!
//! Spinners with elapsed time display for operations that wait on the
//! network, and centralized formatting of host errors with hints.

pub mod errors;
pub mod spinner;

pub use errors::format_host_error;
pub use spinner::CommandSpinner;
