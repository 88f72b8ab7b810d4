//! External process execution

pub mod subprocess;

pub use subprocess::{Invocation, ProcessRunner, Runner};
