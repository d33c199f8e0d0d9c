//! External tool execution and text parsing.

pub mod executor;
pub mod parser;
