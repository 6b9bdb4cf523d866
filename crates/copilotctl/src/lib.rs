//! copilotctl - command line client and regression harness for copilotd

pub mod client;
pub mod eval;
pub mod output;

pub use client::CopilotClient;
