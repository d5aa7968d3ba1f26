//! Client-side green-screen workflow engine (C9): connects to a TN5250
//! host and drives it through a script of Navigate/Assert/Scrape steps,
//! registered in the orchestrator as the `"green_screen_connector"`
//! component.

#![deny(unsafe_code)]

mod config;
mod connector;
mod reader;

pub use config::{AssertOperator, ConnectionConfig, EngineConfig, OnFailure, RetryPolicy, Step, StepKind};
pub use connector::GreenScreenConnector;
