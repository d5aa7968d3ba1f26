//! Workflow orchestrator (C15): parses a workflow definition, validates
//! its `initial_parameters`, and runs each step against a
//! [`ComponentRegistry`] of registered [`gst_component::Component`]s,
//! applying retry/`on_failure` policy and `foreach` iteration.

#![deny(unsafe_code)]

mod config;
mod executor;
mod registry;
mod result;

pub use config::{ComponentConfigSource, ComponentStep, ForEachMarker, ForEachStep, OnFailure, RetryPolicy, WorkflowDefinition, WorkflowStep};
pub use executor::run_workflow;
pub use registry::ComponentRegistry;
pub use result::{FinalStatus, StepOutcome, StepProgress, StepState, WorkflowResult};
