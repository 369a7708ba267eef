// src/lib.rs

//! stepflow: asynchronous, named-step pipelines for multi-call business workflows.
//!
//! A pipeline is an ordered list of named steps. Each step runs its `before`,
//! `on` and `after` handlers against a shared [`ContextData`]. Handlers can stop
//! the pipeline early or fail it with the pipeline's error type.
//!
//! Pipelines can also run *journaled*: a [`StepJournal`] claims a run key,
//! remembers the last completed step, and a later run with the same key resumes
//! after that step instead of repeating side effects that already happened.
//! This is how the storefront drives the carrier shipment calls.

pub mod core;
pub mod error;
pub mod journal;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::Handler;
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};
pub use crate::journal::{idempotency_key, MemoryJournal, RunOutcome, RunProgress, StepJournal};

pub use crate::registry::Flows;
