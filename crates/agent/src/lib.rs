//! Streaming orchestration for PEditor
//!
//! The [`Orchestrator`] turns a template invocation into a provider request, folds the streamed
//! fragments into a fresh output entry and settles that entry as complete, failed or cancelled.

pub mod orchestrator;

pub use orchestrator::{
    FAILURE_PREFIX, GenerationId, GenerationSlot, GenerationStatus, MISSING_KEY_MESSAGE, Orchestrator, SlotState,
    SubmitOutcome, failure_message,
};
