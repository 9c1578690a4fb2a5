//! Scan aggregation and cube-state validation.
//!
//! The aggregator is the only stateful component of the pipeline: it tracks
//! which faces have been recorded, debounces conflicting re-scans, and hands
//! candidate-complete states to the validator. It is accessed from a single
//! thread; observers get snapshot copies, never live references.

mod aggregator;
mod cubie;
mod validator;

pub use aggregator::{
    AggregateError, AggregatorParams, RecordOutcome, ScanAggregator, ScanPhase, StateSnapshot,
};
pub use validator::{validate, CubieKind, ValidationError};
