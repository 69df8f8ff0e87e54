//! Cycle orchestration: batches in sequence, each drained by the convergence loop,
//! bracketed by the busy/free status signals.

pub mod convergence;
pub mod report;
pub mod sequencer;
pub mod status;
