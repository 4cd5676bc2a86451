//! Application layer: the editing-session state machine and the corpus
//! describers built on it.

pub mod describer;
pub mod session;
