//! Interactive front end for the corpus describers.

pub mod shell;
