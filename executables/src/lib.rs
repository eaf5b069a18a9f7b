//! This crate contains helper functions that are used exclusively in defining binaries, that is
//! main functions.
pub mod benchmark;
pub mod replay;
