#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
#![cfg_attr(feature = "strict", deny(missing_docs))]

//! This crate contains everything which is shared between the segment tree and its drivers.

mod error;

pub use error::{StreeError, StreeResult};

pub mod logging;
pub mod util;
