//! Core types and trait definitions for FaltaQuanto.
//!
//! No HTTP or database dependencies; every other crate in the workspace
//! builds on these types.

#![allow(async_fn_in_trait)]

pub mod account;
pub mod attendance;
pub mod error;
pub mod store;
pub mod subject;
pub mod weekday;

pub use error::{Error, Result};
