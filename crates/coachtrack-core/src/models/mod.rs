//! Domain models for the coachtrack system.

mod client;
mod form;

pub use client::*;
pub use form::*;
