//! Enrico (kayaposoft) holiday service adapter.
//!
//! [`EnricoClient`] implements [`freeday_core::source::CalendarSource`] over
//! the v2.0 JSON API. Every request waits on a shared rate limiter first.

mod client;
mod wire;

pub mod error;

pub use client::{EnricoClient, EnricoConfig};
pub use error::{Error, Result};
