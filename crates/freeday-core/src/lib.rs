//! Core types and algorithms for the freeday holiday cache.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::CalendarStore`]; upstream calendar
//! providers implement [`source::CalendarSource`]. The reconciliation engine,
//! the free-days scanner and the day-status classifier live here and only
//! ever talk to those two traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod calendar;
pub mod classify;
pub mod country;
pub mod day;
pub mod error;
pub mod flight;
pub mod reconcile;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod service;
pub mod source;
pub mod store;

pub use error::{Error, Result};
pub use service::HolidayService;
