//! Frontends that forward a query to an `Agent` and render the answer.

pub mod repl;
pub mod web;

pub use repl::run_repl;
pub use web::{serve, WebState};
