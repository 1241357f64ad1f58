//! Research agent: a hosted chat model that answers questions by calling
//! Wikipedia, a web search and a save-to-file tool.
//!
//! The same reasoning loop is served by an interactive console and a
//! one-page web form.

pub mod agent;
pub mod config;
pub mod frontend;
pub mod inference;
pub mod persistence;
pub mod tools;
pub mod types;
