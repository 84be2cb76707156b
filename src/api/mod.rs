//! HTTP control surface
//!
//! Thin glue: handlers translate HTTP into command-bus sends and store
//! reads/writes. No scheduling logic lives here.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::AppContext;
