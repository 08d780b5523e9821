//! Casino HTTP API
//!
//! JSON endpoints for Mines, Keno, seed management and fairness checks.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::{build_app, ApiServer};
