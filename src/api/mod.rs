mod error;
pub mod models;
mod server;
pub mod services;
pub mod state;
mod utils;
mod validation;

pub use error::ProxyError;
pub use server::{build_state, router, run, serve};
