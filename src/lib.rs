pub mod api;
pub mod config;
pub mod dispatch;
pub mod fetch;
pub mod observability;
pub mod request;
pub mod rewrite;
