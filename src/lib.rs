pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod pricing;
pub mod routes;
pub mod state;
pub mod utils;
