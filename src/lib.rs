pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;
pub mod state;
