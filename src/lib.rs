// src/lib.rs

pub mod catalog;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod market;
pub mod models;
pub mod persona;
pub mod recommend;
pub mod routes;
pub mod state;
pub mod utils;

// Re-export specific items for convenience if needed
pub use routes::create_router;
