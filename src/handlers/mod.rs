// src/handlers/mod.rs

pub mod advisor;
pub mod auth;
pub mod community;
pub mod persona;
pub mod products;
pub mod profile;
pub mod services;
pub mod video;
