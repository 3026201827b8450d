// src/models/mod.rs

pub mod article;
pub mod comment;
pub mod portfolio;
pub mod product;
pub mod services;
pub mod user;
pub mod video;
