// src/types/mod.rs
pub mod cv_data;
pub mod response;
