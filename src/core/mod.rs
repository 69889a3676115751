// src/core/mod.rs
//! Shared infrastructure: configuration, storage, files, templates and
//! outbound HTTP

pub mod config_manager;
pub mod database;
pub mod fs_ops;
pub mod service_client;
pub mod sessions;
pub mod template_engine;

pub use config_manager::ConfigManager;
pub use database::Database;
pub use fs_ops::FsOps;
pub use service_client::ServiceClient;
pub use sessions::SessionStore;
pub use template_engine::TemplateEngine;
