//! careerkit: CV builder backend with an ATS scorer, job search with a
//! per-session cache, application tracking and Typst PDF export.

pub mod ai;
pub mod ats;
pub mod cli;
pub mod core;
pub mod export;
pub mod jobs;
pub mod records;
pub mod types;
pub mod web;

pub use web::{build_rocket, start_web_server};

/// Log through `tracing` at the given level: `app_log!(info, "...", args)`
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!($($arg)+)
    };
}
