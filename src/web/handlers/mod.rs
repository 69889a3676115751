pub mod ai_handlers;
pub mod ats_handlers;
pub mod cv_handlers;
pub mod job_handlers;
pub mod system_handlers;
pub mod tracker_handlers;

pub use ai_handlers::*;
pub use ats_handlers::*;
pub use cv_handlers::*;
pub use job_handlers::*;
pub use system_handlers::*;
pub use tracker_handlers::*;
