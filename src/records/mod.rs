// src/records/mod.rs
//! Per-user persistence: CVs, saved jobs and the application tracker

pub mod applications;
pub mod cvs;
pub mod saved_jobs;

pub use applications::{
    Application, ApplicationRepository, ApplicationStatus, ApplicationUpdate, NewApplication,
};
pub use cvs::{CvRecord, CvRepository, CvUpdate, NewCv};
pub use saved_jobs::{SavedJob, SavedJobRepository};
