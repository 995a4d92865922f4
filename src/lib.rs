pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod preflight;
pub mod release;
pub mod ui;
pub mod version_file;

pub use error::{ReleaseError, Result};
pub use release::{ReleaseOutcome, ReleasePlan, ReleaseRequest, ReleaseStep, Releaser};
