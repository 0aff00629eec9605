//! Terminal presentation helpers

mod progress;

pub use progress::ProgressReporter;
