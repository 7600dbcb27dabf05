pub mod core;
pub mod identifiers;
pub mod krs;
pub mod notify;
pub mod schedule;
pub mod state;
pub mod watcher;

// Re-exports
pub use krs::{analyze_odpis, AnalysisResult, Krs};
pub use watcher::{RunOutcome, Watcher};
