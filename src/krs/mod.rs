pub mod analysis;
pub mod capital;
pub mod client;
pub mod entry;
pub mod identifier;
pub mod money;
pub mod name;
pub mod scan;
pub mod section;

pub use analysis::{analyze_odpis, analyze_odpis_at, AnalysisResult};
pub use capital::CapitalChange;
pub use client::{KrsClient, RegistrySource};
pub use identifier::Krs;
pub use section::Section;
