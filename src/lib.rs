pub mod analyzer;
pub mod collect;
pub mod entry;
pub mod error;
pub mod filter;
pub mod graph;
pub mod hierarchy;
pub mod input;
pub mod loader;
pub mod model;
mod opcodes;
pub mod output;

pub use analyzer::analyze;
pub use error::AnalysisError;
pub use filter::{FilterConfig, NameFilter};
pub use model::{Algorithm, AnalysisResult};
pub use output::{write_result, Format};
