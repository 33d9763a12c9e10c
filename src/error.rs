use thiserror::Error;

/// Fatal analysis failures surfaced by the facade. Everything recoverable is
/// logged at the component that saw it and never reaches this type.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The supertype/interface graph of the loaded classes is not a DAG.
    #[error("class hierarchy cycle: {0}")]
    HierarchyCycle(String),
}

impl AnalysisError {
    /// Stable kind tag for collaborators that map errors to exit codes.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::HierarchyCycle(_) => "HierarchyCycle",
        }
    }
}
