use thiserror::Error;

use crate::collab::ResourceError;
use crate::node::NodeId;

/// Unified result type for the composition engine.
pub type Result<T> = std::result::Result<T, ComposeError>;

/// Errors surfaced by tree mutation, part construction, staged building and dispatch.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("attaching {child} under {parent} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("role `{role}` is not registered for family `{family}`")]
    UnknownRole { family: String, role: String },
    #[error("family `{0}` is not registered")]
    UnknownFamily(String),
    #[error("family `{0}` registered twice")]
    DuplicateFamily(String),
    #[error("builder already finalized")]
    BuilderSealed,
    #[error("missing required fields: {}", missing.join(", "))]
    IncompleteConfiguration { missing: Vec<String> },
    #[error("operation `{0}` is not supported by any part")]
    UnsupportedOperation(String),
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("invalid blueprint: {0}")]
    InvalidBlueprint(String),
    #[error("part failure: {0}")]
    Part(String),
    #[error("shared resource error: {0}")]
    Resource(#[from] ResourceError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ComposeError {
    /// Names reported by [`ComposeError::IncompleteConfiguration`], empty otherwise.
    pub fn missing_fields(&self) -> &[String] {
        match self {
            ComposeError::IncompleteConfiguration { missing } => missing,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_configuration_lists_names() {
        let err = ComposeError::IncompleteConfiguration {
            missing: vec!["gpu".into(), "psu".into()],
        };
        assert_eq!(err.to_string(), "missing required fields: gpu, psu");
        assert_eq!(err.missing_fields(), ["gpu", "psu"]);
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ComposeError = parse.unwrap_err().into();
        assert!(matches!(err, ComposeError::Serde(_)));
        assert!(ComposeError::BuilderSealed.missing_fields().is_empty());
    }
}
