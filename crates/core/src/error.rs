//! Error taxonomy for a generation run.

use std::fmt;

use thiserror::Error;

/// Every failure a run can end with.
///
/// `Network` is the only transient kind: discovery probes absorb it and escalate to
/// `SpecNotFound` once every attempt is exhausted.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("no API description found: {0}")]
    SpecNotFound(String),

    #[error("failed to parse API description from {source_name}: {message}")]
    SpecParse {
        source_name: String,
        message: String,
    },

    #[error("schema reference '{reference}' could not be resolved")]
    UnresolvedSchemaRef { reference: String },

    #[error("duplicate endpoint {method} {path}")]
    DuplicateEndpoint { method: String, path: String },

    #[error("unsupported auth mode '{0}' (expected token, cookie or session)")]
    UnsupportedAuthMode(String),

    #[error("unsupported framework '{0}'")]
    UnsupportedFramework(String),

    #[error("generated name '{name}' is used by both {first} and {second}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("failed to write {path}: {message}")]
    OutputWrite { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GenError {
    /// Stable kind name used in user-facing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            GenError::SpecNotFound(_) => "SpecNotFound",
            GenError::SpecParse { .. } => "SpecParseError",
            GenError::UnresolvedSchemaRef { .. } => "UnresolvedSchemaRef",
            GenError::DuplicateEndpoint { .. } => "DuplicateEndpoint",
            GenError::UnsupportedAuthMode(_) => "UnsupportedAuthMode",
            GenError::UnsupportedFramework(_) => "UnsupportedFramework",
            GenError::NameCollision { .. } => "NameCollision",
            GenError::Network { .. } => "NetworkError",
            GenError::OutputWrite { .. } => "OutputWriteError",
            GenError::Config(_) => "ConfigError",
        }
    }

    pub(crate) fn parse(source_name: impl Into<String>, message: impl fmt::Display) -> Self {
        GenError::SpecParse {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn network(url: impl Into<String>, message: impl fmt::Display) -> Self {
        GenError::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Pipeline stage a failure originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuring,
    Discovering,
    Normalizing,
    Generating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuring => "configuring",
            Stage::Discovering => "discovering",
            Stage::Normalizing => "normalizing",
            Stage::Generating => "generating",
        };
        f.write_str(name)
    }
}

/// A terminal error together with the stage it stopped the run in.
#[derive(Debug, Error)]
#[error("{stage} failed ({kind}): {source}", kind = .source.kind())]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: GenError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: GenError) -> Self {
        Self { stage, source }
    }

    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }
}

pub type Result<T, E = GenError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_message_names_stage_and_kind() {
        let err = PipelineError::new(
            Stage::Normalizing,
            GenError::DuplicateEndpoint {
                method: "GET".into(),
                path: "/users".into(),
            },
        );
        let message = err.to_string();
        assert!(message.starts_with("normalizing failed (DuplicateEndpoint)"));
        assert!(message.contains("GET /users"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(GenError::SpecNotFound(String::new()).kind(), "SpecNotFound");
        assert_eq!(GenError::parse("x", "bad").kind(), "SpecParseError");
        assert_eq!(GenError::network("http://x", "refused").kind(), "NetworkError");
        assert_eq!(
            GenError::UnsupportedAuthMode("oauth".into()).kind(),
            "UnsupportedAuthMode"
        );
    }
}
