//! Core of apiconnect: discover a backend's OpenAPI/Swagger description, normalize it into
//! endpoints, and emit typed frontend client code, bindings and mocks.
//!
//! The stages are exposed individually and chained by [`connect`].

pub mod auth;
pub mod config;
pub mod emit;
pub mod error;
pub mod mock;
pub mod openapi;
pub mod output;
pub mod pipeline;

// Re-export commonly used types
pub use config::{FileConfig, GenerationConfig};
pub use emit::{CodeEmitter, Framework, GeneratedModule, ModuleKind};
pub use error::{GenError, PipelineError, Result, Stage};
pub use pipeline::{GenerationReport, Pipeline, PipelineState, SpecSource, connect};
