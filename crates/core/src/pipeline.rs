//! One generation run as a state machine.
//!
//! `Idle → Discovering → Normalizing → Generating → {Done | Failed}`. A failure in any
//! stage moves straight to `Failed` and surfaces as a [`PipelineError`] naming the stage.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::auth::{AuthStrategyDescriptor, resolve_auth_strategy};
use crate::config::GenerationConfig;
use crate::emit::{EmitContext, Framework};
use crate::error::{GenError, PipelineError, Result, Stage};
use crate::mock::MockSynthesizer;
use crate::openapi::{Endpoint, LoadedSpec, SpecLoader, normalize_document, normalize_seeds};
use crate::output::write_modules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Discovering,
    Normalizing,
    Generating,
    Done,
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("idle"),
            PipelineState::Discovering => f.write_str("discovering API description"),
            PipelineState::Normalizing => f.write_str("normalizing endpoints"),
            PipelineState::Generating => f.write_str("generating modules"),
            PipelineState::Done => f.write_str("done"),
            PipelineState::Failed(stage) => write!(f, "failed while {stage}"),
        }
    }
}

/// Where the endpoints of a run came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecSource {
    /// File path or URL of the description document.
    Document(String),
    /// Inferred from heuristic probing.
    Heuristic,
}

impl fmt::Display for SpecSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecSource::Document(source) => f.write_str(source),
            SpecSource::Heuristic => f.write_str("heuristic probing"),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub framework: Framework,
    pub source: SpecSource,
    pub endpoints: Vec<Endpoint>,
    /// Written files, in module order.
    pub files: Vec<PathBuf>,
}

type Observer<'a> = Box<dyn Fn(PipelineState) + Send + Sync + 'a>;

/// Drives one run over a [`GenerationConfig`].
pub struct Pipeline<'a> {
    config: &'a GenerationConfig,
    state: PipelineState,
    observer: Option<Observer<'a>>,
}

impl fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a GenerationConfig) -> Self {
        Self {
            config,
            state: PipelineState::Idle,
            observer: None,
        }
    }

    /// Call `observer` on every state transition.
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(PipelineState) + Send + Sync + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "Pipeline transition.");
        self.state = next;
        if let Some(observer) = &self.observer {
            observer(next);
        }
    }

    /// Attach `stage` to a failure and move to `Failed`.
    fn check<T>(&mut self, stage: Stage, result: Result<T>) -> Result<T, PipelineError> {
        result.map_err(|source| {
            warn!(%stage, kind = source.kind(), error = %source, "Pipeline stage failed.");
            self.transition(PipelineState::Failed(stage));
            PipelineError::new(stage, source)
        })
    }

    pub async fn run(&mut self) -> Result<GenerationReport, PipelineError> {
        let config = self.config;
        let configured = configure(config);
        let (framework, auth, loader) = self.check(Stage::Configuring, configured)?;

        self.transition(PipelineState::Discovering);
        let loaded = loader.load().await;
        let loaded = self.check(Stage::Discovering, loaded)?;

        self.transition(PipelineState::Normalizing);
        let (source, normalized) = match loaded {
            LoadedSpec::Document { document, source } => (
                SpecSource::Document(source),
                normalize_document(&document, &config.public_paths),
            ),
            LoadedSpec::Seeds(seeds) => (SpecSource::Heuristic, normalize_seeds(&seeds)),
        };
        let endpoints = self.check(Stage::Normalizing, normalized)?;

        self.transition(PipelineState::Generating);
        let generated = generate(config, framework, auth, &endpoints);
        let files = self.check(Stage::Generating, generated)?;

        self.transition(PipelineState::Done);
        info!(
            framework = %framework,
            endpoints = endpoints.len(),
            files = files.len(),
            output = %config.output_dir.display(),
            "Generation complete."
        );
        Ok(GenerationReport {
            framework,
            source,
            endpoints,
            files,
        })
    }
}

fn configure(config: &GenerationConfig) -> Result<(Framework, AuthStrategyDescriptor, SpecLoader)> {
    let framework = Framework::from_tag(&config.framework)?;
    let auth = resolve_auth_strategy(&config.auth_mode, &config.csrf)?;
    let loader = SpecLoader::new(config)?;
    if config.mock && config.mock_options.array_len == 0 {
        return Err(GenError::Config("mock array length must be at least 1".into()));
    }
    debug!(%framework, auth = %auth.mode, mock = config.mock, "Configured generation run.");
    Ok((framework, auth, loader))
}

fn generate(
    config: &GenerationConfig,
    framework: Framework,
    auth: AuthStrategyDescriptor,
    endpoints: &[Endpoint],
) -> Result<Vec<PathBuf>> {
    let mocks = config
        .mock
        .then(|| MockSynthesizer::new(config.mock_options).mock_endpoints(endpoints));
    let ctx = EmitContext::new(endpoints, auth, config.base_url_trimmed(), mocks)?;
    let modules = framework.emitter().emit_all(&ctx);
    write_modules(&config.output_dir, &modules)
}

/// Run the whole pipeline for `config`.
pub async fn connect(config: &GenerationConfig) -> Result<GenerationReport, PipelineError> {
    Pipeline::new(config).run().await
}
