//! Frontend code emission.
//!
//! Every target framework implements [`CodeEmitter`]; [`Framework`] is the closed registry
//! of targets keyed by tag. All targets share the TypeScript AST in [`ts`], the `client.ts`,
//! `types.ts` and `mocks.ts` generators, and the per-endpoint fetchers; only the bindings
//! wrapped around the fetchers differ.

mod naming;
mod react;
pub mod ts;
mod vue;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

pub use naming::{
    BindingNames, EndpointTypeNames, NamePlan, NameRequest, allocate_names, reachable_schemas,
};
pub use react::ReactEmitter;
pub use vue::VueEmitter;

use crate::auth::AuthStrategyDescriptor;
use crate::error::{GenError, Result};
use crate::mock::EndpointMock;
use crate::openapi::Endpoint;
use ts::{Render, TsFunction, TsImport, TsModule};

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "// Generated by apiconnect. Do not edit.";

/// Everything an emitter reads. Names are planned on construction, so collisions surface
/// before any output is produced.
#[derive(Debug, Clone)]
pub struct EmitContext<'a> {
    pub endpoints: &'a [Endpoint],
    pub auth: AuthStrategyDescriptor,
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Present in mock mode only.
    pub mocks: Option<Vec<EndpointMock>>,
    pub names: NamePlan,
}

impl<'a> EmitContext<'a> {
    pub fn new(
        endpoints: &'a [Endpoint],
        auth: AuthStrategyDescriptor,
        base_url: impl Into<String>,
        mocks: Option<Vec<EndpointMock>>,
    ) -> Result<Self> {
        Ok(Self {
            names: NamePlan::build(endpoints)?,
            endpoints,
            auth,
            base_url: base_url.into(),
            mocks,
        })
    }
}

/// One file of the fixed output module set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleKind {
    Client,
    Bindings,
    Types,
    Mocks,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 4] = [
        ModuleKind::Client,
        ModuleKind::Bindings,
        ModuleKind::Types,
        ModuleKind::Mocks,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ModuleKind::Client => "client.ts",
            ModuleKind::Bindings => "bindings.ts",
            ModuleKind::Types => "types.ts",
            ModuleKind::Mocks => "mocks.ts",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    pub kind: ModuleKind,
    pub contents: String,
}

impl GeneratedModule {
    pub fn new(kind: ModuleKind, module: &TsModule) -> Self {
        Self {
            kind,
            contents: format!("{GENERATED_HEADER}\n\n{}", module.render()),
        }
    }

    pub fn file_name(&self) -> &'static str {
        self.kind.file_name()
    }
}

/// A frontend target.
///
/// Implementors supply the per-endpoint bindings and their imports; the shared modules
/// have default implementations.
pub trait CodeEmitter: Send + Sync {
    fn framework(&self) -> Framework;

    /// Framework imports of `bindings.ts`.
    fn binding_imports(&self, ctx: &EmitContext<'_>) -> Vec<TsImport>;

    /// Helpers placed ahead of the bindings.
    fn binding_prelude(&self) -> Vec<TsFunction> {
        Vec::new()
    }

    /// Binding functions for `ctx.endpoints[index]`.
    fn emit_endpoint_binding(&self, ctx: &EmitContext<'_>, index: usize) -> Vec<TsFunction>;

    fn emit_client(&self, ctx: &EmitContext<'_>) -> GeneratedModule {
        GeneratedModule::new(ModuleKind::Client, &ts::client_module(ctx))
    }

    /// `bindings.ts`: per endpoint, the fetcher followed by its framework binding.
    fn emit_bindings(&self, ctx: &EmitContext<'_>) -> GeneratedModule {
        let mut imports = self.binding_imports(ctx);
        imports.extend(ts::fetcher_imports(ctx));

        let mut functions = self.binding_prelude();
        for index in 0..ctx.endpoints.len() {
            functions.push(ts::fetcher(ctx, index));
            functions.extend(self.emit_endpoint_binding(ctx, index));
        }

        let module = TsModule {
            imports,
            types: Vec::new(),
            functions,
        };
        GeneratedModule::new(ModuleKind::Bindings, &module)
    }

    fn emit_type_definitions(&self, ctx: &EmitContext<'_>) -> GeneratedModule {
        GeneratedModule::new(ModuleKind::Types, &ts::types_module(ctx))
    }

    /// `None` unless mock mode is on.
    fn emit_mock_module(&self, ctx: &EmitContext<'_>) -> Option<GeneratedModule> {
        ctx.mocks
            .as_deref()
            .map(|mocks| GeneratedModule::new(ModuleKind::Mocks, &ts::mocks_module(mocks)))
    }

    /// The whole module set, in [`ModuleKind`] order.
    fn emit_all(&self, ctx: &EmitContext<'_>) -> Vec<GeneratedModule> {
        debug!(
            framework = %self.framework(),
            endpoints = ctx.endpoints.len(),
            mock = ctx.mocks.is_some(),
            "Emitting modules."
        );
        let mut modules = vec![
            self.emit_client(ctx),
            self.emit_bindings(ctx),
            self.emit_type_definitions(ctx),
        ];
        modules.extend(self.emit_mock_module(ctx));
        modules
    }
}

/// Supported frontend targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framework {
    React,
    Vue,
}

impl Framework {
    pub const ALL: [Framework; 2] = [Framework::React, Framework::Vue];

    pub fn tag(&self) -> &'static str {
        match self {
            Framework::React => "react",
            Framework::Vue => "vue",
        }
    }

    /// Look up a target by tag, case-insensitively.
    pub fn from_tag(tag: &str) -> Result<Self> {
        let wanted = tag.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|framework| framework.tag() == wanted)
            .ok_or_else(|| GenError::UnsupportedFramework(tag.to_string()))
    }

    pub fn emitter(&self) -> &'static dyn CodeEmitter {
        match self {
            Framework::React => &ReactEmitter,
            Framework::Vue => &VueEmitter,
        }
    }
}

impl FromStr for Framework {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s)
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
