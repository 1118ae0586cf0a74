//! TypeScript AST, rendering and the modules shared by every frontend target.

mod client;
mod fetchers;
mod mocks;
mod render;
mod schema;
mod types;
mod utils;

pub use client::client_module;
pub use fetchers::{FetcherSignature, fetcher, fetcher_imports};
pub use mocks::mocks_module;
pub use render::Render;
pub use schema::{TypeMapper, types_module};
pub use types::{
    TemplatePart, TsExpr, TsFunction, TsImport, TsLiteral, TsModule, TsParam, TsPrimitive,
    TsProp, TsStmt, TsType, TsTypeDef, TypeDefKind,
};
pub use utils::{escape_js_string, to_camel_case, to_pascal_case};
