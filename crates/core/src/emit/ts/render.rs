//! TypeScript source rendering via the `Render` trait.
//!
//! Each AST type implements `Render`, so generated modules are built as structured values
//! and only turned into text at the end.

use super::types::{
    TemplatePart, TsExpr, TsFunction, TsImport, TsLiteral, TsModule, TsParam, TsPrimitive, TsProp,
    TsStmt, TsType, TsTypeDef, TypeDefKind,
};
use super::utils::{escape_js_string, quote_if_needed};

/// Convert an AST node to TypeScript source.
pub trait Render {
    fn render(&self) -> String;
}

fn join<T: Render>(items: &[T], sep: &str) -> String {
    items.iter().map(Render::render).collect::<Vec<_>>().join(sep)
}

// =============================================================================
// Types
// =============================================================================

impl Render for TsPrimitive {
    fn render(&self) -> String {
        match self {
            TsPrimitive::String => "string",
            TsPrimitive::Number => "number",
            TsPrimitive::Boolean => "boolean",
            TsPrimitive::Null => "null",
            TsPrimitive::Void => "void",
            TsPrimitive::Unknown => "unknown",
        }
        .to_string()
    }
}

impl Render for TsLiteral {
    fn render(&self) -> String {
        match self {
            TsLiteral::String(s) => format!("\"{}\"", escape_js_string(s)),
            TsLiteral::Number(n) => n.to_string(),
            TsLiteral::Int(i) => i.to_string(),
            TsLiteral::Bool(b) => b.to_string(),
            TsLiteral::Null => "null".to_string(),
        }
    }
}

impl Render for TsType {
    fn render(&self) -> String {
        match self {
            TsType::Primitive(p) => p.render(),
            TsType::Array(inner) => {
                // Wrap unions in parentheses
                if matches!(**inner, TsType::Union(_)) {
                    format!("({})[]", inner.render())
                } else {
                    format!("{}[]", inner.render())
                }
            }
            TsType::Union(types) => join(types, " | "),
            TsType::Object(props) => {
                if props.is_empty() {
                    "Record<string, never>".to_string()
                } else {
                    format!("{{ {} }}", join(props, "; "))
                }
            }
            TsType::Record(value) => format!("Record<string, {}>", value.render()),
            TsType::Literal(lit) => lit.render(),
            TsType::Ref(name) => name.clone(),
        }
    }
}

impl Render for TsProp {
    fn render(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        format!("{}{opt}: {}", quote_if_needed(&self.name), self.ty.render())
    }
}

// =============================================================================
// Type Definitions
// =============================================================================

impl Render for TsTypeDef {
    fn render(&self) -> String {
        match &self.kind {
            TypeDefKind::Interface { properties } => {
                let mut output = format!("export interface {} {{\n", self.name);
                for prop in properties {
                    output.push_str(&format!("  {};\n", prop.render()));
                }
                output.push_str("}\n");
                output
            }
            TypeDefKind::TypeAlias { ty } => {
                format!("export type {} = {};\n", self.name, ty.render())
            }
            TypeDefKind::ConstEnum { values } => {
                let mut output = format!("export const {} = {{\n", self.name);
                for (key, value) in values {
                    output.push_str(&format!("  {key}: {},\n", value.render()));
                }
                output.push_str("} as const;\n\n");
                output.push_str(&format!(
                    "export type {name} = (typeof {name})[keyof typeof {name}];\n",
                    name = self.name
                ));
                output
            }
        }
    }
}

// =============================================================================
// Expressions
// =============================================================================

impl Render for TsExpr {
    fn render(&self) -> String {
        match self {
            TsExpr::Ident(name) => name.clone(),
            TsExpr::Literal(lit) => lit.render(),
            TsExpr::Call { callee, args } => format!("{}({})", callee.render(), join(args, ", ")),
            TsExpr::Arrow { params, body } => {
                format!("({}) => {}", join(params, ", "), body.render())
            }
            TsExpr::Object(props) => {
                if props.is_empty() {
                    "{}".to_string()
                } else {
                    let parts: Vec<_> = props
                        .iter()
                        .map(|(k, v)| format!("{}: {}", quote_if_needed(k), v.render()))
                        .collect();
                    format!("{{ {} }}", parts.join(", "))
                }
            }
            TsExpr::Member { object, prop } => format!("{}.{prop}", object.render()),
            TsExpr::Template(parts) => {
                let content: String = parts
                    .iter()
                    .map(|p| match p {
                        TemplatePart::Static(s) => s.replace('`', "\\`").replace("${", "\\${"),
                        TemplatePart::Dynamic(e) => format!("${{{}}}", e.render()),
                    })
                    .collect();
                format!("`{content}`")
            }
            TsExpr::Array(items) => format!("[{}]", join(items, ", ")),
            TsExpr::Cast { expr, ty } => format!("{} as {}", expr.render(), ty.render()),
            TsExpr::Raw(code) => code.clone(),
        }
    }
}

impl Render for TsParam {
    fn render(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        let mut out = match &self.ty {
            Some(ty) => format!("{}{opt}: {}", self.name, ty.render()),
            None => format!("{}{opt}", self.name),
        };
        if let Some(default) = &self.default {
            out.push_str(&format!(" = {}", default.render()));
        }
        out
    }
}

// =============================================================================
// Statements
// =============================================================================

impl Render for TsStmt {
    fn render(&self) -> String {
        self.render_indented(1)
    }
}

impl TsStmt {
    /// Render with specified indentation level (2 spaces per level)
    pub fn render_indented(&self, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        match self {
            TsStmt::Const { name, ty, init } => {
                let ty_str = ty
                    .as_ref()
                    .map(|t| format!(": {}", t.render()))
                    .unwrap_or_default();
                format!("{prefix}const {name}{ty_str} = {};\n", init.render())
            }
            TsStmt::Expr(expr) => format!("{prefix}{};\n", expr.render()),
            TsStmt::Return(expr) => match expr {
                Some(e) => format!("{prefix}return {};\n", e.render()),
                None => format!("{prefix}return;\n"),
            },
            TsStmt::Raw(code) => code
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        "\n".to_string()
                    } else {
                        format!("{prefix}{line}\n")
                    }
                })
                .collect(),
        }
    }
}

// =============================================================================
// Functions
// =============================================================================

impl Render for TsFunction {
    fn render(&self) -> String {
        // Empty name: raw top-level block
        if self.name.is_empty() {
            let mut output = String::new();
            for stmt in &self.body {
                if let TsStmt::Raw(code) = stmt {
                    output.push_str(code.trim_end());
                    output.push('\n');
                } else {
                    output.push_str(&stmt.render_indented(0));
                }
            }
            return output;
        }

        let mut output = String::new();

        if let Some(doc) = &self.doc {
            output.push_str(&format!("/** {} */\n", doc.replace("*/", "*\\/")));
        }
        if self.is_export {
            output.push_str("export ");
        }

        let type_params_str = if self.type_params.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.type_params.join(", "))
        };
        let params_str = join(&self.params, ", ");
        let return_type_str = self
            .return_type
            .as_ref()
            .map(|t| format!(": {}", t.render()))
            .unwrap_or_default();
        let async_str = if self.is_async { "async " } else { "" };

        if self.is_arrow {
            output.push_str(&format!(
                "const {} = {async_str}{type_params_str}({params_str}){return_type_str} => {{\n",
                self.name
            ));
            for stmt in &self.body {
                output.push_str(&stmt.render_indented(1));
            }
            output.push_str("};\n");
        } else {
            output.push_str(&format!(
                "{async_str}function {}{type_params_str}({params_str}){return_type_str} {{\n",
                self.name
            ));
            for stmt in &self.body {
                output.push_str(&stmt.render_indented(1));
            }
            output.push_str("}\n");
        }

        output
    }
}

// =============================================================================
// Imports and modules
// =============================================================================

impl Render for TsImport {
    fn render(&self) -> String {
        let type_keyword = if self.type_only { "type " } else { "" };
        format!(
            "import {type_keyword}{{ {} }} from \"{}\";\n",
            self.items.join(", "),
            self.from
        )
    }
}

impl Render for TsModule {
    fn render(&self) -> String {
        let mut output = String::new();

        for import in &self.imports {
            output.push_str(&import.render());
        }
        if !self.imports.is_empty() {
            output.push('\n');
        }

        for type_def in &self.types {
            output.push_str(&type_def.render());
            output.push('\n');
        }

        for func in &self.functions {
            output.push_str(&func.render());
            output.push('\n');
        }

        while output.ends_with("\n\n") {
            output.pop();
        }
        output
    }
}
