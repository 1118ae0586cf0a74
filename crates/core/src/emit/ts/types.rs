//! TypeScript AST used by every emitter.
//!
//! - TsType: Types (primitives, arrays, unions, objects, etc.)
//! - TsExpr: Expressions (identifiers, calls, arrows, etc.)
//! - TsStmt / TsFunction / TsModule: what a generated file is made of

use std::collections::BTreeSet;

/// TypeScript type representation
#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    /// Primitive types: string, number, boolean, null, void, unknown
    Primitive(TsPrimitive),
    /// Array type: T[]
    Array(Box<TsType>),
    /// Union type: A | B | C
    Union(Vec<TsType>),
    /// Object type: { foo: string; bar?: number }
    Object(Vec<TsProp>),
    /// Record type: Record<string, V>
    Record(Box<TsType>),
    /// Literal type: "foo", 42, true
    Literal(TsLiteral),
    /// Named type reference
    Ref(String),
}

impl TsType {
    pub fn unknown() -> Self {
        TsType::Primitive(TsPrimitive::Unknown)
    }

    /// Collect the names of every referenced type into `out`.
    pub fn collect_refs(&self, out: &mut BTreeSet<String>) {
        match self {
            TsType::Ref(name) => {
                out.insert(name.clone());
            }
            TsType::Array(inner) | TsType::Record(inner) => inner.collect_refs(out),
            TsType::Union(types) => types.iter().for_each(|t| t.collect_refs(out)),
            TsType::Object(props) => props.iter().for_each(|p| p.ty.collect_refs(out)),
            TsType::Primitive(_) | TsType::Literal(_) => {}
        }
    }
}

/// TypeScript primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    String,
    Number,
    Boolean,
    Null,
    Void,
    Unknown,
}

/// Object property definition
#[derive(Debug, Clone, PartialEq)]
pub struct TsProp {
    pub name: String,
    pub ty: TsType,
    pub optional: bool,
}

/// TypeScript literal values
#[derive(Debug, Clone, PartialEq)]
pub enum TsLiteral {
    String(String),
    Number(f64),
    Int(i64),
    Bool(bool),
    Null,
}

/// TypeScript expression
#[derive(Debug, Clone, PartialEq)]
pub enum TsExpr {
    /// Identifier: foo
    Ident(String),
    /// Literal value: "bar", 42
    Literal(TsLiteral),
    /// Function call: foo(a, b)
    Call { callee: Box<TsExpr>, args: Vec<TsExpr> },
    /// Arrow function: (x) => x.foo
    Arrow {
        params: Vec<TsParam>,
        body: Box<TsExpr>,
    },
    /// Object literal: { a: 1, b: 2 }
    Object(Vec<(String, TsExpr)>),
    /// Member access: foo.bar
    Member { object: Box<TsExpr>, prop: String },
    /// Template literal: `${foo}/bar`
    Template(Vec<TemplatePart>),
    /// Array literal: [a, b, c]
    Array(Vec<TsExpr>),
    /// Type cast: expr as Type
    Cast { expr: Box<TsExpr>, ty: TsType },
    /// Raw code that doesn't fit the AST
    Raw(String),
}

impl TsExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        TsExpr::Ident(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        TsExpr::Literal(TsLiteral::String(value.into()))
    }

    pub fn call(callee: TsExpr, args: Vec<TsExpr>) -> Self {
        TsExpr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn member(object: TsExpr, prop: impl Into<String>) -> Self {
        TsExpr::Member {
            object: Box::new(object),
            prop: prop.into(),
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct TsParam {
    pub name: String,
    pub ty: Option<TsType>,
    pub optional: bool,
    /// Default value: `client: ApiClient = apiClient`
    pub default: Option<TsExpr>,
}

impl TsParam {
    pub fn new(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            optional: false,
            default: None,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            optional: false,
            default: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self, default: TsExpr) -> Self {
        self.default = Some(default);
        self
    }
}

/// Template literal part
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Static string part
    Static(String),
    /// Dynamic expression part: ${expr}
    Dynamic(TsExpr),
}

// =============================================================================
// Module-Level IR
// =============================================================================

/// Import statement
#[derive(Debug, Clone, PartialEq)]
pub struct TsImport {
    pub items: Vec<String>,
    pub from: String,
    pub type_only: bool,
}

impl TsImport {
    pub fn new(items: Vec<String>, from: impl Into<String>) -> Self {
        Self {
            items,
            from: from.into(),
            type_only: false,
        }
    }

    pub fn types(items: Vec<String>, from: impl Into<String>) -> Self {
        Self {
            items,
            from: from.into(),
            type_only: true,
        }
    }
}

/// Type definition kind
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    /// interface Foo { ... }
    Interface { properties: Vec<TsProp> },
    /// type Foo = ...
    TypeAlias { ty: TsType },
    /// const Foo = { ... } as const; type Foo = ...
    ConstEnum { values: Vec<(String, TsLiteral)> },
}

/// Type definition
#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeDef {
    pub name: String,
    pub kind: TypeDefKind,
}

/// Statement in a function body
#[derive(Debug, Clone, PartialEq)]
pub enum TsStmt {
    /// const declaration
    Const {
        name: String,
        ty: Option<TsType>,
        init: TsExpr,
    },
    /// Expression statement
    Expr(TsExpr),
    /// Return statement
    Return(Option<TsExpr>),
    /// Raw code block (for complex patterns that don't fit the AST)
    Raw(String),
}

/// Function definition
#[derive(Debug, Clone, PartialEq)]
pub struct TsFunction {
    pub name: String,
    pub doc: Option<String>,
    pub type_params: Vec<String>,
    pub params: Vec<TsParam>,
    pub return_type: Option<TsType>,
    pub body: Vec<TsStmt>,
    pub is_async: bool,
    pub is_export: bool,
    pub is_arrow: bool,
}

impl TsFunction {
    /// A top-level block emitted verbatim (classes, constants).
    ///
    /// An empty name marks the function as a raw block.
    pub fn raw_block(code: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            doc: None,
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: None,
            body: vec![TsStmt::Raw(code.into())],
            is_async: false,
            is_export: false,
            is_arrow: false,
        }
    }
}

/// Complete TypeScript module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TsModule {
    pub imports: Vec<TsImport>,
    pub types: Vec<TsTypeDef>,
    pub functions: Vec<TsFunction>,
}
