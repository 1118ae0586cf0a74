//! Plain async fetchers, one per endpoint, shared by every framework's `bindings.ts`.

use std::collections::BTreeSet;

use super::render::Render;
use super::schema::TypeMapper;
use super::types::{
    TemplatePart, TsExpr, TsFunction, TsImport, TsLiteral, TsParam, TsStmt, TsType,
};
use super::utils::{escape_js_string, format_param_access};
use crate::emit::EmitContext;
use crate::openapi::{BodyEncoding, Endpoint, ParamLocation};

/// Argument and result types of one endpoint's fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherSignature {
    /// Path/query/header parameters interface.
    pub params: Option<TsType>,
    pub params_optional: bool,
    /// Request body.
    pub data: Option<TsType>,
    pub data_optional: bool,
    pub response: TsType,
}

impl FetcherSignature {
    pub fn for_endpoint(ctx: &EmitContext<'_>, index: usize) -> Self {
        let endpoint = &ctx.endpoints[index];
        let names = &ctx.names.endpoint_types[index];
        let mapper = TypeMapper::new(&ctx.names.schema_types);

        let body = endpoint.body();
        let data = body.map(|b| {
            names
                .body
                .clone()
                .map_or_else(|| mapper.ts_type(&b.schema), TsType::Ref)
        });
        let data_optional = body.is_some_and(|b| !b.required);
        let response = names.response.clone().map_or_else(
            || mapper.ts_type_or_unknown(endpoint.response.as_ref()),
            TsType::Ref,
        );

        // An optional leading argument may not precede a required one.
        let params_optional = !endpoint.request_params().any(|p| p.required)
            && (data.is_none() || data_optional);

        Self {
            params: names.params.clone().map(TsType::Ref),
            params_optional,
            data,
            data_optional,
            response,
        }
    }

    /// Fetcher arguments ahead of the trailing `client`.
    pub fn params(&self) -> Vec<TsParam> {
        let mut params = Vec::new();
        if let Some(ty) = &self.params {
            let param = TsParam::new("params", ty.clone());
            params.push(if self.params_optional { param.optional() } else { param });
        }
        if let Some(ty) = &self.data {
            let param = TsParam::new("data", ty.clone());
            params.push(if self.data_optional { param.optional() } else { param });
        }
        params
    }

    /// Argument list forwarding `params`/`data` in fetcher order.
    pub fn forward_args(&self) -> Vec<TsExpr> {
        let mut args = Vec::new();
        if self.params.is_some() {
            args.push(TsExpr::ident("params"));
        }
        if self.data.is_some() {
            args.push(TsExpr::ident("data"));
        }
        args
    }

    fn collect_refs(&self, out: &mut BTreeSet<String>) {
        for ty in self.params.iter().chain(&self.data).chain([&self.response]) {
            ty.collect_refs(out);
        }
    }
}

/// `export const getUser = async (params, client = apiClient): Promise<User> => ...`
pub fn fetcher(ctx: &EmitContext<'_>, index: usize) -> TsFunction {
    let endpoint = &ctx.endpoints[index];
    let signature = FetcherSignature::for_endpoint(ctx, index);
    let access_required = !signature.params_optional;

    let mut options: Vec<(String, TsExpr)> =
        vec![("route".into(), TsExpr::string(endpoint.route_key()))];

    let query: Vec<(String, TsExpr)> = endpoint
        .params_in(ParamLocation::Query)
        .map(|p| {
            (
                p.name.clone(),
                TsExpr::Raw(format_param_access("params", &p.name, access_required)),
            )
        })
        .collect();
    if !query.is_empty() {
        options.push(("params".into(), TsExpr::Object(query)));
    }

    if let Some(headers) = header_object(endpoint, access_required) {
        options.push(("headers".into(), headers));
    }

    if signature.data.is_some() {
        options.push(("body".into(), TsExpr::ident("data")));
        match endpoint.body_encoding {
            BodyEncoding::Json => {}
            BodyEncoding::FormData => {
                options.push(("bodyEncoding".into(), TsExpr::string("form-data")));
            }
            BodyEncoding::UrlEncoded => {
                options.push(("bodyEncoding".into(), TsExpr::string("urlencoded")));
            }
        }
    }

    if !endpoint.requires_auth {
        options.push(("auth".into(), TsExpr::Literal(TsLiteral::Bool(false))));
    }

    let call = TsExpr::call(
        TsExpr::member(
            TsExpr::ident("client"),
            format!("{}<{}>", endpoint.method.key(), signature.response.render()),
        ),
        vec![path_expr(&endpoint.path, access_required), TsExpr::Object(options)],
    );

    let mut params = signature.params();
    params.push(
        TsParam::new("client", TsType::Ref("ApiClient".into()))
            .with_default(TsExpr::ident("apiClient")),
    );

    TsFunction {
        name: ctx.names.bindings[index].fetcher.clone(),
        doc: endpoint.summary.clone(),
        type_params: vec![],
        params,
        return_type: Some(TsType::Ref(format!(
            "Promise<{}>",
            signature.response.render()
        ))),
        body: vec![TsStmt::Return(Some(call))],
        is_async: true,
        is_export: true,
        is_arrow: true,
    }
}

/// The request path, with placeholders interpolated from `params`.
fn path_expr(path: &str, required: bool) -> TsExpr {
    let mut parts = Vec::new();
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|c| open + c) else {
            break;
        };
        if open > 0 {
            parts.push(TemplatePart::Static(rest[..open].to_string()));
        }
        let access = format_param_access("params", &rest[open + 1..close], required);
        parts.push(TemplatePart::Dynamic(TsExpr::call(
            TsExpr::ident("encodeURIComponent"),
            vec![TsExpr::call(TsExpr::ident("String"), vec![TsExpr::Raw(access)])],
        )));
        rest = &rest[close + 1..];
    }
    if parts.is_empty() {
        return TsExpr::string(path);
    }
    if !rest.is_empty() {
        parts.push(TemplatePart::Static(rest.to_string()));
    }
    TsExpr::Template(parts)
}

/// Header parameters; optional ones are only sent when set.
fn header_object(endpoint: &Endpoint, access_required: bool) -> Option<TsExpr> {
    let entries: Vec<String> = endpoint
        .params_in(ParamLocation::Header)
        .map(|hp| {
            let key = escape_js_string(&hp.name);
            if hp.required {
                let access = format_param_access("params", &hp.name, access_required);
                format!("\"{key}\": String({access})")
            } else {
                let access = format_param_access("params", &hp.name, false);
                let direct_access = format_param_access("params", &hp.name, true);
                format!("...({access} != null && {{ \"{key}\": String({direct_access}) }})")
            }
        })
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(TsExpr::Raw(format!("{{ {} }}", entries.join(", "))))
    }
}

/// Imports every `bindings.ts` needs: the client and the referenced generated types.
pub fn fetcher_imports(ctx: &EmitContext<'_>) -> Vec<TsImport> {
    let mut refs = BTreeSet::new();
    for index in 0..ctx.endpoints.len() {
        FetcherSignature::for_endpoint(ctx, index).collect_refs(&mut refs);
    }
    let defined: BTreeSet<&str> = ctx
        .names
        .schema_types
        .values()
        .map(String::as_str)
        .chain(ctx.names.endpoint_types.iter().flat_map(|names| {
            [&names.params, &names.body, &names.response]
                .into_iter()
                .flatten()
                .map(String::as_str)
        }))
        .collect();
    let type_items: Vec<String> = refs
        .into_iter()
        .filter(|name| defined.contains(name.as_str()))
        .collect();

    let mut imports = vec![
        TsImport::new(vec!["apiClient".into()], "./client"),
        TsImport::types(vec!["ApiClient".into()], "./client"),
    ];
    if !type_items.is_empty() {
        imports.push(TsImport::types(type_items, "./types"));
    }
    imports
}
