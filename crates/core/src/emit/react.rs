//! React target: TanStack Query hooks over the shared fetchers.
//!
//! Safe methods get a query key helper and a `useQuery` hook, fetched on mount and
//! refreshed with `refetch`. Mutating methods get a `useMutation` hook that only runs
//! when `mutate` is called.

use super::ts::{
    FetcherSignature, Render, TsExpr, TsFunction, TsImport, TsLiteral, TsParam, TsPrimitive,
    TsStmt, TsType,
};
use super::{CodeEmitter, EmitContext, Framework};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReactEmitter;

impl CodeEmitter for ReactEmitter {
    fn framework(&self) -> Framework {
        Framework::React
    }

    fn binding_imports(&self, ctx: &EmitContext<'_>) -> Vec<TsImport> {
        let has_queries = ctx.endpoints.iter().any(|e| e.method.is_safe());
        let has_mutations = ctx.endpoints.iter().any(|e| !e.method.is_safe());

        let mut runtime_items = Vec::new();
        let mut type_items = Vec::new();
        if has_queries {
            runtime_items.push("useQuery".to_string());
            type_items.push("UseQueryOptions".to_string());
        }
        if has_mutations {
            runtime_items.push("useMutation".to_string());
            type_items.push("UseMutationOptions".to_string());
        }

        let mut imports = Vec::new();
        if !runtime_items.is_empty() {
            imports.push(TsImport::new(runtime_items, "@tanstack/react-query"));
            imports.push(TsImport::types(type_items, "@tanstack/react-query"));
            imports.push(TsImport::types(vec!["ApiError".into()], "./client"));
        }
        imports
    }

    fn emit_endpoint_binding(&self, ctx: &EmitContext<'_>, index: usize) -> Vec<TsFunction> {
        let signature = FetcherSignature::for_endpoint(ctx, index);
        if ctx.endpoints[index].method.is_safe() {
            vec![
                query_key_function(ctx, index, &signature),
                query_hook(ctx, index, &signature),
            ]
        } else {
            vec![mutation_hook(ctx, index, &signature)]
        }
    }
}

/// `export const getUserKey = (params?: GetUserParams) => ["/users/{id}", params] as const;`
fn query_key_function(ctx: &EmitContext<'_>, index: usize, sig: &FetcherSignature) -> TsFunction {
    let mut items = vec![TsExpr::Literal(TsLiteral::String(
        ctx.endpoints[index].path.clone(),
    ))];
    let mut params = Vec::new();
    if let Some(ty) = &sig.params {
        params.push(TsParam::new("params", ty.clone()).optional());
        items.push(TsExpr::ident("params"));
    }
    let key = TsExpr::Cast {
        expr: Box::new(TsExpr::Array(items)),
        ty: TsType::Ref("const".into()),
    };

    TsFunction {
        name: ctx.names.bindings[index].key.clone(),
        doc: None,
        type_params: vec![],
        params,
        return_type: None,
        body: vec![TsStmt::Return(Some(key))],
        is_async: false,
        is_export: true,
        is_arrow: true,
    }
}

fn query_hook(ctx: &EmitContext<'_>, index: usize, sig: &FetcherSignature) -> TsFunction {
    let names = &ctx.names.bindings[index];
    let response = sig.response.render();

    let mut params = sig.params();
    params.push(
        TsParam::new(
            "options",
            TsType::Ref(format!(
                "{{ query?: Omit<UseQueryOptions<{response}, ApiError, TData>, \"queryKey\" | \"queryFn\"> }}"
            )),
        )
        .optional(),
    );

    let key_args = if sig.params.is_some() {
        vec![TsExpr::ident("params")]
    } else {
        vec![]
    };
    let query_fn = TsExpr::Arrow {
        params: vec![],
        body: Box::new(TsExpr::call(
            TsExpr::ident(names.fetcher.clone()),
            sig.forward_args(),
        )),
    };
    let call = TsExpr::call(
        TsExpr::ident("useQuery"),
        vec![TsExpr::Raw(format!(
            "{{ queryKey: {}, queryFn: {}, ...options?.query }}",
            TsExpr::call(TsExpr::ident(names.key.clone()), key_args).render(),
            query_fn.render()
        ))],
    );

    TsFunction {
        name: names.binding.clone(),
        doc: ctx.endpoints[index].summary.clone(),
        type_params: vec![format!("TData = {response}")],
        params,
        return_type: None,
        body: vec![TsStmt::Return(Some(call))],
        is_async: false,
        is_export: true,
        is_arrow: false,
    }
}

fn mutation_hook(ctx: &EmitContext<'_>, index: usize, sig: &FetcherSignature) -> TsFunction {
    let names = &ctx.names.bindings[index];
    let fetcher = TsExpr::ident(names.fetcher.clone());

    // Mutation variables: `{ params, data }`, `{ params }`, the body itself, or nothing.
    let (vars, mutation_fn) = match (&sig.params, &sig.data) {
        (Some(params), Some(data)) => (
            TsType::Ref(format!(
                "{{ params: {}; data: {} }}",
                params.render(),
                data.render()
            )),
            arrow("vars", TsExpr::call(fetcher, vec![vars_member("params"), vars_member("data")])),
        ),
        (Some(params), None) => (
            TsType::Ref(format!("{{ params: {} }}", params.render())),
            arrow("vars", TsExpr::call(fetcher, vec![vars_member("params")])),
        ),
        (None, Some(data)) => (
            data.clone(),
            arrow("data", TsExpr::call(fetcher, vec![TsExpr::ident("data")])),
        ),
        (None, None) => (
            TsType::Primitive(TsPrimitive::Void),
            TsExpr::Arrow {
                params: vec![],
                body: Box::new(TsExpr::call(fetcher, vec![])),
            },
        ),
    };

    let options = TsParam::new(
        "options",
        TsType::Ref(format!(
            "{{ mutation?: UseMutationOptions<{}, ApiError, {}> }}",
            sig.response.render(),
            vars.render()
        )),
    )
    .optional();

    let call = TsExpr::call(
        TsExpr::ident("useMutation"),
        vec![TsExpr::Raw(format!(
            "{{ mutationFn: {}, ...options?.mutation }}",
            mutation_fn.render()
        ))],
    );

    TsFunction {
        name: names.binding.clone(),
        doc: ctx.endpoints[index].summary.clone(),
        type_params: vec![],
        params: vec![options],
        return_type: None,
        body: vec![TsStmt::Return(Some(call))],
        is_async: false,
        is_export: true,
        is_arrow: false,
    }
}

fn arrow(param: &str, body: TsExpr) -> TsExpr {
    TsExpr::Arrow {
        params: vec![TsParam::untyped(param)],
        body: Box::new(body),
    }
}

fn vars_member(prop: &str) -> TsExpr {
    TsExpr::member(TsExpr::ident("vars"), prop)
}
