//! Vue target: composables returning `{ data, loading, error, execute }` refs.

use super::ts::{FetcherSignature, TsExpr, TsFunction, TsImport, TsStmt};
use super::{CodeEmitter, EmitContext, Framework};

const CREATE_BINDING: &str = r#"export interface Binding<TArgs extends unknown[], TResult> {
  data: Ref<TResult | undefined>;
  loading: Ref<boolean>;
  error: Ref<Error | null>;
  execute: (...args: TArgs) => Promise<TResult | undefined>;
}

function createBinding<TArgs extends unknown[], TResult>(
  fn: (...args: TArgs) => Promise<TResult>,
): Binding<TArgs, TResult> {
  const data = ref<TResult>() as Ref<TResult | undefined>;
  const loading = ref(false);
  const error = ref<Error | null>(null);

  const execute = async (...args: TArgs): Promise<TResult | undefined> => {
    loading.value = true;
    error.value = null;
    try {
      data.value = await fn(...args);
      return data.value;
    } catch (e) {
      error.value = e instanceof Error ? e : new Error(String(e));
      return undefined;
    } finally {
      loading.value = false;
    }
  };

  return { data, loading, error, execute };
}"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct VueEmitter;

impl CodeEmitter for VueEmitter {
    fn framework(&self) -> Framework {
        Framework::Vue
    }

    fn binding_imports(&self, _ctx: &EmitContext<'_>) -> Vec<TsImport> {
        vec![
            TsImport::new(vec!["ref".into()], "vue"),
            TsImport::types(vec!["Ref".into()], "vue"),
        ]
    }

    fn binding_prelude(&self) -> Vec<TsFunction> {
        vec![TsFunction::raw_block(CREATE_BINDING)]
    }

    /// Safe methods execute immediately with the arguments given to the composable;
    /// mutating ones take their arguments on `execute`.
    fn emit_endpoint_binding(&self, ctx: &EmitContext<'_>, index: usize) -> Vec<TsFunction> {
        let endpoint = &ctx.endpoints[index];
        let names = &ctx.names.bindings[index];
        let signature = FetcherSignature::for_endpoint(ctx, index);
        let fetcher_call = TsExpr::call(
            TsExpr::ident(names.fetcher.clone()),
            signature.forward_args(),
        );

        let (params, body) = if endpoint.method.is_safe() {
            let binding = TsExpr::call(
                TsExpr::ident("createBinding"),
                vec![TsExpr::Arrow {
                    params: vec![],
                    body: Box::new(fetcher_call),
                }],
            );
            let body = vec![
                TsStmt::Const {
                    name: "binding".into(),
                    ty: None,
                    init: binding,
                },
                TsStmt::Expr(TsExpr::Raw("void binding.execute()".into())),
                TsStmt::Return(Some(TsExpr::ident("binding"))),
            ];
            (signature.params(), body)
        } else {
            let binding = TsExpr::call(
                TsExpr::ident("createBinding"),
                vec![TsExpr::Arrow {
                    params: signature.params(),
                    body: Box::new(fetcher_call),
                }],
            );
            (vec![], vec![TsStmt::Return(Some(binding))])
        };

        vec![TsFunction {
            name: names.binding.clone(),
            doc: endpoint.summary.clone(),
            type_params: vec![],
            params,
            return_type: None,
            body,
            is_async: false,
            is_export: true,
            is_arrow: false,
        }]
    }
}
