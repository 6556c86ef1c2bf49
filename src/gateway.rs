use std::sync::Arc;

use async_graphql::{Response, ServerError, Variables};
use serde::Deserialize;

use crate::{
    config::Config,
    context::ContextBuilder,
    depth::DepthLimit,
    schema::{build_schema, GraphSchema},
    store::Store,
};

/// A GraphQL request as it arrives from a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<serde_json::Value>,
    #[serde(default)]
    pub operation_name: Option<String>,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Default::default() }
    }

    pub fn variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// Runs requests through depth validation and into the schema, each with its own loaders.
pub struct Gateway {
    schema: GraphSchema,
    contexts: ContextBuilder,
    depth_limit: DepthLimit,
}

impl Gateway {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            schema: build_schema(),
            contexts: ContextBuilder::new(store).prefetch(config.prefetch),
            depth_limit: DepthLimit::new(config.max_depth)
                .ignore_introspection(config.ignore_introspection),
        }
    }

    pub fn schema(&self) -> &GraphSchema {
        &self.schema
    }

    /// Executes one request. A request that fails validation is answered with the validation
    /// errors only; no resolver runs and the store is never touched.
    pub async fn execute(&self, request: GraphQlRequest) -> Response {
        if let Err(errors) = self.depth_limit.validate(&request.query) {
            return Response::from_errors(errors.into_iter().map(ServerError::from).collect());
        }

        let mut graphql_request = async_graphql::Request::new(request.query)
            .data(self.contexts.build());
        if let Some(variables) = request.variables {
            graphql_request = graphql_request.variables(Variables::from_json(variables));
        }
        if let Some(operation_name) = request.operation_name {
            graphql_request = graphql_request.operation_name(operation_name);
        }

        let response = self.schema.execute(graphql_request).await;
        if response.is_err() {
            tracing::debug!(errors = response.errors.len(), "request finished with errors");
        }
        response
    }
}
