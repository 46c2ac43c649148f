use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::Html,
    routing::get,
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::graphql::context::AuthContext;
use crate::graphql::ApiSchema;
use crate::jwt::{identity_from_headers, JwtService};

pub const GRAPHQL_PATH: &str = "/graphql";
pub const SUBSCRIPTIONS_PATH: &str = "/graphql/ws";

pub struct AppState {
    pub schema: ApiSchema,
    /// None when no JWT secret is configured; every request is then anonymous.
    pub jwt: Option<JwtService>,
}

async fn graphql_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let identity = state
        .jwt
        .as_ref()
        .and_then(|jwt| identity_from_headers(jwt, &headers));
    let req = req.into_inner().data(AuthContext(identity));
    state.schema.execute(req).await.into()
}

async fn graphiql() -> Html<String> {
    Html(
        GraphiQLSource::build()
            .endpoint(GRAPHQL_PATH)
            .subscription_endpoint(SUBSCRIPTIONS_PATH)
            .finish(),
    )
}

pub fn build_router(schema: ApiSchema, jwt: Option<JwtService>) -> Router {
    let state = Arc::new(AppState {
        schema: schema.clone(),
        jwt,
    });

    Router::new()
        // GraphQL
        .route(GRAPHQL_PATH, get(graphiql).post(graphql_handler))
        .route_service(SUBSCRIPTIONS_PATH, GraphQLSubscription::new(schema))
        // Health check
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Responses without a cache hint (mutations, errors, GraphiQL) are not cached
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CompressionLayer::new())
        // Logging layer: method + path only
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}
