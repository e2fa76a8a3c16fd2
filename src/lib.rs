pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod types;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::auth::{Authenticator, InMemoryRateLimiter};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::database::{FundStore, SessionStore};
use crate::services::{MutationService, QueryService, RecoveryService, SheetImporter};

/// Everything a handler needs, cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Authenticator,
    pub mutations: MutationService,
    pub recovery: RecoveryService,
    pub query: QueryService,
    pub importer: SheetImporter,
    pub funds: Arc<dyn FundStore>,
}

impl AppState {
    /// Wire the services over one store that holds both sessions and funds
    pub fn new<S>(config: Arc<AppConfig>, store: Arc<S>, clock: Arc<dyn Clock>) -> Self
    where
        S: SessionStore + FundStore + 'static,
    {
        let limiter = Arc::new(InMemoryRateLimiter::new(
            config.auth.login_max_attempts,
            config.auth.login_window(),
        ));
        let auth = Authenticator::new(&config.auth, store.clone(), limiter, clock.clone());

        let funds: Arc<dyn FundStore> = store;
        let mutations = MutationService::new(funds.clone(), clock.clone());

        Self {
            config,
            auth,
            recovery: RecoveryService::new(funds.clone(), clock),
            query: QueryService::new(funds.clone()),
            importer: SheetImporter::new(mutations.clone()),
            mutations,
            funds,
        }
    }
}

/// The full HTTP surface
pub fn app(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;
    let cors = middleware::cors_layers(&state.config.security);

    Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(finance_routes())
        // Global middleware
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn finance_routes() -> Router<AppState> {
    Router::new()
        .route("/api/finance/auth", endpoint(post(handlers::auth_post)))
        .route("/api/finance/data", endpoint(get(handlers::data_get)))
        .route(
            "/api/finance/mutate",
            endpoint(post(handlers::mutate).put(handlers::mutate).delete(handlers::mutate)),
        )
        .route("/api/finance/recover", endpoint(post(handlers::recover).delete(handlers::recover)))
        .route("/api/finance/migrate", endpoint(post(handlers::migrate_post)))
}

/// Preflight answered with 204, any other unlisted method with a JSON 405
fn endpoint(methods: MethodRouter<AppState>) -> MethodRouter<AppState> {
    methods
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}
