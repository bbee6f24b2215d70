use crate::handlers::{
    accounts::{check_phone, get_account, register},
    auth::{login, select_role},
    deliveries::{
        get_received_deliveries, get_sent_deliveries, get_user_deliveries,
        get_user_deliveries_by_status,
    },
    health::health_check,
    images::get_image,
};
use crate::rate_limit::{global_limit, login_limit};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Login endpoints share a tighter quota
    let login_routes = Router::new()
        .route("/account/login", post(login))
        .route("/account/login/select-role", post(select_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_limit));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Accounts
        .route("/account/register", post(register))
        .route("/account/check-phone", post(check_phone))
        .route("/account/:account_id", get(get_account))
        .merge(login_routes)
        // Deliveries
        .route("/delivery/user/:user_id", get(get_user_deliveries))
        .route("/delivery/sent/:user_id", get(get_sent_deliveries))
        .route("/delivery/received/:user_id", get(get_received_deliveries))
        .route(
            "/delivery/user/:user_id/status/:status",
            get(get_user_deliveries_by_status),
        )
        // Uploaded images
        .route("/image/:filename", get(get_image))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), global_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
