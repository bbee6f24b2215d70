use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use service::content_store::ContentStore;
use service::password::PasswordService;
use utoipa::{OpenApi, ToSchema};

use crate::config::AppConfig;
use crate::handlers::accounts::{
    AccountDetailResponse, AddressResponse, CheckPhoneRequest, CheckPhoneResponse,
    RegisterRequest, RegisterResponse, RiderProfileResponse,
};
use crate::handlers::auth::{AccountResponse, LoginRequest, LoginResponse, SelectRoleRequest};
use crate::handlers::deliveries::DeliveryResponse;
use crate::rate_limit::RateLimits;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    /// Where uploaded images are written and served from
    pub content_store: Arc<dyn ContentStore>,
    pub passwords: PasswordService,
    pub rate_limits: RateLimits,
}

/// Outcome tag carried by every response body.
///
/// `fail` means the client sent something unusable, `error` means the
/// server could not complete a valid request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Fail,
    Error,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always `success`
    pub status: ResponseStatus,
    /// Response message
    pub message: String,
    /// Response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// `fail` or `error`
    pub status: ResponseStatus,
    /// Human readable error message
    pub message: String,
    /// Structured context, e.g. the offending field
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::accounts::register,
        crate::handlers::accounts::check_phone,
        crate::handlers::accounts::get_account,
        crate::handlers::auth::login,
        crate::handlers::auth::select_role,
        crate::handlers::deliveries::get_user_deliveries,
        crate::handlers::deliveries::get_sent_deliveries,
        crate::handlers::deliveries::get_received_deliveries,
        crate::handlers::deliveries::get_user_deliveries_by_status,
        crate::handlers::images::get_image,
    ),
    components(
        schemas(
            ApiResponse<RegisterResponse>,
            ApiResponse<LoginResponse>,
            ApiResponse<AccountResponse>,
            ApiResponse<CheckPhoneResponse>,
            ApiResponse<AccountDetailResponse>,
            ApiResponse<Vec<DeliveryResponse>>,
            ResponseStatus,
            ErrorResponse,
            HealthResponse,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            SelectRoleRequest,
            LoginResponse,
            AccountResponse,
            CheckPhoneRequest,
            CheckPhoneResponse,
            AccountDetailResponse,
            RiderProfileResponse,
            AddressResponse,
            DeliveryResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Registration and account lookup"),
        (name = "auth", description = "Phone number and password login"),
        (name = "deliveries", description = "Delivery listings for a user"),
        (name = "images", description = "Uploaded avatars and vehicle photos"),
    ),
    info(
        title = "Ridy API",
        description = "Delivery backend for users sending parcels and the riders who carry them",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
