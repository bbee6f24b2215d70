use axum::{extract::rejection::JsonRejection, extract::State, response::Json};
use model::entities::account;
use model::Role;
use serde::{Deserialize, Serialize};
use service::authentication::{Authenticator, LoginOutcome};
use service::ServiceError;
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, Result};
use crate::schemas::{ApiResponse, AppState};

/// Request body for logging in
#[derive(Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 10))]
    pub phone_number: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request body for logging in as a specific role
#[derive(Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectRoleRequest {
    #[validate(length(min = 1, max = 10))]
    pub phone_number: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// `USER` or `RIDER`, case-insensitive
    pub role: String,
}

/// Public identity of an account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub phone_number: String,
    pub firstname: String,
    pub lastname: Option<String>,
    #[schema(value_type = String, example = "USER")]
    pub role: Role,
    pub avatar_url: String,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            phone_number: model.phone_number,
            firstname: model.firstname,
            lastname: model.lastname,
            role: model.role,
            avatar_url: model.avatar_url,
        }
    }
}

/// Login result. When the password matches accounts in several roles,
/// `account` is null and `candidates` lists them.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub requires_role_selection: bool,
    pub account: Option<AccountResponse>,
    pub candidates: Vec<AccountResponse>,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        match outcome {
            LoginOutcome::Authenticated(account) => Self {
                requires_role_selection: false,
                account: Some(account.into()),
                candidates: Vec::new(),
            },
            LoginOutcome::RoleSelectionRequired(accounts) => Self {
                requires_role_selection: true,
                account: None,
                candidates: accounts.into_iter().map(AccountResponse::from).collect(),
            },
        }
    }
}

/// Log in with phone number and password
#[utoipa::path(
    post,
    path = "/account/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, or role selection required", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Malformed request", body = crate::schemas::ErrorResponse),
        (status = 401, description = "Invalid phone number or password", body = crate::schemas::ErrorResponse),
        (status = 429, description = "Too many login attempts", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    request: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    trace!("Entering login function");
    let Json(mut request) = request?;
    request.phone_number = request.phone_number.trim().to_string();
    request.validate().map_err(ServiceError::from)?;

    let outcome = Authenticator::new(&state.db, &state.passwords)
        .login(&request.phone_number, &request.password)
        .await?;

    let message = match &outcome {
        LoginOutcome::Authenticated(_) => "Login successful",
        LoginOutcome::RoleSelectionRequired(accounts) => {
            debug!("{} roles match, client must choose", accounts.len());
            "Multiple accounts found, please select a role"
        }
    };

    Ok(Json(ApiResponse::success(message, outcome.into())))
}

/// Log in as one role of a shared phone number
#[utoipa::path(
    post,
    path = "/account/login/select-role",
    tag = "auth",
    request_body = SelectRoleRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Malformed request or unknown role", body = crate::schemas::ErrorResponse),
        (status = 401, description = "Invalid phone number or password", body = crate::schemas::ErrorResponse),
        (status = 429, description = "Too many login attempts", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn select_role(
    State(state): State<AppState>,
    request: std::result::Result<Json<SelectRoleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AccountResponse>>> {
    trace!("Entering select_role function");
    let Json(mut request) = request?;
    request.phone_number = request.phone_number.trim().to_string();
    request.validate().map_err(ServiceError::from)?;

    let role: Role = request.role.parse().map_err(|e| ApiError::Validation {
        field: "role".to_string(),
        message: format!("{}; expected USER or RIDER", e),
    })?;

    let account = Authenticator::new(&state.db, &state.passwords)
        .login_with_role(&request.phone_number, &request.password, role)
        .await?;
    info!("Account {} logged in as {}", account.id, role);

    Ok(Json(ApiResponse::success("Login successful", account.into())))
}
