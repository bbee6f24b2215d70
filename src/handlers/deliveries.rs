use axum::{
    extract::rejection::PathRejection,
    extract::{Path, State},
    response::Json,
};
use model::DeliveryStatus;
use serde::{Deserialize, Serialize};
use service::deliveries::{list_deliveries, DeliveryScope, DeliveryView};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::handlers::accounts::AddressResponse;
use crate::handlers::auth::AccountResponse;
use crate::helpers::dates::rfc3339_millis;
use crate::schemas::{ApiResponse, AppState};

/// A delivery with both addresses and all parties resolved
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub pickup_address_id: i32,
    pub dropoff_address_id: i32,
    pub rider_id: Option<Uuid>,
    #[schema(value_type = String, example = "PICKED_UP")]
    pub base_status: DeliveryStatus,
    /// RFC 3339, e.g. `2025-03-01T12:30:00.042Z`
    pub created_at: String,
    pub updated_at: String,
    pub pickup_address: Option<AddressResponse>,
    pub dropoff_address: Option<AddressResponse>,
    pub sender: Option<AccountResponse>,
    pub receiver: Option<AccountResponse>,
    /// Null until a rider accepts the delivery
    pub rider: Option<AccountResponse>,
}

impl From<DeliveryView> for DeliveryResponse {
    fn from(view: DeliveryView) -> Self {
        Self {
            id: view.delivery.id,
            sender_id: view.delivery.sender_id,
            receiver_id: view.delivery.receiver_id,
            pickup_address_id: view.delivery.pickup_address_id,
            dropoff_address_id: view.delivery.dropoff_address_id,
            rider_id: view.delivery.rider_id,
            base_status: view.delivery.base_status,
            created_at: rfc3339_millis(view.delivery.created_at),
            updated_at: rfc3339_millis(view.delivery.updated_at),
            pickup_address: view.pickup_address.map(Into::into),
            dropoff_address: view.dropoff_address.map(Into::into),
            sender: view.sender.map(Into::into),
            receiver: view.receiver.map(Into::into),
            rider: view.rider.map(Into::into),
        }
    }
}

async fn respond(
    state: &AppState,
    user_id: Uuid,
    scope: DeliveryScope,
    status: Option<&str>,
) -> Result<Json<ApiResponse<Vec<DeliveryResponse>>>> {
    let views = list_deliveries(&state.db, user_id, scope, status).await?;
    debug!("Returning {} deliveries", views.len());

    Ok(Json(ApiResponse::success(
        "Deliveries retrieved successfully",
        views.into_iter().map(DeliveryResponse::from).collect(),
    )))
}

fn not_found(rejection: PathRejection) -> ApiError {
    debug!("Rejected delivery path: {}", rejection);
    ApiError::NotFound("User not found".to_string())
}

/// Deliveries the user sent or receives, newest first
#[utoipa::path(
    get,
    path = "/delivery/user/{user_id}",
    tag = "deliveries",
    params(
        ("user_id" = Uuid, Path, description = "Account ID of the sender or receiver")
    ),
    responses(
        (status = 200, description = "Deliveries retrieved", body = ApiResponse<Vec<DeliveryResponse>>),
        (status = 404, description = "Malformed user ID", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_deliveries(
    State(state): State<AppState>,
    user_id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<Vec<DeliveryResponse>>>> {
    let Path(user_id) = user_id.map_err(not_found)?;
    respond(&state, user_id, DeliveryScope::Involving, None).await
}

/// Deliveries the user sent, newest first
#[utoipa::path(
    get,
    path = "/delivery/sent/{user_id}",
    tag = "deliveries",
    params(
        ("user_id" = Uuid, Path, description = "Account ID of the sender")
    ),
    responses(
        (status = 200, description = "Deliveries retrieved", body = ApiResponse<Vec<DeliveryResponse>>),
        (status = 404, description = "Malformed user ID", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_sent_deliveries(
    State(state): State<AppState>,
    user_id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<Vec<DeliveryResponse>>>> {
    let Path(user_id) = user_id.map_err(not_found)?;
    respond(&state, user_id, DeliveryScope::Sent, None).await
}

/// Deliveries addressed to the user, newest first
#[utoipa::path(
    get,
    path = "/delivery/received/{user_id}",
    tag = "deliveries",
    params(
        ("user_id" = Uuid, Path, description = "Account ID of the receiver")
    ),
    responses(
        (status = 200, description = "Deliveries retrieved", body = ApiResponse<Vec<DeliveryResponse>>),
        (status = 404, description = "Malformed user ID", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_received_deliveries(
    State(state): State<AppState>,
    user_id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<Vec<DeliveryResponse>>>> {
    let Path(user_id) = user_id.map_err(not_found)?;
    respond(&state, user_id, DeliveryScope::Received, None).await
}

/// Deliveries involving the user in one status, newest first
///
/// The status is matched case-insensitively; an unknown status yields an
/// empty list.
#[utoipa::path(
    get,
    path = "/delivery/user/{user_id}/status/{status}",
    tag = "deliveries",
    params(
        ("user_id" = Uuid, Path, description = "Account ID of the sender or receiver"),
        ("status" = String, Path, description = "WAITING, ACCEPTED, PICKED_UP or DELIVERED")
    ),
    responses(
        (status = 200, description = "Deliveries retrieved", body = ApiResponse<Vec<DeliveryResponse>>),
        (status = 404, description = "Malformed user ID", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_deliveries_by_status(
    State(state): State<AppState>,
    params: std::result::Result<Path<(Uuid, String)>, PathRejection>,
) -> Result<Json<ApiResponse<Vec<DeliveryResponse>>>> {
    let Path((user_id, status)) = params.map_err(not_found)?;
    respond(&state, user_id, DeliveryScope::Involving, Some(&status)).await
}
