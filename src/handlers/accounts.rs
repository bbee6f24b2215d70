use axum::{
    extract::multipart::{Field, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Multipart, Path, State},
    response::Json,
};
use model::entities::{rider_profile, user_address, user_pickup_address};
use model::Role;
use serde::{Deserialize, Serialize};
use service::accounts::{self, AccountDetail};
use service::content_store::Upload;
use service::registration::{RegistrationForm, Registrar};
use service::ServiceError;
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, Result};
use crate::helpers::dates::{rfc3339_millis, thai_datetime};
use crate::schemas::{ApiResponse, AppState};

/// Multipart form accepted by `POST /account/register`.
///
/// Field names are matched case-insensitively and a trailing `[]` is
/// ignored. The plural address fields may repeat; when any of them is
/// present for a group they replace the single fields of that group.
#[allow(dead_code)]
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "0812345678")]
    phone_number: String,
    password: String,
    firstname: String,
    lastname: Option<String>,
    #[schema(example = "USER")]
    role: String,
    #[schema(value_type = String, format = Binary)]
    avatar_file_data: Vec<u8>,
    /// Riders only
    vehicle_plate: Option<String>,
    /// Riders only
    #[schema(value_type = Option<String>, format = Binary)]
    vehicle_photo_data: Option<Vec<u8>>,
    address_label: Option<String>,
    address_text: Option<String>,
    address_latitude: Option<f64>,
    address_longitude: Option<f64>,
    pickup_address_label: Option<String>,
    pickup_address_text: Option<String>,
    pickup_address_latitude: Option<f64>,
    pickup_address_longitude: Option<f64>,
    address_labels: Vec<String>,
    address_texts: Vec<String>,
    address_latitudes: Vec<f64>,
    address_longitudes: Vec<f64>,
    pickup_address_labels: Vec<String>,
    pickup_address_texts: Vec<String>,
    pickup_address_latitudes: Vec<f64>,
    pickup_address_longitudes: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub id: Uuid,
}

/// Request body for checking whether a phone number is free
#[derive(Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckPhoneRequest {
    #[validate(length(min = 1, max = 10))]
    pub phone_number: String,
    /// `USER` or `RIDER`, case-insensitive
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckPhoneResponse {
    pub phone_number: String,
    #[schema(value_type = String, example = "RIDER")]
    pub role: Role,
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiderProfileResponse {
    pub vehicle_plate: String,
    pub vehicle_photo_url: String,
}

impl From<rider_profile::Model> for RiderProfileResponse {
    fn from(model: rider_profile::Model) -> Self {
        Self {
            vehicle_plate: model.vehicle_plate,
            vehicle_photo_url: model.vehicle_photo_url,
        }
    }
}

/// A saved address, either a drop-off (main) or pickup address
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub id: i32,
    pub user_id: Uuid,
    pub label: String,
    pub address_text: String,
    pub latitude: f64,
    pub longitude: f64,
    /// RFC 3339, e.g. `2025-03-01T12:30:00.042Z`
    pub created_at: String,
}

impl From<user_address::Model> for AddressResponse {
    fn from(model: user_address::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            label: model.label,
            address_text: model.address_text,
            latitude: model.latitude,
            longitude: model.longitude,
            created_at: rfc3339_millis(model.created_at),
        }
    }
}

impl From<user_pickup_address::Model> for AddressResponse {
    fn from(model: user_pickup_address::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            label: model.label,
            address_text: model.address_text,
            latitude: model.latitude,
            longitude: model.longitude,
            created_at: rfc3339_millis(model.created_at),
        }
    }
}

/// Account detail. Dates are Thai localized, e.g. `5 มกราคม 2568 14:03:09`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetailResponse {
    pub id: Uuid,
    pub phone_number: String,
    pub firstname: String,
    pub lastname: Option<String>,
    pub fullname: String,
    #[schema(value_type = String, example = "USER")]
    pub role: Role,
    pub avatar_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub rider_profile: Option<RiderProfileResponse>,
    pub addresses: Vec<AddressResponse>,
    pub pickup_addresses: Vec<AddressResponse>,
}

impl From<AccountDetail> for AccountDetailResponse {
    fn from(detail: AccountDetail) -> Self {
        let account = detail.account;
        Self {
            fullname: account.full_name(),
            created_at: thai_datetime(account.created_at),
            updated_at: thai_datetime(account.updated_at),
            id: account.id,
            phone_number: account.phone_number,
            firstname: account.firstname,
            lastname: account.lastname,
            role: account.role,
            avatar_url: account.avatar_url,
            rider_profile: detail.rider_profile.map(Into::into),
            addresses: detail.addresses.into_iter().map(Into::into).collect(),
            pickup_addresses: detail.pickup_addresses.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lowercases and drops a trailing `[]`, so `addressLabels[]` and
/// `AddressLabels` both become `addresslabels`.
fn normalize_field_name(name: &str) -> String {
    name.trim()
        .trim_end_matches("[]")
        .to_ascii_lowercase()
}

async fn read_upload(field: Field<'_>) -> Result<Upload> {
    let file_name = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| "upload".to_string());
    let bytes = field.bytes().await?;
    Ok(Upload::new(file_name, bytes.to_vec()))
}

async fn read_registration_form(mut multipart: Multipart) -> Result<RegistrationForm> {
    let mut form = RegistrationForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(normalize_field_name).unwrap_or_default();
        trace!("Reading form field {}", name);

        match name.as_str() {
            "avatarfiledata" => form.avatar = Some(read_upload(field).await?),
            "vehiclephotodata" => form.vehicle_photo = Some(read_upload(field).await?),
            _ => {
                let value = field.text().await?;
                let address = &mut form.address;
                let pickup = &mut form.pickup_address;
                match name.as_str() {
                    "phonenumber" => form.phone_number = Some(value),
                    "password" => form.password = Some(value),
                    "firstname" => form.firstname = Some(value),
                    "lastname" => form.lastname = Some(value),
                    "role" => form.role = Some(value),
                    "vehicleplate" => form.vehicle_plate = Some(value),
                    "addresslabel" => address.label = Some(value),
                    "addresstext" => address.text = Some(value),
                    "addresslatitude" => address.latitude = Some(value),
                    "addresslongitude" => address.longitude = Some(value),
                    "addresslabels" => address.labels.push(value),
                    "addresstexts" => address.texts.push(value),
                    "addresslatitudes" => address.latitudes.push(value),
                    "addresslongitudes" => address.longitudes.push(value),
                    "pickupaddresslabel" => pickup.label = Some(value),
                    "pickupaddresstext" => pickup.text = Some(value),
                    "pickupaddresslatitude" => pickup.latitude = Some(value),
                    "pickupaddresslongitude" => pickup.longitude = Some(value),
                    "pickupaddresslabels" => pickup.labels.push(value),
                    "pickupaddresstexts" => pickup.texts.push(value),
                    "pickupaddresslatitudes" => pickup.latitudes.push(value),
                    "pickupaddresslongitudes" => pickup.longitudes.push(value),
                    other => debug!("Ignoring unknown form field {}", other),
                }
            }
        }
    }

    Ok(form)
}

/// Register a new USER or RIDER account
#[utoipa::path(
    post,
    path = "/account/register",
    tag = "accounts",
    request_body(content = RegisterRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Account created", body = ApiResponse<RegisterResponse>),
        (status = 400, description = "Invalid form", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Phone number already registered for this role", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<RegisterResponse>>> {
    trace!("Entering register function");
    let form = read_registration_form(multipart?).await?;
    debug!(
        "Form has {} address and {} pickup address array entries",
        form.address.texts.len(),
        form.pickup_address.texts.len()
    );

    let id = Registrar::new(&state.db, state.content_store.as_ref(), &state.passwords)
        .register(form)
        .await?;
    info!("Registered account {}", id);

    Ok(Json(ApiResponse::success(
        "Account created successfully",
        RegisterResponse { id },
    )))
}

/// Check whether a phone number is still free for a role
#[utoipa::path(
    post,
    path = "/account/check-phone",
    tag = "accounts",
    request_body = CheckPhoneRequest,
    responses(
        (status = 200, description = "Phone number is available", body = ApiResponse<CheckPhoneResponse>),
        (status = 400, description = "Malformed request or unknown role", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Phone number already registered for this role", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn check_phone(
    State(state): State<AppState>,
    request: std::result::Result<Json<CheckPhoneRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CheckPhoneResponse>>> {
    let Json(mut request) = request?;
    request.phone_number = request.phone_number.trim().to_string();
    request.validate().map_err(ServiceError::from)?;
    let role: Role = request.role.parse().map_err(|e| ApiError::Validation {
        field: "role".to_string(),
        message: format!("{}; expected USER or RIDER", e),
    })?;

    accounts::check_phone(&state.db, &request.phone_number, role).await?;

    Ok(Json(ApiResponse::success(
        "Phone number is available",
        CheckPhoneResponse {
            phone_number: request.phone_number,
            role,
            available: true,
        },
    )))
}

/// Get an account with its rider profile or addresses
#[utoipa::path(
    get,
    path = "/account/{account_id}",
    tag = "accounts",
    params(
        ("account_id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account found", body = ApiResponse<AccountDetailResponse>),
        (status = 404, description = "Account not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account(
    State(state): State<AppState>,
    account_id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<AccountDetailResponse>>> {
    let Path(account_id) = account_id.map_err(|e| {
        debug!("Rejected account id: {}", e);
        ApiError::NotFound("Account not found".to_string())
    })?;

    let detail = accounts::find_detail(&state.db, account_id).await?;

    Ok(Json(ApiResponse::success(
        "Account retrieved successfully",
        detail.into(),
    )))
}
