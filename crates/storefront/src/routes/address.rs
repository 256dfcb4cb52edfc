//! Address book route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use kiosk_core::AddressId;

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressFields};
use crate::services::{AddressManager, ValidationError, addresses};
use crate::state::AppState;

/// Body of `POST /address` and `PUT /address`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBody {
    /// Target of an update; ignored on create.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub fields: AddressFields,
    #[serde(default, deserialize_with = "flag")]
    pub is_default: Option<bool>,
}

/// Accept `true`/`false` as well as `1`/`0`.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(value)) => Ok(Some(value)),
        Some(Flag::Int(0)) => Ok(Some(false)),
        Some(Flag::Int(1)) => Ok(Some(true)),
        Some(Flag::Int(other)) => Err(D::Error::custom(format!(
            "isDefault must be a boolean, 0 or 1, got {other}"
        ))),
    }
}

#[derive(Debug, Serialize)]
pub struct AddressList {
    addresses: Vec<Address>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCreated {
    address_id: AddressId,
}

#[derive(Debug, Serialize)]
pub struct AddressUpdated {
    /// Number of updated rows; 0 if the address is not the caller's.
    success: u64,
}

/// List the caller's addresses.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<AddressList>> {
    let mut conn = state.pool().acquire().await?;
    let addresses = AddressManager::new(&mut *conn).list(user.id).await?;

    Ok(Json(AddressList { addresses }))
}

/// Create an address for the caller.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddressBody>,
) -> Result<(StatusCode, Json<AddressCreated>)> {
    let address = addresses::validate_new_address(body.fields)?;
    let requested_default = body.is_default.unwrap_or(false);

    let mut conn = state.pool().acquire().await?;
    let address_id = AddressManager::new(&mut *conn)
        .create(user.id, &address, requested_default)
        .await?;

    Ok((StatusCode::CREATED, Json(AddressCreated { address_id })))
}

/// Update one of the caller's addresses.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddressBody>,
) -> Result<Json<AddressUpdated>> {
    let address_id = body
        .id
        .and_then(|id| i32::try_from(id).ok())
        .map(AddressId::new)
        .filter(AddressId::is_valid)
        .ok_or(ValidationError::InvalidField("id"))?;
    let patch = addresses::build_patch(body.fields, body.is_default)?;

    let mut conn = state.pool().acquire().await?;
    let success = AddressManager::new(&mut *conn)
        .update(user.id, address_id, &patch)
        .await?;

    Ok(Json(AddressUpdated { success }))
}
