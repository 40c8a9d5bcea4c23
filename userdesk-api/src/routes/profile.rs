/// Self-service profile endpoints
///
/// Every handler resolves the caller's record through the bearer token's
/// subject identifier, never through a client-supplied id. Email, password,
/// and roles cannot be changed through the profile update; email and
/// password have their own dedicated endpoints that write to the identity
/// provider first.
///
/// # Endpoints
///
/// - `GET /v1/users/me`       - own profile
/// - `PUT /v1/users/me`       - profile update (typed partial payload)
/// - `PUT /v1/users/password` - change own password
/// - `PUT /v1/users/email`    - change own email

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use validator::Validate;

use crate::{
    app::AppState,
    error::ApiResult,
    routes::UserResponse,
    services::users::ProfileUpdate,
};
use userdesk_shared::auth::middleware::AuthContext;

/// Profile update request
///
/// Name, last name, and document number are mandatory; the remaining fields
/// keep their current value when absent. The profile image is a URL passed
/// through as-is, there is no re-upload on this path.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    /// Given name
    #[validate(required(message = "Name is required"))]
    pub name: Option<String>,

    /// Family name
    #[validate(required(message = "Last name is required"))]
    pub last_name: Option<String>,

    /// Document-type code
    pub document_type: Option<String>,

    /// Document number
    #[validate(required(message = "Document number is required"))]
    pub document_number: Option<String>,

    /// Phone number
    pub cell_phone: Option<String>,

    /// Profile-image URL
    pub profile_image: Option<String>,
}

/// Change password request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// New plaintext password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Change email request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailRequest {
    /// New email address
    #[validate(email(message = "Invalid email format"))]
    pub new_email: String,
}

/// Returns the caller's own profile
pub async fn my_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.users.my_profile(&auth.subject).await?;
    Ok(Json(user.into()))
}

/// Updates the caller's own profile
///
/// Validation runs before any persistence call: a payload missing `name`,
/// `lastName`, or `documentNumber` is rejected with a structured 422.
pub async fn update_my_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<ProfileUpdateRequest>,
) -> ApiResult<Json<UserResponse>> {
    request.validate()?;

    let input = ProfileUpdate {
        name: request.name.unwrap_or_default(),
        last_name: request.last_name.unwrap_or_default(),
        document_number: request.document_number.unwrap_or_default(),
        document_type: request.document_type,
        cell_phone: request.cell_phone,
        profile_image: request.profile_image,
    };

    let user = state.users.update_my_profile(&auth.subject, input).await?;
    Ok(Json(user.into()))
}

/// Changes the caller's password on the provider, then locally
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<UserResponse>> {
    request.validate()?;

    let user = state
        .users
        .change_password(&auth.subject, &request.new_password)
        .await?;
    Ok(Json(user.into()))
}

/// Changes the caller's email on the provider, then locally
pub async fn change_email(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<ChangeEmailRequest>,
) -> ApiResult<Json<UserResponse>> {
    request.validate()?;

    let user = state
        .users
        .change_email(&auth.subject, &request.new_email)
        .await?;
    Ok(Json(user.into()))
}
