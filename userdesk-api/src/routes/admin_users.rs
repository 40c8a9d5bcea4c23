/// Administrative user endpoints
///
/// Admin-only CRUD over the users collection. Create and update take a
/// multipart payload: a JSON-encoded `user` part plus an optional `file`
/// part with the profile image.
///
/// # Endpoints
///
/// - `GET    /v1/admin/users`                     - list all users
/// - `GET    /v1/admin/users/:id`                 - user by id
/// - `GET    /v1/admin/users/email/:email`        - user by email
/// - `GET    /v1/admin/users/email-exists/:email` - email registered?
/// - `POST   /v1/admin/users`                     - create (multipart)
/// - `PUT    /v1/admin/users/:id`                 - update (multipart)
/// - `DELETE /v1/admin/users/:id`                 - delete
///
/// All routes sit behind the bearer middleware plus the ADMIN role gate.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::UserResponse,
    services::users::{NewUser, UserUpdate},
};
use userdesk_shared::storage::ImageUpload;

/// Create user request (the `user` multipart part)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Given name
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    /// Family name
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    /// Document-type code
    #[serde(default)]
    pub document_type: String,

    /// Document number
    #[validate(length(min = 1, message = "Document number is required"))]
    pub document_number: String,

    /// Phone number
    #[serde(default)]
    pub cell_phone: String,

    /// Email address; must not already be registered
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Role labels; first entry becomes the provider role claim
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Update user request (the `user` multipart part)
///
/// Full overwrite: every field is applied unconditionally, so callers supply
/// all fields even when unchanged. Email and password have their own paths.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    /// Given name
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    /// Family name
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    /// Document-type code
    #[serde(default)]
    pub document_type: String,

    /// Document number
    #[validate(length(min = 1, message = "Document number is required"))]
    pub document_number: String,

    /// Phone number
    #[serde(default)]
    pub cell_phone: String,

    /// Role labels
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Extracts the JSON `user` part and the optional `file` part
///
/// Missing or malformed JSON maps to 400; the file part keeps its original
/// filename and content type for the object-store upload.
async fn parse_user_multipart<T: DeserializeOwned>(
    multipart: &mut Multipart,
) -> Result<(T, Option<ImageUpload>), ApiError> {
    let mut payload: Option<T> = None;
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("user") => {
                let text = field.text().await?;
                payload = Some(serde_json::from_str(&text).map_err(|e| {
                    ApiError::BadRequest(format!("Invalid user payload: {}", e))
                })?);
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload")
                    .to_owned();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field.bytes().await?;
                image = Some(ImageUpload {
                    bytes,
                    filename,
                    content_type,
                });
            }
            _ => {}
        }
    }

    let payload = payload.ok_or_else(|| {
        ApiError::BadRequest("Missing 'user' part in multipart payload".to_string())
    })?;

    Ok((payload, image))
}

/// Lists all users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state.users.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Gets a user by id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?;

    Ok(Json(user.into()))
}

/// Gets a user by email
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User '{}' not found", email)))?;

    Ok(Json(user.into()))
}

/// Checks whether an email is already registered
pub async fn email_exists(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<bool>> {
    Ok(Json(state.users.email_exists(&email).await?))
}

/// Creates a user account with an optional profile image
///
/// # Errors
///
/// - `400 Bad Request`: malformed multipart or JSON part
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: validation failed
pub async fn create_user(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let (request, image) = parse_user_multipart::<CreateUserRequest>(&mut multipart).await?;
    request.validate()?;

    let input = NewUser {
        name: request.name,
        last_name: request.last_name,
        document_type: request.document_type,
        document_number: request.document_number,
        cell_phone: request.cell_phone,
        email: request.email,
        password: request.password,
        roles: request.roles,
    };

    let user = state.users.create_user(input, image).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Updates a user, replacing the stored image when a new file is supplied
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> ApiResult<Json<UserResponse>> {
    let (request, image) = parse_user_multipart::<UpdateUserRequest>(&mut multipart).await?;
    request.validate()?;

    let input = UserUpdate {
        name: request.name,
        last_name: request.last_name,
        document_type: request.document_type,
        document_number: request.document_number,
        cell_phone: request.cell_phone,
        roles: request.roles,
    };

    let user = state.users.update_user(id, input, image).await?;
    Ok(Json(user.into()))
}

/// Deletes a user: provider account first, local record second
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
