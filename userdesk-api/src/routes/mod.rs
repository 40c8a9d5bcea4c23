/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `admin_users`: Administrative user CRUD (ADMIN role required)
/// - `profile`: Self-service profile, email, and password endpoints
///
/// All user-facing JSON is camelCase; the [`UserResponse`] projection never
/// carries the password hash.

pub mod admin_users;
pub mod health;
pub mod profile;

use serde::Serialize;
use userdesk_shared::models::user::User;

/// Client-facing projection of a user record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Store-assigned identifier
    pub id: i32,

    /// Identity-provider subject identifier
    pub subject_id: String,

    /// Given name
    pub name: String,

    /// Family name
    pub last_name: String,

    /// Document-type code
    pub document_type: String,

    /// Document number
    pub document_number: String,

    /// Phone number
    pub cell_phone: String,

    /// Email address
    pub email: String,

    /// Role labels
    pub roles: Vec<String>,

    /// Public profile-image URL, empty when absent
    pub profile_image: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            subject_id: user.subject_id,
            name: user.name,
            last_name: user.last_name,
            document_type: user.document_type,
            document_number: user.document_number,
            cell_phone: user.cell_phone,
            email: user.email,
            roles: user.roles,
            profile_image: user.profile_image,
        }
    }
}
