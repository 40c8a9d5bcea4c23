/// Database models for UserDesk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User account records joined to the external identity provider

pub mod user;
