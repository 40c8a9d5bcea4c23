/// Orchestration services
///
/// This module contains the use-case layer that sequences the external
/// collaborators (identity provider, object storage, relational store) per
/// request:
///
/// - `users`: User-account lifecycle orchestration

pub mod users;
