/// Authentication and authorization utilities
///
/// This module provides the authentication primitives for UserDesk:
///
/// # Modules
///
/// - [`password`]: Argon2id hashing for the locally stored password copy
/// - [`jwt`]: Bearer-token validation against the identity provider's
///   JWK-set endpoint
/// - [`middleware`]: Request auth context and the admin role gate
///
/// The identity provider owns the canonical credential record and issues the
/// tokens; this service only validates them and mirrors the password as a
/// local Argon2id hash.

pub mod jwt;
pub mod middleware;
pub mod password;
