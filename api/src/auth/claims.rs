use db::models::staff::StaffRole;
use serde::{Deserialize, Serialize};

/// Scope embedded in every token so a user credential can never be replayed
/// against staff endpoints (and vice versa).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    Staff,
    User,
}

/// Claims carried by a staff session token.
///
/// `sub` is the staff row id. Discord-authenticated staff additionally carry
/// their Discord id (needed for the live broker-role check) and avatar.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StaffClaims {
    pub sub: i64,
    pub username: String,
    pub name: String,
    pub role: StaffRole,
    pub discord_id: Option<String>,
    pub avatar: Option<String>,
    pub scope: TokenScope,
    pub exp: usize,
}

/// Claims carried by an end-user session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserClaims {
    pub sub: i64,
    pub discord_id: String,
    pub username: String,
    pub name: String,
    pub scope: TokenScope,
    pub exp: usize,
}

/// Authenticated staff member, extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthStaff(pub StaffClaims);

/// Authenticated end user, extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserClaims);
