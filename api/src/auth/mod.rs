pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthStaff, AuthUser, StaffClaims, TokenScope, UserClaims};

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use util::config;

/// Generates a session JWT for a staff member and its expiry timestamp.
pub fn generate_staff_jwt(staff: &db::models::staff::Model) -> (String, String) {
    let expiry = Utc::now() + Duration::minutes(config::jwt_duration_minutes() as i64);

    let claims = StaffClaims {
        sub: staff.id,
        username: staff.username.clone(),
        name: staff.display_name.clone(),
        role: staff.role,
        discord_id: staff.discord_id.clone(),
        avatar: staff.avatar.clone(),
        scope: TokenScope::Staff,
        exp: expiry.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )
    .expect("Token encoding failed");

    (token, expiry.to_rfc3339())
}

/// Generates a session JWT for an end user and its expiry timestamp.
pub fn generate_user_jwt(user: &db::models::user::Model) -> (String, String) {
    let expiry = Utc::now() + Duration::minutes(config::jwt_duration_minutes() as i64);

    let claims = UserClaims {
        sub: user.id,
        discord_id: user.discord_id.clone(),
        username: user.username.clone(),
        name: user.display_name.clone(),
        scope: TokenScope::User,
        exp: expiry.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )
    .expect("Token encoding failed");

    (token, expiry.to_rfc3339())
}

/// Verifies a staff token. Returns `None` for invalid, expired, or
/// wrong-scope tokens alike.
pub fn verify_staff_token(token: &str) -> Option<StaffClaims> {
    let data = decode::<StaffClaims>(
        token,
        &DecodingKey::from_secret(config::jwt_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .ok()?;

    (data.claims.scope == TokenScope::Staff).then_some(data.claims)
}

/// Verifies an end-user token. Returns `None` for invalid, expired, or
/// wrong-scope tokens alike.
pub fn verify_user_token(token: &str) -> Option<UserClaims> {
    let data = decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(config::jwt_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .ok()?;

    (data.claims.scope == TokenScope::User).then_some(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use db::models::staff::StaffRole;
    use serial_test::serial;

    fn init_test_config() {
        unsafe {
            std::env::set_var("DATABASE_PATH", ":memory:");
            std::env::set_var("JWT_SECRET", "test-secret");
        }
        util::config::AppConfig::reset();
    }

    fn sample_staff() -> db::models::staff::Model {
        let now = Utc::now();
        db::models::staff::Model {
            id: 7,
            username: "alice".into(),
            display_name: "Alice".into(),
            role: StaffRole::Moderator,
            active: true,
            avatar: None,
            password_hash: None,
            discord_id: Some("42".into()),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_user() -> db::models::user::Model {
        let now = Utc::now();
        db::models::user::Model {
            id: 3,
            discord_id: "99".into(),
            username: "bob".into(),
            display_name: "Bob".into(),
            avatar: None,
            email: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    #[serial]
    fn staff_token_round_trip() {
        init_test_config();
        let (token, _expiry) = generate_staff_jwt(&sample_staff());

        let claims = verify_staff_token(&token).expect("token should verify");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, StaffRole::Moderator);
        assert_eq!(claims.discord_id.as_deref(), Some("42"));
    }

    #[test]
    #[serial]
    fn user_token_round_trip() {
        init_test_config();
        let (token, _expiry) = generate_user_jwt(&sample_user());

        let claims = verify_user_token(&token).expect("token should verify");
        assert_eq!(claims.sub, 3);
        assert_eq!(claims.discord_id, "99");
    }

    #[test]
    #[serial]
    fn scopes_do_not_cross() {
        init_test_config();
        let (staff_token, _) = generate_staff_jwt(&sample_staff());
        let (user_token, _) = generate_user_jwt(&sample_user());

        assert!(verify_user_token(&staff_token).is_none());
        assert!(verify_staff_token(&user_token).is_none());
    }

    #[test]
    #[serial]
    fn tampered_tokens_are_rejected() {
        init_test_config();
        let (token, _) = generate_staff_jwt(&sample_staff());
        let mut tampered = token.clone();
        let flipped = if tampered.pop() == Some('A') { 'B' } else { 'A' };
        tampered.push(flipped);

        assert!(verify_staff_token(&tampered).is_none());
        assert!(verify_staff_token("not-a-token").is_none());
    }
}
