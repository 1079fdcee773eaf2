//! Discord interactions webhook.
//!
//! Discord signs every delivery with the application's ed25519 key over
//! `timestamp || body`. The signature is checked against the raw body before
//! anything is parsed; unsigned or badly signed requests never reach the
//! command logic.

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::services::discord::command_panel_embed;
use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use ed25519_dalek::{Signature, VerifyingKey};
use serde_json::{Value, json};
use util::config;

/// The slash command answered with the ticket-system panel.
const PANEL_COMMAND: &str = "ticket-system";

// Discord interaction wire constants.
const INTERACTION_PING: u64 = 1;
const INTERACTION_APPLICATION_COMMAND: u64 = 2;
const RESPONSE_PONG: u64 = 1;
const RESPONSE_CHANNEL_MESSAGE: u64 = 4;

/// Verifies a Discord request signature over `timestamp || body`.
///
/// `public_key` and `signature` are hex as delivered by Discord. Anything
/// malformed fails verification; there is no error channel.
pub fn verify_signature(public_key: &str, signature: &str, timestamp: &str, body: &str) -> bool {
    let Ok(key_bytes) = hex::decode(public_key) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature) else {
        return false;
    };
    if key_bytes.len() != 32 || sig_bytes.len() != 64 {
        return false;
    }

    let Ok(key_bytes) = key_bytes.try_into() else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; 64]>::try_from(sig_bytes) else {
        return false;
    };

    let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);

    let mut message = timestamp.as_bytes().to_vec();
    message.extend_from_slice(body.as_bytes());
    key.verify_strict(&message, &signature).is_ok()
}

pub fn interaction_routes() -> Router<util::state::AppState> {
    Router::new().route("/interactions", post(handle_interaction))
}

/// POST /discord/interactions
///
/// Liveness probe (PING) and the informational slash command. Everything
/// else is a 400, and any request failing signature verification is a 401
/// before the payload is even parsed.
async fn handle_interaction(headers: HeaderMap, body: String) -> impl IntoResponse {
    let signature = headers
        .get("x-signature-ed25519")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let timestamp = headers
        .get("x-signature-timestamp")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(&config::discord_public_key(), signature, timestamp, &body) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<Empty>::error("Invalid request signature")),
        )
            .into_response();
    }

    let payload: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<Empty>::error("Malformed interaction payload")),
            )
                .into_response();
        }
    };

    match payload.get("type").and_then(Value::as_u64) {
        Some(INTERACTION_PING) => Json(json!({ "type": RESPONSE_PONG })).into_response(),
        Some(INTERACTION_APPLICATION_COMMAND) => {
            let command = payload
                .pointer("/data/name")
                .and_then(Value::as_str)
                .unwrap_or_default();

            if command == PANEL_COMMAND {
                Json(json!({
                    "type": RESPONSE_CHANNEL_MESSAGE,
                    "data": { "embeds": [command_panel_embed()] },
                }))
                .into_response()
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<Empty>::error("Unknown command")),
                )
                    .into_response()
            }
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("Unsupported interaction type")),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::verify_signature;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    fn keypair() -> (SigningKey, String) {
        let signing = SigningKey::generate(&mut OsRng);
        let public_hex = hex::encode(signing.verifying_key().to_bytes());
        (signing, public_hex)
    }

    #[test]
    fn accepts_a_valid_signature() {
        let (signing, public_hex) = keypair();
        let timestamp = "1700000000";
        let body = r#"{"type":1}"#;

        let message = format!("{timestamp}{body}");
        let signature = hex::encode(signing.sign(message.as_bytes()).to_bytes());

        assert!(verify_signature(&public_hex, &signature, timestamp, body));
    }

    #[test]
    fn rejects_a_tampered_body() {
        let (signing, public_hex) = keypair();
        let timestamp = "1700000000";
        let message = format!("{timestamp}{}", r#"{"type":1}"#);
        let signature = hex::encode(signing.sign(message.as_bytes()).to_bytes());

        assert!(!verify_signature(
            &public_hex,
            &signature,
            timestamp,
            r#"{"type":2}"#
        ));
    }

    #[test]
    fn rejects_a_shifted_timestamp() {
        let (signing, public_hex) = keypair();
        let body = r#"{"type":1}"#;
        let message = format!("1700000000{body}");
        let signature = hex::encode(signing.sign(message.as_bytes()).to_bytes());

        assert!(!verify_signature(&public_hex, &signature, "1700000001", body));
    }

    #[test]
    fn rejects_malformed_keys_and_signatures() {
        let (signing, public_hex) = keypair();
        let body = r#"{"type":1}"#;
        let message = format!("1700000000{body}");
        let signature = hex::encode(signing.sign(message.as_bytes()).to_bytes());

        assert!(!verify_signature("zz-not-hex", &signature, "1700000000", body));
        assert!(!verify_signature("abcd", &signature, "1700000000", body));
        assert!(!verify_signature(&public_hex, "deadbeef", "1700000000", body));
        assert!(!verify_signature(&public_hex, "", "1700000000", body));
    }
}
