//! HTTP Basic credential check (RFC 7617) for the control API.

use axum::http::{header, HeaderMap};
use base64::Engine;

use crate::domain::{AppError, CertConfig};

pub const REALM: &str = "cert-agent";

/// Decodes `Basic <base64(user:pass)>`. The scheme match is case-insensitive.
pub fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// No header is 401 with a challenge; anything present but wrong is 403.
pub fn authorize(headers: &HeaderMap, config: &CertConfig) -> Result<(), AppError> {
    let Some(raw) = headers.get(header::AUTHORIZATION) else {
        return Err(AppError::unauthorized(REALM, "authentication required"));
    };

    let credentials = raw.to_str().ok().and_then(parse_basic);
    match credentials {
        Some((user, pass)) if config.credentials_match(&user, &pass) => Ok(()),
        Some((user, _)) => {
            tracing::warn!(user = %user, "control api credential mismatch");
            Err(AppError::forbidden("invalid credentials"))
        }
        None => {
            tracing::warn!("control api received a malformed authorization header");
            Err(AppError::forbidden("invalid credentials"))
        }
    }
}
