//! Query-string signing for the management API.
//!
//! The signature is computed over the sorted, url-encoded and lowercased
//! parameter string, HMAC-SHA1 with the caller's secret key, base64 encoded.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::form_urlencoded;

use crate::error::ApiError;

type HmacSha1 = Hmac<Sha1>;

/// Url-encode one value the way the API expects (`%20` for spaces).
pub fn encode_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Canonical query string: pairs sorted by lowercase key, values encoded.
pub fn canonical_query(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| {
        a.0.to_lowercase()
            .cmp(&b.0.to_lowercase())
            .then_with(|| a.1.cmp(&b.1))
    });

    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, encode_value(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign a canonical query string with `secret_key`.
pub fn signature(canonical: &str, secret_key: &str) -> Result<String, ApiError> {
    let mut mac = HmacSha1::new_from_slice(secret_key.as_bytes())
        .map_err(|e| ApiError::Signing(e.to_string()))?;
    mac.update(canonical.to_lowercase().as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Build the full signed query string, `signature` last.
pub fn signed_query(params: &[(String, String)], secret_key: &str) -> Result<String, ApiError> {
    let canonical = canonical_query(params);
    let signature = signature(&canonical, secret_key)?;
    Ok(format!("{canonical}&signature={}", encode_value(&signature)))
}
