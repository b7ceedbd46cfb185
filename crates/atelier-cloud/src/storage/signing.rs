//! Cloud Storage V4 signed URLs using an HMAC key (`GOOG4-HMAC-SHA256`).
//!
//! The canonical request is
//!
//! ```text
//! <METHOD>\n<path>\n<query>\n<name:value\n ...>\n<signed headers>\nUNSIGNED-PAYLOAD
//! ```
//!
//! and the signing key is derived from the secret through the chain
//! `GOOG4<secret>` -> date -> `auto` -> `storage` -> `goog4_request`.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::HmacKey;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "GOOG4-HMAC-SHA256";
const REGION: &str = "auto";
const SERVICE: &str = "storage";
const REQUEST_TYPE: &str = "goog4_request";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Longest expiry Cloud Storage accepts for a V4 signature.
pub const MAX_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("expiry must be between 1 second and 7 days, got {0:?}")]
    InvalidExpiry(Duration),

    #[error("invalid storage endpoint {0:?}")]
    InvalidEndpoint(String),
}

/// What to sign.
#[derive(Debug, Clone)]
pub struct SignRequest<'a> {
    pub method: &'a str,
    pub bucket: &'a str,
    pub object: &'a str,
    pub expires_in: Duration,
    /// Extra headers the client must send verbatim (`host` is always added).
    pub headers: &'a [(&'a str, &'a str)],
}

/// Produces V4 signed URLs for one endpoint and HMAC key.
#[derive(Debug, Clone)]
pub struct V4Signer {
    key: HmacKey,
    scheme: String,
    /// Host header value, including the port when it is not the default.
    host: String,
}

impl V4Signer {
    pub fn new(key: HmacKey, endpoint: &str) -> Result<Self, SigningError> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|_| SigningError::InvalidEndpoint(endpoint.to_owned()))?;
        let host = url
            .host_str()
            .ok_or_else(|| SigningError::InvalidEndpoint(endpoint.to_owned()))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };
        Ok(Self {
            key,
            scheme: url.scheme().to_owned(),
            host,
        })
    }

    /// Sign `request` as if issued at `now`.
    pub fn sign(
        &self,
        request: &SignRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<String, SigningError> {
        if request.expires_in.is_zero() || request.expires_in > MAX_EXPIRY {
            return Err(SigningError::InvalidExpiry(request.expires_in));
        }

        let datetime = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{REGION}/{SERVICE}/{REQUEST_TYPE}");

        let mut headers: BTreeMap<String, String> = request
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_owned()))
            .collect();
        headers.insert("host".to_owned(), self.host.clone());
        let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();

        let mut query = BTreeMap::new();
        query.insert("X-Goog-Algorithm", ALGORITHM.to_owned());
        query.insert("X-Goog-Credential", format!("{}/{scope}", self.key.access_id));
        query.insert("X-Goog-Date", datetime.clone());
        query.insert("X-Goog-Expires", request.expires_in.as_secs().to_string());
        query.insert("X-Goog-SignedHeaders", signed_headers.clone());
        let canonical_query = query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let path = format!("/{}/{}", request.bucket, encode_object_path(request.object));
        let canonical_request = format!(
            "{method}\n{path}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{UNSIGNED_PAYLOAD}",
            method = request.method,
        );

        let string_to_sign = format!(
            "{ALGORITHM}\n{datetime}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );
        let signature = hex::encode(self.signature(&date, &string_to_sign));

        Ok(format!(
            "{}://{}{path}?{canonical_query}&X-Goog-Signature={signature}",
            self.scheme, self.host
        ))
    }

    fn signature(&self, date: &str, string_to_sign: &str) -> Vec<u8> {
        let secret = format!("GOOG4{}", self.key.secret);
        let key = hmac(secret.as_bytes(), date.as_bytes());
        let key = hmac(&key, REGION.as_bytes());
        let key = hmac(&key, SERVICE.as_bytes());
        let key = hmac(&key, REQUEST_TYPE.as_bytes());
        hmac(&key, string_to_sign.as_bytes())
    }
}

fn hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Percent-encode each `/`-separated segment of an object name.
fn encode_object_path(object: &str) -> String {
    object
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}
