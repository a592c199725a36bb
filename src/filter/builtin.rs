//! Built-in filters.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{FilterContext, RequestFilter};
use crate::binding::encoding::encode_component;
use crate::request::BoundRequest;
use crate::{Error, ErrorContext, Result};

type HmacSha256 = Hmac<Sha256>;

/// `Authorization: Basic base64(identity:secret)`.
pub struct BasicAuthentication;

impl BasicAuthentication {
    pub const ID: &'static str = "basic_auth";

    pub fn header_value(identity: &str, secret: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", identity, secret)))
    }
}

impl RequestFilter for BasicAuthentication {
    fn filter(&self, mut request: BoundRequest, cx: &FilterContext) -> Result<BoundRequest> {
        let creds = cx.credentials(Self::ID)?;
        request.headers.set(
            "Authorization",
            Self::header_value(creds.identity(), creds.secret()),
        );
        Ok(request)
    }
}

/// `X-Auth-Token` from the session token.
pub struct AuthTokenHeader;

impl AuthTokenHeader {
    pub const ID: &'static str = "auth_token";
    pub const HEADER: &'static str = "X-Auth-Token";
}

impl RequestFilter for AuthTokenHeader {
    fn filter(&self, mut request: BoundRequest, cx: &FilterContext) -> Result<BoundRequest> {
        let token = cx.credentials(Self::ID)?.token().ok_or_else(|| {
            Error::filter(
                "credentials carry no session token",
                ErrorContext::new().with_source(Self::ID),
            )
        })?;
        request.headers.set(Self::HEADER, token);
        Ok(request)
    }
}

/// Query-string signing: adds `apiKey` and an HMAC-SHA256 `signature` over
/// the sorted, lower-cased `key=value` pairs.
///
/// Earlier `apiKey`/`signature` values are removed first, so re-signing a
/// signed request replaces them.
pub struct QuerySigner;

impl QuerySigner {
    pub const ID: &'static str = "query_signer";
    pub const API_KEY: &'static str = "apiKey";
    pub const SIGNATURE: &'static str = "signature";

    /// Canonical string the signature covers.
    pub fn string_to_sign(request: &BoundRequest) -> String {
        let mut pairs: Vec<String> = request
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode_component(v, &[])).to_lowercase())
            .collect();
        pairs.sort();
        pairs.join("&")
    }

    pub fn sign(secret: &str, string_to_sign: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
            Error::filter(
                format!("invalid signing key: {}", e),
                ErrorContext::new().with_source(Self::ID),
            )
        })?;
        mac.update(string_to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl RequestFilter for QuerySigner {
    fn filter(&self, mut request: BoundRequest, cx: &FilterContext) -> Result<BoundRequest> {
        let creds = cx.credentials(Self::ID)?;
        request.query.remove(Self::SIGNATURE);
        request.query.set(Self::API_KEY, creds.identity());
        let signature = Self::sign(creds.secret(), &Self::string_to_sign(&request))?;
        request.query.append(Self::SIGNATURE, signature);
        Ok(request)
    }
}

/// `Date` in IMF-fixdate form from the context clock.
pub struct DateHeader;

impl DateHeader {
    pub const ID: &'static str = "date_header";
}

impl RequestFilter for DateHeader {
    fn filter(&self, mut request: BoundRequest, cx: &FilterContext) -> Result<BoundRequest> {
        request.headers.set(
            "Date",
            cx.now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        );
        Ok(request)
    }
}
