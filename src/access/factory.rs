use http::{HeaderMap, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::access::raw::RawToken;
use crate::access::v2::AccessInfoV2;
use crate::access::v3::AccessInfoV3;
use crate::access::AccessInfo;
use crate::error::{AccessError, Result};

/// Header carrying the bearer token of a V3 response.
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

static V3_ENVELOPE: &str = "token";
static V2_ENVELOPE: &str = "access";

/// Identity service response as handed over by the transport.
pub trait AuthResponse {
    fn headers(&self) -> &HeaderMap;

    /// Decode the response body.
    fn json(&self) -> Result<Value>;
}

impl<B: AsRef<[u8]>> AuthResponse for Response<B> {
    fn headers(&self) -> &HeaderMap {
        Response::headers(self)
    }

    fn json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(self.body().as_ref())?)
    }
}

/// Build access info from a decoded response body.
///
/// A top-level `token` selects V3 with `auth_token` as the bearer value; a
/// top-level `access` selects V2. Anything else is
/// [`AccessError::UnrecognizedFormat`].
pub fn create(body: Value, auth_token: Option<String>) -> Result<Box<dyn AccessInfo>> {
    let Value::Object(mut body) = body else {
        warn!("auth response body is not an object");
        return Err(AccessError::UnrecognizedFormat);
    };

    if let Some(token) = body.shift_remove(V3_ENVELOPE) {
        debug!(has_auth_token = auth_token.is_some(), "v3 auth response");
        let raw = RawToken::from_value(token, V3_ENVELOPE)?;
        return Ok(Box::new(AccessInfoV3::new(auth_token, raw)?));
    }

    if let Some(access) = body.shift_remove(V2_ENVELOPE) {
        debug!("v2 auth response");
        let raw = RawToken::from_value(access, V2_ENVELOPE)?;
        return Ok(Box::new(AccessInfoV2::new(raw)?));
    }

    warn!(keys = ?body.keys().collect::<Vec<_>>(), "unrecognized auth response");
    Err(AccessError::UnrecognizedFormat)
}

/// Build access info from a transport response.
///
/// Without an explicit `auth_token`, V3 bodies take the bearer value from the
/// `X-Subject-Token` header.
pub fn from_response<R: AuthResponse>(
    resp: &R,
    auth_token: Option<String>,
) -> Result<Box<dyn AccessInfo>> {
    let body = resp.json()?;

    let is_v3 = body.get(V3_ENVELOPE).is_some();
    let auth_token = match auth_token {
        Some(token) => Some(token),
        None if is_v3 => get_header_value(resp.headers(), SUBJECT_TOKEN_HEADER),
        None => None,
    };

    create(body, auth_token)
}

fn get_header_value(headers: &HeaderMap, key: &str) -> Option<String> {
    let value = headers.get(key)?;
    match value.to_str() {
        Ok(value) => Some(value.to_owned()),
        Err(e) => {
            warn!(header = key, error = %e, "ignoring non-ascii header value");
            None
        }
    }
}
