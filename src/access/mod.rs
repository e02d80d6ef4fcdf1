//! Version-agnostic view over identity service token responses.
//!
//! [`AccessInfo`] is the contract; [`v2::AccessInfoV2`] and
//! [`v3::AccessInfoV3`] implement it against the two wire schemas and
//! [`factory::create`] picks between them.

use chrono::{DateTime, Duration, Utc};

use crate::catalog::ServiceCatalog;
use crate::error::Result;
use crate::helpers::time::{Clock, SystemClock};

pub mod factory;
pub mod raw;
pub mod v2;
pub mod v3;

pub use raw::RawToken;

/// Gap, in seconds, under which a token counts as about to expire.
pub const STALE_TOKEN_DURATION_SECONDS: i64 = 30;

pub fn default_stale_duration() -> Duration {
    Duration::seconds(STALE_TOKEN_DURATION_SECONDS)
}

/// Normalised access to an authentication token, whatever its schema version.
///
/// Queries that can only be absent return `Option`; queries whose absence
/// means the payload is malformed for its schema return `Result` and fail
/// with [`crate::AccessError::MalformedToken`]. String values borrow from the
/// wrapped [`RawToken`].
pub trait AccessInfo: std::fmt::Debug + Send + Sync {
    /// Schema version stamp, `"v2.0"` or `"v3"`.
    fn version(&self) -> &'static str;

    /// The decoded payload this view wraps.
    fn raw(&self) -> &RawToken;

    /// Endpoint catalog built when the token was constructed.
    fn service_catalog(&self) -> &ServiceCatalog;

    /// Whether the payload carries a catalog field at all, empty or not.
    fn has_service_catalog(&self) -> bool;

    /// Bearer token for authenticating API requests.
    fn auth_token(&self) -> Option<&str>;

    /// Override the bearer token; `None` clears a previous override.
    fn set_auth_token(&mut self, token: Option<String>);

    fn expires(&self) -> Result<DateTime<Utc>>;

    fn issued(&self) -> Result<DateTime<Utc>>;

    fn user_id(&self) -> Result<&str>;

    fn username(&self) -> Result<Option<&str>>;

    /// Domain id of the user. V2 tokens always report `"default"`.
    fn user_domain_id(&self) -> Result<Option<&str>>;

    /// Domain name of the user. V2 tokens always report `"Default"`.
    fn user_domain_name(&self) -> Result<Option<&str>>;

    fn role_ids(&self) -> Result<Vec<&str>>;

    fn role_names(&self) -> Result<Vec<&str>>;

    fn domain_id(&self) -> Result<Option<&str>>;

    fn domain_name(&self) -> Result<Option<&str>>;

    fn project_id(&self) -> Result<Option<&str>>;

    fn project_name(&self) -> Result<Option<&str>>;

    fn project_domain_id(&self) -> Result<Option<&str>>;

    fn project_domain_name(&self) -> Result<Option<&str>>;

    /// Scoped to a project with a populated service catalog.
    ///
    /// Deprecated in favour of [`AccessInfo::project_scoped`].
    fn scoped(&self) -> bool;

    fn project_scoped(&self) -> bool;

    fn domain_scoped(&self) -> bool;

    fn trust_id(&self) -> Option<&str>;

    /// Token was issued as a delegation through a trust.
    fn trust_scoped(&self) -> bool;

    fn trustee_user_id(&self) -> Option<&str>;

    fn trustor_user_id(&self) -> Option<&str>;

    fn oauth_access_token_id(&self) -> Option<&str>;

    fn oauth_consumer_id(&self) -> Option<&str>;

    /// Token was obtained through an external identity provider.
    fn is_federated(&self) -> bool;

    fn audit_id(&self) -> Option<&str>;

    /// Audit id of the token this one was rescoped from, if any.
    fn audit_chain_id(&self) -> Option<&str>;

    /// Synonym for [`AccessInfo::project_id`].
    fn tenant_id(&self) -> Result<Option<&str>> {
        self.project_id()
    }

    /// Synonym for [`AccessInfo::project_name`].
    fn tenant_name(&self) -> Result<Option<&str>> {
        self.project_name()
    }

    /// Audit id of the initially requested token.
    fn initial_audit_id(&self) -> Option<&str> {
        self.audit_chain_id().or_else(|| self.audit_id())
    }

    /// True when expiry falls within `stale_duration` (default 30s) from now.
    fn will_expire_soon(&self, stale_duration: Option<Duration>) -> Result<bool> {
        self.will_expire_soon_at(SystemClock.now(), stale_duration)
    }

    fn will_expire_soon_at(
        &self,
        now: DateTime<Utc>,
        stale_duration: Option<Duration>,
    ) -> Result<bool> {
        let stale_duration = stale_duration.unwrap_or_else(default_stale_duration);
        let expires = self.expires()?;
        // a window past the last representable instant covers every expiry
        Ok(now
            .checked_add_signed(stale_duration)
            .map_or(true, |soon| expires < soon))
    }
}

/// Parse a timestamp field that the schema requires.
pub(crate) fn required_time(raw: &RawToken, path: &[&str]) -> Result<DateTime<Utc>> {
    let value = raw.require_str(path)?;
    crate::helpers::time::parse_isotime(value).ok_or_else(|| {
        crate::error::AccessError::InvalidTimestamp {
            field: path.join("."),
            value: value.to_owned(),
        }
    })
}
