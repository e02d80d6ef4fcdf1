use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::access::raw::{is_populated, RawToken, AUTH_TOKEN_KEY, VERSION_KEY};
use crate::access::{required_time, AccessInfo};
use crate::catalog::ServiceCatalog;
use crate::error::{AccessError, Result};

pub const V2_VERSION: &str = "v2.0";

/// V2 tokens have no domains; these stand in for the implicit default domain.
const DEFAULT_DOMAIN_ID: &str = "default";
const DEFAULT_DOMAIN_NAME: &str = "Default";

/// One place a legacy V2 token may keep its tenant.
///
/// A tier applies when every key of `anchor` exists, even if the value found
/// there is empty or `null`; the value is then read from `field` of the
/// anchor object, or the anchor itself when `field` is `None`.
struct TenantTier {
    label: &'static str,
    anchor: &'static [&'static str],
    field: Option<&'static str>,
}

impl TenantTier {
    /// `None` when the tier does not apply, `Some(value)` otherwise.
    fn resolve<'a>(&self, raw: &'a RawToken) -> Option<Option<&'a str>> {
        let anchor = raw.lookup(self.anchor)?;
        let value = match self.field {
            Some(field) => anchor.get(field),
            None => Some(anchor),
        };
        Some(value.and_then(Value::as_str))
    }
}

const PROJECT_NAME_TIERS: &[TenantTier] = &[
    TenantTier { label: "token.tenant", anchor: &["token", "tenant"], field: Some("name") },
    // pre grizzly
    TenantTier { label: "user.tenantName", anchor: &["user", "tenantName"], field: None },
];

const PROJECT_ID_TIERS: &[TenantTier] = &[
    TenantTier { label: "token.tenant", anchor: &["token", "tenant"], field: Some("id") },
    // pre grizzly
    TenantTier { label: "user.tenantId", anchor: &["user", "tenantId"], field: None },
    // pre diablo, only the id was provided
    TenantTier { label: "token.tenantId", anchor: &["token", "tenantId"], field: None },
];

fn resolve_tiers<'a>(raw: &'a RawToken, tiers: &[TenantTier]) -> Option<&'a str> {
    for tier in tiers {
        if let Some(value) = tier.resolve(raw) {
            debug!(tier = tier.label, "v2 tenant resolved");
            return value;
        }
    }
    None
}

/// Access info over a V2 (`access` envelope) token.
#[derive(Debug, Clone)]
pub struct AccessInfoV2 {
    raw: RawToken,
    service_catalog: ServiceCatalog,
}

impl AccessInfoV2 {
    /// Wrap the contents of the `access` envelope.
    ///
    /// Fails when `token.id` or the `user` object is missing.
    pub fn new(mut raw: RawToken) -> Result<Self> {
        raw.require_object(&["token"])?;
        raw.require_str(&["token", "id"])?;
        raw.require_object(&["user"])?;

        raw.insert(VERSION_KEY, Value::from(V2_VERSION));
        let service_catalog = ServiceCatalog::from_v2(&raw);
        Ok(Self { raw, service_catalog })
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Self::new(RawToken::from_value(value, "access")?)
    }

    fn trust_str(&self, field: &str) -> Option<&str> {
        self.raw.optional_str(&["trust", field])
    }
}

impl AccessInfo for AccessInfoV2 {
    fn version(&self) -> &'static str {
        V2_VERSION
    }

    fn raw(&self) -> &RawToken {
        &self.raw
    }

    fn service_catalog(&self) -> &ServiceCatalog {
        &self.service_catalog
    }

    fn has_service_catalog(&self) -> bool {
        self.raw.contains_key("serviceCatalog")
    }

    fn auth_token(&self) -> Option<&str> {
        self.raw
            .optional_str(&[AUTH_TOKEN_KEY])
            .or_else(|| self.raw.optional_str(&["token", "id"]))
    }

    fn set_auth_token(&mut self, token: Option<String>) {
        match token {
            Some(token) => self.raw.insert(AUTH_TOKEN_KEY, Value::from(token)),
            None => {
                self.raw.remove(AUTH_TOKEN_KEY);
            }
        }
    }

    fn expires(&self) -> Result<DateTime<Utc>> {
        required_time(&self.raw, &["token", "expires"])
    }

    fn issued(&self) -> Result<DateTime<Utc>> {
        required_time(&self.raw, &["token", "issued_at"])
    }

    fn user_id(&self) -> Result<&str> {
        self.raw.require_str(&["user", "id"])
    }

    fn username(&self) -> Result<Option<&str>> {
        let user = self.raw.require_object(&["user"])?;
        let name = match user.get("name") {
            Some(name) => name.as_str(),
            None => user.get("username").and_then(Value::as_str),
        };
        Ok(name)
    }

    fn user_domain_id(&self) -> Result<Option<&str>> {
        Ok(Some(DEFAULT_DOMAIN_ID))
    }

    fn user_domain_name(&self) -> Result<Option<&str>> {
        Ok(Some(DEFAULT_DOMAIN_NAME))
    }

    fn role_ids(&self) -> Result<Vec<&str>> {
        let Some(roles) = self.raw.lookup(&["metadata", "roles"]) else {
            return Ok(Vec::new());
        };
        let roles = roles
            .as_array()
            .ok_or_else(|| AccessError::malformed(&["metadata", "roles"]))?;
        roles
            .iter()
            .map(|role| {
                role.as_str()
                    .ok_or_else(|| AccessError::malformed(&["metadata", "roles"]))
            })
            .collect()
    }

    fn role_names(&self) -> Result<Vec<&str>> {
        let Some(roles) = self.raw.lookup(&["user", "roles"]) else {
            return Ok(Vec::new());
        };
        let roles = roles
            .as_array()
            .ok_or_else(|| AccessError::malformed(&["user", "roles"]))?;
        roles
            .iter()
            .map(|role| {
                role.get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| AccessError::malformed(&["user", "roles", "name"]))
            })
            .collect()
    }

    fn domain_id(&self) -> Result<Option<&str>> {
        Ok(None)
    }

    fn domain_name(&self) -> Result<Option<&str>> {
        Ok(None)
    }

    fn project_id(&self) -> Result<Option<&str>> {
        Ok(resolve_tiers(&self.raw, PROJECT_ID_TIERS))
    }

    fn project_name(&self) -> Result<Option<&str>> {
        Ok(resolve_tiers(&self.raw, PROJECT_NAME_TIERS))
    }

    fn project_domain_id(&self) -> Result<Option<&str>> {
        let scoped = self.project_id()?.is_some_and(|id| !id.is_empty());
        Ok(scoped.then_some(DEFAULT_DOMAIN_ID))
    }

    fn project_domain_name(&self) -> Result<Option<&str>> {
        let scoped = self.project_id()?.is_some_and(|id| !id.is_empty());
        Ok(scoped.then_some(DEFAULT_DOMAIN_NAME))
    }

    fn scoped(&self) -> bool {
        self.raw.get("serviceCatalog").is_some_and(is_populated) && self.project_scoped()
    }

    fn project_scoped(&self) -> bool {
        self.raw.has_path(&["token", "tenant"])
    }

    fn domain_scoped(&self) -> bool {
        false
    }

    fn trust_id(&self) -> Option<&str> {
        self.trust_str("id")
    }

    fn trust_scoped(&self) -> bool {
        self.raw.contains_key("trust")
    }

    fn trustee_user_id(&self) -> Option<&str> {
        self.trust_str("trustee_user_id")
    }

    fn trustor_user_id(&self) -> Option<&str> {
        // the trustor is not carried by v2 tokens
        None
    }

    fn oauth_access_token_id(&self) -> Option<&str> {
        None
    }

    fn oauth_consumer_id(&self) -> Option<&str> {
        None
    }

    fn is_federated(&self) -> bool {
        false
    }

    fn audit_id(&self) -> Option<&str> {
        self.raw.str_at_index(&["token", "audit_ids"], 0)
    }

    fn audit_chain_id(&self) -> Option<&str> {
        self.raw.str_at_index(&["token", "audit_ids"], 1)
    }
}
