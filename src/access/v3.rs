use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::access::raw::{is_populated, nested_str, RawToken, AUTH_TOKEN_KEY, VERSION_KEY};
use crate::access::{required_time, AccessInfo};
use crate::catalog::ServiceCatalog;
use crate::error::{AccessError, Result};

pub const V3_VERSION: &str = "v3";

const TRUST_KEY: &str = "OS-TRUST:trust";
const OAUTH_KEY: &str = "OS-OAUTH1";
const FEDERATION_KEY: &str = "OS-FEDERATION";

/// Access info over a V3 (`token` envelope) token.
///
/// V3 responses carry the bearer token outside the body, so it is handed in
/// at construction.
#[derive(Debug, Clone)]
pub struct AccessInfoV3 {
    raw: RawToken,
    service_catalog: ServiceCatalog,
}

impl AccessInfoV3 {
    /// Wrap the contents of the `token` envelope. Fails when `user` is missing.
    pub fn new(auth_token: Option<String>, mut raw: RawToken) -> Result<Self> {
        raw.require_object(&["user"])?;

        raw.insert(VERSION_KEY, Value::from(V3_VERSION));
        let service_catalog = ServiceCatalog::from_v3(&raw);
        let mut info = Self { raw, service_catalog };
        if let Some(token) = auth_token {
            info.set_auth_token(Some(token));
        }
        Ok(info)
    }

    pub fn from_value(auth_token: Option<String>, value: Value) -> Result<Self> {
        Self::new(auth_token, RawToken::from_value(value, "token")?)
    }

    /// Top-level object when present and non-empty.
    fn populated(&self, key: &str) -> Option<&Value> {
        self.raw.get(key).filter(|value| is_populated(value))
    }

    /// `field` of the populated top-level object `key`, required once it exists.
    fn scoped_str(&self, key: &'static str, field: &str) -> Result<Option<&str>> {
        match self.populated(key) {
            Some(object) => nested_str(object, field, &[key]),
            None => Ok(None),
        }
    }

    fn project_domain_str(&self, field: &str) -> Result<Option<&str>> {
        let Some(project) = self.populated("project") else {
            return Ok(None);
        };
        let domain = project
            .get("domain")
            .ok_or_else(|| AccessError::malformed(&["project", "domain"]))?;
        nested_str(domain, field, &["project", "domain"])
    }

    fn user_domain_str(&self, field: &str) -> Result<Option<&str>> {
        match self.raw.lookup(&["user", "domain", field]) {
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| AccessError::malformed(&["user", "domain", field])),
            None if self.is_federated() => {
                debug!(field, "federated user carries no domain");
                Ok(None)
            }
            None => Err(AccessError::malformed(&["user", "domain", field])),
        }
    }

    fn role_field(&self, field: &str) -> Result<Vec<&str>> {
        let Some(roles) = self.raw.get("roles") else {
            return Ok(Vec::new());
        };
        let roles = roles
            .as_array()
            .ok_or_else(|| AccessError::malformed(&["roles"]))?;
        roles
            .iter()
            .map(|role| {
                role.get(field)
                    .and_then(Value::as_str)
                    .ok_or_else(|| AccessError::malformed(&["roles", field]))
            })
            .collect()
    }
}

impl AccessInfo for AccessInfoV3 {
    fn version(&self) -> &'static str {
        V3_VERSION
    }

    fn raw(&self) -> &RawToken {
        &self.raw
    }

    fn service_catalog(&self) -> &ServiceCatalog {
        &self.service_catalog
    }

    fn has_service_catalog(&self) -> bool {
        self.raw.contains_key("catalog")
    }

    fn auth_token(&self) -> Option<&str> {
        self.raw.optional_str(&[AUTH_TOKEN_KEY])
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
        required_time(&self.raw, &["expires_at"])
    }

    fn issued(&self) -> Result<DateTime<Utc>> {
        required_time(&self.raw, &["issued_at"])
    }

    fn user_id(&self) -> Result<&str> {
        self.raw.require_str(&["user", "id"])
    }

    fn username(&self) -> Result<Option<&str>> {
        self.raw.require_str(&["user", "name"]).map(Some)
    }

    fn user_domain_id(&self) -> Result<Option<&str>> {
        self.user_domain_str("id")
    }

    fn user_domain_name(&self) -> Result<Option<&str>> {
        self.user_domain_str("name")
    }

    fn role_ids(&self) -> Result<Vec<&str>> {
        self.role_field("id")
    }

    fn role_names(&self) -> Result<Vec<&str>> {
        self.role_field("name")
    }

    fn domain_id(&self) -> Result<Option<&str>> {
        self.scoped_str("domain", "id")
    }

    fn domain_name(&self) -> Result<Option<&str>> {
        self.scoped_str("domain", "name")
    }

    fn project_id(&self) -> Result<Option<&str>> {
        self.scoped_str("project", "id")
    }

    fn project_name(&self) -> Result<Option<&str>> {
        self.scoped_str("project", "name")
    }

    fn project_domain_id(&self) -> Result<Option<&str>> {
        self.project_domain_str("id")
    }

    fn project_domain_name(&self) -> Result<Option<&str>> {
        self.project_domain_str("name")
    }

    fn scoped(&self) -> bool {
        self.raw.get("catalog").is_some_and(is_populated) && self.project_scoped()
    }

    fn project_scoped(&self) -> bool {
        self.raw.contains_key("project")
    }

    fn domain_scoped(&self) -> bool {
        self.raw.contains_key("domain")
    }

    fn trust_id(&self) -> Option<&str> {
        self.raw.optional_str(&[TRUST_KEY, "id"])
    }

    fn trust_scoped(&self) -> bool {
        self.raw.contains_key(TRUST_KEY)
    }

    fn trustee_user_id(&self) -> Option<&str> {
        self.raw.optional_str(&[TRUST_KEY, "trustee_user", "id"])
    }

    fn trustor_user_id(&self) -> Option<&str> {
        self.raw.optional_str(&[TRUST_KEY, "trustor_user", "id"])
    }

    fn oauth_access_token_id(&self) -> Option<&str> {
        self.raw.optional_str(&[OAUTH_KEY, "access_token_id"])
    }

    fn oauth_consumer_id(&self) -> Option<&str> {
        self.raw.optional_str(&[OAUTH_KEY, "consumer_id"])
    }

    fn is_federated(&self) -> bool {
        self.raw.has_path(&["user", FEDERATION_KEY])
    }

    fn audit_id(&self) -> Option<&str> {
        self.raw.str_at_index(&["audit_ids"], 0)
    }

    fn audit_chain_id(&self) -> Option<&str> {
        self.raw.str_at_index(&["audit_ids"], 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn access(value: Value) -> AccessInfoV3 {
        AccessInfoV3::from_value(Some("tok".to_owned()), value).unwrap()
    }

    fn user() -> Value {
        json!({"id": "u1", "name": "alice", "domain": {"id": "d1", "name": "Dom"}})
    }

    #[test]
    fn test_project_scope() {
        let info = access(json!({
            "user": user(),
            "project": {"id": "p1", "name": "proj", "domain": {"id": "pd", "name": "ProjDom"}}
        }));
        assert!(info.project_scoped());
        assert!(!info.domain_scoped());
        assert_eq!(info.project_id().unwrap(), Some("p1"));
        assert_eq!(info.project_name().unwrap(), Some("proj"));
        assert_eq!(info.project_domain_id().unwrap(), Some("pd"));
        assert_eq!(info.project_domain_name().unwrap(), Some("ProjDom"));
        assert_eq!(info.domain_id().unwrap(), None);
    }

    #[test]
    fn test_project_without_domain_is_malformed() {
        let info = access(json!({"user": user(), "project": {"id": "p1", "name": "proj"}}));
        assert_eq!(info.project_id().unwrap(), Some("p1"));
        match info.project_domain_id() {
            Err(AccessError::MalformedToken { field }) => assert_eq!(field, "project.domain"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(info.project_domain_name().is_err());
    }

    #[test]
    fn test_domain_scope() {
        let info = access(json!({"user": user(), "domain": {"id": "d9", "name": "Nine"}}));
        assert!(info.domain_scoped());
        assert!(!info.project_scoped());
        assert_eq!(info.domain_id().unwrap(), Some("d9"));
        assert_eq!(info.domain_name().unwrap(), Some("Nine"));
        assert_eq!(info.project_domain_id().unwrap(), None);
    }

    #[test]
    fn test_domain_missing_name_is_malformed() {
        let info = access(json!({"user": user(), "domain": {"id": "d9"}}));
        assert!(info.domain_name().is_err());
    }

    #[test]
    fn test_user_domain_missing_non_federated() {
        let info = access(json!({"user": {"id": "u1", "name": "alice"}}));
        assert!(!info.is_federated());
        match info.user_domain_id() {
            Err(AccessError::MalformedToken { field }) => assert_eq!(field, "user.domain.id"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_user_domain_missing_federated() {
        let info = access(json!({
            "user": {"id": "u1", "name": "alice", "OS-FEDERATION": {"identity_provider": {"id": "idp"}}}
        }));
        assert!(info.is_federated());
        assert_eq!(info.user_domain_id().unwrap(), None);
        assert_eq!(info.user_domain_name().unwrap(), None);
    }

    #[test]
    fn test_roles_share_one_sequence() {
        let info = access(json!({
            "user": user(),
            "roles": [{"id": "r1", "name": "admin"}, {"id": "r2", "name": "member"}]
        }));
        assert_eq!(info.role_ids().unwrap(), vec!["r1", "r2"]);
        assert_eq!(info.role_names().unwrap(), vec!["admin", "member"]);
    }

    #[test]
    fn test_trust_and_oauth() {
        let info = access(json!({
            "user": user(),
            "OS-TRUST:trust": {
                "id": "tr",
                "trustee_user": {"id": "u-ee"},
                "trustor_user": {"id": "u-or"},
                "impersonation": false
            },
            "OS-OAUTH1": {"access_token_id": "at", "consumer_id": "c"}
        }));
        assert!(info.trust_scoped());
        assert_eq!(info.trust_id(), Some("tr"));
        assert_eq!(info.trustee_user_id(), Some("u-ee"));
        assert_eq!(info.trustor_user_id(), Some("u-or"));
        assert_eq!(info.oauth_access_token_id(), Some("at"));
        assert_eq!(info.oauth_consumer_id(), Some("c"));
    }

    #[test]
    fn test_absent_extensions() {
        let info = access(json!({"user": user()}));
        assert!(!info.trust_scoped());
        assert_eq!(info.trust_id(), None);
        assert_eq!(info.trustor_user_id(), None);
        assert_eq!(info.oauth_consumer_id(), None);
        assert_eq!(info.audit_id(), None);
        assert_eq!(info.initial_audit_id(), None);
    }

    #[test]
    fn test_username_required() {
        let info = access(json!({"user": {"id": "u1", "domain": {"id": "d", "name": "D"}}}));
        assert!(info.username().is_err());
    }

    #[test]
    fn test_auth_token_absent_without_header() {
        let mut info = AccessInfoV3::from_value(None, json!({"user": user()})).unwrap();
        assert_eq!(info.auth_token(), None);

        info.set_auth_token(Some("late".to_owned()));
        assert_eq!(info.auth_token(), Some("late"));
        info.set_auth_token(None);
        assert_eq!(info.auth_token(), None);
    }

    #[test]
    fn test_scoped_requires_populated_catalog() {
        let empty = access(json!({
            "user": user(),
            "project": {"id": "p", "name": "n", "domain": {"id": "d", "name": "D"}},
            "catalog": []
        }));
        assert!(empty.has_service_catalog());
        assert!(empty.project_scoped());
        assert!(!empty.scoped());

        let full = access(json!({
            "user": user(),
            "project": {"id": "p", "name": "n", "domain": {"id": "d", "name": "D"}},
            "catalog": [{"type": "compute", "endpoints": []}]
        }));
        assert!(full.scoped());
    }
}
