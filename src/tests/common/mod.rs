// shared token fixtures
pub use serde_json::{json, Value};

use chrono::{DateTime, SecondsFormat, Utc};

pub fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// V2 response body with a tenant-scoped token and a populated catalog.
pub fn v2_scoped_body(expires: &str) -> Value {
    json!({
        "access": {
            "token": {
                "id": "v2-token",
                "expires": expires,
                "issued_at": "2024-01-01T00:00:00Z",
                "tenant": {"id": "tenant-1", "name": "demo"},
                "audit_ids": ["audit-new", "audit-root"]
            },
            "user": {
                "id": "user-1",
                "name": "alice",
                "roles": [{"name": "member"}]
            },
            "metadata": {"roles": ["role-1"]},
            "serviceCatalog": [{
                "type": "compute",
                "name": "nova",
                "endpoints": [{"region": "RegionOne", "publicURL": "https://nova.example/v2"}]
            }]
        }
    })
}

/// V3 response body scoped to a project, with trust and federation extensions.
pub fn v3_scoped_body(expires: &str) -> Value {
    json!({
        "token": {
            "expires_at": expires,
            "issued_at": "2024-01-01T00:00:00.000000Z",
            "methods": ["password"],
            "user": {
                "id": "user-2",
                "name": "bob",
                "domain": {"id": "default", "name": "Default"}
            },
            "project": {
                "id": "project-1",
                "name": "demo",
                "domain": {"id": "default", "name": "Default"}
            },
            "roles": [{"id": "role-1", "name": "member"}],
            "catalog": [{
                "type": "identity",
                "id": "svc-ks",
                "endpoints": [
                    {"id": "ep-1", "interface": "public", "region_id": "RegionOne", "url": "https://ks.example/v3"}
                ]
            }],
            "audit_ids": ["audit-only"]
        }
    })
}
