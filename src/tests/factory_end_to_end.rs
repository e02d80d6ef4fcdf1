use http::Response;

use crate::catalog::EndpointFilter;
use crate::tests::common::*;
use crate::{create, from_response, AccessError, AccessInfo, SUBJECT_TOKEN_HEADER};

#[test]
fn v2_minimal_response() {
    let body = json!({
        "access": {
            "token": {
                "id": "t1",
                "expires": "2025-01-01T00:00:00Z",
                "issued_at": "2024-01-01T00:00:00Z",
                "tenant": {"id": "p1", "name": "proj"}
            },
            "user": {"id": "u1", "name": "alice"}
        }
    });

    let info = create(body, None).unwrap();
    assert_eq!(info.version(), "v2.0");
    assert_eq!(info.auth_token(), Some("t1"));
    assert_eq!(info.project_id().unwrap(), Some("p1"));
    assert_eq!(info.project_name().unwrap(), Some("proj"));
    assert_eq!(info.user_domain_id().unwrap(), Some("default"));
    assert_eq!(info.user_domain_name().unwrap(), Some("Default"));
    assert_eq!(info.project_domain_id().unwrap(), Some("default"));
    assert!(!info.has_service_catalog());
    assert!(!info.scoped());
    assert!(info.project_scoped());
    assert!(!info.domain_scoped());
    assert_eq!(info.username().unwrap(), Some("alice"));
    assert!(info.role_ids().unwrap().is_empty());
    assert!(info.role_names().unwrap().is_empty());
}

#[test]
fn v3_minimal_response() {
    let body = json!({
        "token": {
            "user": {"id": "u2", "name": "bob"},
            "expires_at": "2025-01-01T00:00:00Z",
            "issued_at": "2024-01-01T00:00:00Z",
            "audit_ids": ["a1"]
        }
    });

    let info = create(body, Some("tok-xyz".to_owned())).unwrap();
    assert_eq!(info.version(), "v3");
    assert_eq!(info.auth_token(), Some("tok-xyz"));
    assert_eq!(info.audit_id(), Some("a1"));
    assert_eq!(info.audit_chain_id(), None);
    assert_eq!(info.initial_audit_id(), Some("a1"));
    assert_eq!(info.user_id().unwrap(), "u2");
    assert!(!info.project_scoped());
    assert!(!info.scoped());
    assert_eq!(info.project_id().unwrap(), None);
    assert_eq!(info.project_domain_id().unwrap(), None);
    assert!(info.service_catalog().is_empty());
}

#[test]
fn unrecognized_response() {
    let err = create(json!({"error": {"code": 401}}), None).unwrap_err();
    assert!(matches!(err, AccessError::UnrecognizedFormat));
    assert_eq!(err.to_string(), "unrecognized auth response");
}

#[test]
fn scoped_v2_catalog_is_built() {
    let info = create(v2_scoped_body("2025-01-01T00:00:00Z"), None).unwrap();
    assert!(info.has_service_catalog());
    assert!(info.scoped());
    let url = info
        .service_catalog()
        .url_for(&EndpointFilter::new().service_type("compute"))
        .unwrap();
    assert_eq!(url, "https://nova.example/v2");
}

#[test]
fn scoped_v3_response_through_transport() {
    let resp = Response::builder()
        .status(201)
        .header(SUBJECT_TOKEN_HEADER, "subject-token")
        .body(v3_scoped_body("2025-01-01T00:00:00Z").to_string())
        .unwrap();

    let info = from_response(&resp, None).unwrap();
    assert_eq!(info.auth_token(), Some("subject-token"));
    assert!(info.scoped());
    assert_eq!(info.role_names().unwrap(), vec!["member"]);
    let url = info
        .service_catalog()
        .url_for(&EndpointFilter::new().service_type("identity").interface("publicURL"))
        .unwrap();
    assert_eq!(url, "https://ks.example/v3");
}

#[test]
fn serialized_payload_round_trips() {
    let original = create(v3_scoped_body("2025-01-01T00:00:00Z"), Some("tok".into())).unwrap();
    let serialized = serde_json::to_value(original.raw()).unwrap();
    assert_eq!(serialized["version"], "v3");

    let restored = create(json!({"token": serialized}), None).unwrap();
    assert_eq!(restored.auth_token(), Some("tok"));
    assert_eq!(restored.version(), "v3");
    assert_eq!(restored.project_id().unwrap(), original.project_id().unwrap());
    assert_eq!(restored.raw().get("version"), Some(&json!("v3")));

    let v2 = create(v2_scoped_body("2025-01-01T00:00:00Z"), None).unwrap();
    let restored = create(json!({"access": v2.raw().to_value()}), None).unwrap();
    assert_eq!(restored.version(), "v2.0");
    assert_eq!(restored.project_name().unwrap(), Some("demo"));
}

#[test]
fn access_info_is_shareable_across_threads() {
    let info = create(v3_scoped_body("2025-01-01T00:00:00Z"), Some("tok".into())).unwrap();
    let info: &dyn AccessInfo = info.as_ref();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| info.project_name().unwrap().map(str::to_owned)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().as_deref(), Some("demo"));
        }
    });
}
