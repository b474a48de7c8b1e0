//! Integration tests for the injected session store and face-auth flow.

mod common;

use facemark_session::{SessionGrant, SessionStore};
use facemark_transport::{ApiError, ApiRequest, AttendanceClient};

fn client_for(transport: std::sync::Arc<common::ScriptedTransport>) -> AttendanceClient {
    AttendanceClient::new("http://attendance.example.test", transport)
        .expect("client fixture should build")
}

#[test]
fn session_state_tests_face_login_grant_feeds_bearer_reads() {
    let login_transport = common::ScriptedTransport::replying(
        200,
        r#"{"message":"Authentication successful","token":"token-9"}"#,
    );
    let client = client_for(login_transport);

    let response = client
        .face_login("Ada", &common::fixture_image())
        .expect("face login should succeed");

    let store = SessionStore::new();
    store.sign_in(SessionGrant::from_face_auth("Ada", response).expect("grant should validate"));
    assert_eq!(store.bearer().as_deref(), Some("token-9"));

    let read_transport = common::ScriptedTransport::replying(200, "[]");
    let read_client = client_for(read_transport.clone());
    let bearer = store.bearer().expect("session should be open");
    read_client
        .list_courses(&bearer)
        .expect("course read should succeed");

    let requests = read_transport.requests();
    let ApiRequest::Fetch { bearer, .. } = &requests[0] else {
        panic!("expected a fetch request");
    };
    assert_eq!(bearer.as_deref(), Some("token-9"));
}

#[test]
fn session_state_tests_rejected_face_login_opens_no_session() {
    let transport =
        common::ScriptedTransport::replying(401, r#"{"message":"No matching face found"}"#);
    let client = client_for(transport);

    let result = client.face_login("Ada", &common::fixture_image());
    assert!(matches!(
        result,
        Err(ApiError::Rejected { status: 401, .. })
    ));
}

#[test]
fn session_state_tests_store_handles_share_one_session() {
    let store = SessionStore::new();
    let handle = store.clone();

    let transport = common::ScriptedTransport::replying(
        200,
        r#"{"message":"Authentication successful","token":"token-1"}"#,
    );
    let response = client_for(transport)
        .face_login("Ada", &common::fixture_image())
        .expect("face login should succeed");
    store.sign_in(SessionGrant::from_face_auth("Ada", response).expect("grant should validate"));

    assert!(handle.is_signed_in());
    assert_eq!(handle.subject().as_deref(), Some("Ada"));

    handle.sign_out();
    assert!(!store.is_signed_in());
    assert!(store.bearer().is_none());
}
