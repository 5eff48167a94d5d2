use serde_json::json;
use talentgate_identity::{
    AuthChangeEvent, IdentityClient, IdentityError, IdentityOptions, SessionCache, SignUpOutcome,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_body(access_token: &str, user_type: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "test_refresh_token",
        "user": {
            "id": "test_user_id",
            "email": "test@example.com",
            "app_metadata": {},
            "user_metadata": { "user_type": user_type }
        }
    })
}

fn client(server: &MockServer, options: IdentityOptions) -> IdentityClient {
    IdentityClient::new(&server.uri(), "test_anon_key", reqwest::Client::new(), options)
}

#[tokio::test]
async fn sign_up_reports_pending_confirmation() {
    let mock_server = MockServer::start().await;

    // Without auto-confirm the provider answers with the bare user record.
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "test_user_id",
            "email": "test@example.com",
            "user_metadata": { "user_type": "candidate" }
        })))
        .mount(&mock_server)
        .await;

    let identity = client(&mock_server, IdentityOptions::default());
    let outcome = identity
        .sign_up("test@example.com", "password123", "candidate")
        .await
        .unwrap();

    match outcome {
        SignUpOutcome::ConfirmationRequired(user) => {
            assert_eq!(user.id, "test_user_id");
            assert_eq!(user.user_type(), Some("candidate"));
        }
        SignUpOutcome::Session(_) => panic!("expected pending confirmation"),
    }
    assert!(identity.session().is_none());
}

#[tokio::test]
async fn sign_up_adopts_auto_confirmed_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("signup_token", "recruiter")))
        .mount(&mock_server)
        .await;

    let identity = client(&mock_server, IdentityOptions::default());
    let outcome = identity
        .sign_up("test@example.com", "password123", "recruiter")
        .await
        .unwrap();

    assert!(matches!(outcome, SignUpOutcome::Session(_)));
    let session = identity.session().unwrap();
    assert_eq!(session.access_token, "signup_token");
    assert!(session.expires_at.is_some());
}

#[tokio::test]
async fn sign_in_with_password_stores_the_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "test_anon_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("test_access_token", "candidate")))
        .mount(&mock_server)
        .await;

    let identity = client(&mock_server, IdentityOptions::default());
    let session = identity
        .sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();

    assert_eq!(session.access_token, "test_access_token");
    assert_eq!(session.user_id(), "test_user_id");
    assert_eq!(session.user_type(), Some("candidate"));
    assert!(identity.session().is_some());
}

#[tokio::test]
async fn sign_in_maps_bad_credentials_to_authentication_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&mock_server)
        .await;

    let identity = client(&mock_server, IdentityOptions::default());
    let result = identity
        .sign_in_with_password("test@example.com", "wrong")
        .await;

    assert!(matches!(result, Err(IdentityError::AuthenticationError(_))));
    assert!(identity.session().is_none());
}

#[tokio::test]
async fn current_session_restores_from_the_cache() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("session.json");

    // Seed the cache the way a previous process would have left it.
    let seeded = client(&mock_server, IdentityOptions {
        cache_path: Some(cache_path.clone()),
        ..IdentityOptions::default()
    });
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("cached_token", "candidate")))
        .mount(&mock_server)
        .await;
    seeded
        .sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();

    // A fresh client with the same cache path restores without a network call.
    let restored = client(&mock_server, IdentityOptions {
        cache_path: Some(cache_path),
        ..IdentityOptions::default()
    });
    let session = restored.current_session().await.unwrap().unwrap();
    assert_eq!(session.access_token, "cached_token");
    assert_eq!(restored.session().unwrap().access_token, "cached_token");
}

#[tokio::test]
async fn current_session_refreshes_an_expired_cache_entry() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("session.json");

    let mut stale: talentgate_identity::ProviderSession =
        serde_json::from_value(session_body("stale_token", "recruiter")).unwrap();
    stale.expires_at = Some(chrono::Utc::now().timestamp() - 60);
    SessionCache::new(cache_path.clone()).store(&stale).unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("fresh_token", "recruiter")))
        .mount(&mock_server)
        .await;

    let identity = client(&mock_server, IdentityOptions {
        cache_path: Some(cache_path.clone()),
        ..IdentityOptions::default()
    });
    let session = identity.current_session().await.unwrap().unwrap();
    assert_eq!(session.access_token, "fresh_token");

    // The cache follows the refresh.
    let cached = SessionCache::new(cache_path).load().unwrap();
    assert_eq!(cached.access_token, "fresh_token");
}

#[tokio::test]
async fn current_session_is_none_when_refresh_is_rejected() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("session.json");

    let mut stale: talentgate_identity::ProviderSession =
        serde_json::from_value(session_body("stale_token", "candidate")).unwrap();
    stale.expires_at = Some(chrono::Utc::now().timestamp() - 60);
    SessionCache::new(cache_path.clone()).store(&stale).unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token revoked"))
        .mount(&mock_server)
        .await;

    let identity = client(&mock_server, IdentityOptions {
        cache_path: Some(cache_path),
        ..IdentityOptions::default()
    });

    // A dead refresh token means no session, not an error.
    let restored = identity.current_session().await.unwrap();
    assert!(restored.is_none());
}

#[tokio::test]
async fn current_session_is_none_on_a_cold_start() {
    let mock_server = MockServer::start().await;
    let identity = client(&mock_server, IdentityOptions::default());
    assert!(identity.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn sign_out_clears_state_even_when_revocation_fails() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("session.json");

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("test_access_token", "candidate")))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&mock_server)
        .await;

    let identity = client(&mock_server, IdentityOptions {
        cache_path: Some(cache_path.clone()),
        ..IdentityOptions::default()
    });
    identity
        .sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();

    let result = identity.sign_out().await;
    assert!(result.is_err());
    assert!(identity.session().is_none());
    assert!(SessionCache::new(cache_path).load().is_none());
}

#[tokio::test]
async fn auth_changes_are_broadcast_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("test_access_token", "recruiter")))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let identity = client(&mock_server, IdentityOptions::default());
    let mut changes = identity.on_auth_state_change();

    identity
        .sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();
    identity.sign_out().await.unwrap();

    let first = changes.recv().await.unwrap();
    assert_eq!(first.event, AuthChangeEvent::SignedIn);
    assert_eq!(first.session.unwrap().access_token, "test_access_token");

    let second = changes.recv().await.unwrap();
    assert_eq!(second.event, AuthChangeEvent::SignedOut);
    assert!(second.session.is_none());
}
