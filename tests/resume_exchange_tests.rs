mod auth_support;

use fpl_auth::auth::{
    exchange_code, resume_authorization, AuthError, AuthorizationCode, DeviceResponse,
    DvResponse, FailureKind, HandshakeStep, PkcePair, ResumedState,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{form_value, session, settings};

fn device() -> DeviceResponse {
    DeviceResponse {
        dv_response: DvResponse::new("dv1"),
        state: ResumedState::new("st2"),
    }
}

async fn mount_resume_reply(server: &MockServer, reply: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/as/resume"))
        .respond_with(reply)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn resume_reads_code_from_redirect_without_following_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/as/resume"))
        .and(body_string_contains("dvResponse=dv1"))
        .and(body_string_contains("state=st2"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://x/?state=s&code=ABC123"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = session();
    let settings = settings(&server);
    let code = resume_authorization(&session, &settings.endpoints, device())
        .await
        .expect("code captured");

    assert_eq!(code.as_str(), "ABC123");
    let requests = server.received_requests().await.expect("recording enabled");
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(content_type, "application/x-www-form-urlencoded");
    assert_eq!(form_value(&requests[0].body, "dvResponse").as_deref(), Some("dv1"));
}

#[tokio::test]
async fn relative_redirect_is_resolved() {
    let server = MockServer::start().await;
    mount_resume_reply(
        &server,
        ResponseTemplate::new(303).insert_header("Location", "/callback?code=REL1"),
    )
    .await;

    let session = session();
    let settings = settings(&server);
    let code = resume_authorization(&session, &settings.endpoints, device())
        .await
        .expect("code captured");
    assert_eq!(code.as_str(), "REL1");
}

#[tokio::test]
async fn redirect_without_code_is_rejected() {
    let server = MockServer::start().await;
    mount_resume_reply(
        &server,
        ResponseTemplate::new(302).insert_header("Location", "https://x/?state=s"),
    )
    .await;

    let session = session();
    let settings = settings(&server);
    let err = resume_authorization(&session, &settings.endpoints, device())
        .await
        .expect_err("no code");

    assert_eq!(err.step(), HandshakeStep::Resume);
    assert_eq!(err.kind(), FailureKind::Rejection);
}

#[tokio::test]
async fn missing_location_is_rejected() {
    let server = MockServer::start().await;
    mount_resume_reply(
        &server,
        ResponseTemplate::new(200).set_body_string("<html>Something went wrong</html>"),
    )
    .await;

    let session = session();
    let settings = settings(&server);
    let err = resume_authorization(&session, &settings.endpoints, device())
        .await
        .expect_err("no redirect");

    assert!(matches!(
        err,
        AuthError::Rejected {
            step: HandshakeStep::Resume,
            ..
        }
    ));
}

#[tokio::test]
async fn provider_error_redirect_is_rejected() {
    let server = MockServer::start().await;
    mount_resume_reply(
        &server,
        ResponseTemplate::new(302).insert_header(
            "Location",
            "https://x/?error=access_denied&error_description=session%20expired",
        ),
    )
    .await;

    let session = session();
    let settings = settings(&server);
    let err = resume_authorization(&session, &settings.endpoints, device())
        .await
        .expect_err("provider error");
    assert!(err.to_string().contains("session expired"), "{err}");
}

#[tokio::test]
async fn exchange_posts_authorization_code_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/as/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A1",
            "refresh_token": "R1",
            "expires_in": 300
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session();
    let settings = settings(&server);
    let verifier = PkcePair::from_verifier("v".repeat(64)).into_verifier();
    let tokens = exchange_code(&session, &settings, AuthorizationCode::new("AUTH9"), verifier)
        .await
        .expect("exchange succeeds");

    assert_eq!(tokens.access_token.as_str(), "A1");
    assert_eq!(tokens.refresh_token.as_str(), "R1");
    let expires_at = tokens.expires_at.expect("expiry recorded");
    assert_eq!((expires_at - tokens.obtained_at).num_seconds(), 300);

    let requests = server.received_requests().await.expect("recording enabled");
    let body = &requests[0].body;
    assert_eq!(
        form_value(body, "grant_type").as_deref(),
        Some("authorization_code")
    );
    assert_eq!(form_value(body, "code").as_deref(), Some("AUTH9"));
    assert_eq!(form_value(body, "code_verifier"), Some("v".repeat(64)));
    assert_eq!(
        form_value(body, "client_id").as_deref(),
        Some(settings.client_id.as_str())
    );
    assert_eq!(
        form_value(body, "redirect_uri").as_deref(),
        Some(settings.redirect_uri.as_str())
    );
}

#[tokio::test]
async fn invalid_grant_is_single_use_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/as/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session();
    let settings = settings(&server);
    let verifier = PkcePair::from_verifier("v".repeat(64)).into_verifier();
    let err = exchange_code(&session, &settings, AuthorizationCode::new("AUTH9"), verifier)
        .await
        .expect_err("code burned");

    assert!(matches!(
        err,
        AuthError::AlreadyConsumed {
            step: HandshakeStep::TokenExchange,
            ..
        }
    ));
    assert_eq!(err.kind(), FailureKind::SingleUseViolation);
}

#[tokio::test]
async fn other_token_errors_are_status_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/as/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client"
        })))
        .mount(&server)
        .await;

    let session = session();
    let settings = settings(&server);
    let verifier = PkcePair::from_verifier("v".repeat(64)).into_verifier();
    let err = exchange_code(&session, &settings, AuthorizationCode::new("AUTH9"), verifier)
        .await
        .expect_err("client refused");

    assert!(matches!(
        err,
        AuthError::Status {
            step: HandshakeStep::TokenExchange,
            status: 401,
            ..
        }
    ));
}

#[tokio::test]
async fn token_reply_without_refresh_token_is_missing_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/as/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A1"
        })))
        .mount(&server)
        .await;

    let session = session();
    let settings = settings(&server);
    let verifier = PkcePair::from_verifier("v".repeat(64)).into_verifier();
    let err = exchange_code(&session, &settings, AuthorizationCode::new("AUTH9"), verifier)
        .await
        .expect_err("refresh token missing");

    assert!(matches!(
        err,
        AuthError::MissingField {
            step: HandshakeStep::TokenExchange,
            field: "refresh_token",
        }
    ));
}

#[tokio::test]
async fn oversized_expires_in_leaves_expiry_unset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/as/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A1",
            "refresh_token": "R1",
            "expires_in": i64::MAX
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session();
    let settings = settings(&server);
    let verifier = PkcePair::from_verifier("v".repeat(64)).into_verifier();
    let tokens = exchange_code(&session, &settings, AuthorizationCode::new("AUTH9"), verifier)
        .await
        .expect("exchange succeeds");

    assert_eq!(tokens.access_token.as_str(), "A1");
    assert!(tokens.expires_at.is_none());
    assert!(!tokens.is_expired());
}
