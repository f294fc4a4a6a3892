#![allow(dead_code)]

use std::time::Duration;

use fpl_auth::auth::{
    HandshakeSettings, InteractionContext, InteractionToken, ProviderEndpoints, SessionContext,
};
use fpl_auth::config::Credentials;
use serde_json::json;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const POLICY_ID: &str = "p1";
pub const DEFAULT_CONNECTION: &str = "c-default";
pub const ROTATED_CONNECTION: &str = "c2";
pub const USERNAME: &str = "manager@example.com";
pub const PASSWORD: &str = "hunter2";

pub fn settings(server: &MockServer) -> HandshakeSettings {
    settings_with_timeout(server, Duration::from_secs(5))
}

pub fn settings_with_timeout(server: &MockServer, step_timeout: Duration) -> HandshakeSettings {
    HandshakeSettings::builder()
        .endpoints(ProviderEndpoints::from_base_url(&server.uri(), POLICY_ID))
        .default_connection_id(DEFAULT_CONNECTION.to_string())
        .step_timeout(step_timeout)
        .user_agent("fpl-auth-tests".to_string())
        .build()
}

pub fn session() -> SessionContext {
    SessionContext::new("fpl-auth-tests", Duration::from_secs(5)).expect("session context")
}

pub fn credentials() -> Credentials {
    Credentials::new(USERNAME, PASSWORD)
}

pub fn interaction() -> InteractionContext {
    InteractionContext {
        interaction_id: "i1".to_string(),
        interaction_token: InteractionToken::new("it1"),
    }
}

pub fn login_path(connection_id: &str) -> String {
    format!("/davinci/connections/{connection_id}/capabilities/customHTMLTemplate")
}

pub fn start_path() -> String {
    format!("/davinci/policy/{POLICY_ID}/start")
}

/// Authorization page shaped like the provider's sign-in HTML.
pub fn login_page(access_token: &str, state: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><script>window.__config = {{"flow":"signon","accessToken":"{access_token}","region":"eu"}};</script></head>
<body>
  <form method="post" action="/as/resume">
    <input type="hidden" name="state" value="{state}"/>
  </form>
</body>
</html>"#
    )
}

pub async fn mount_authorize(server: &MockServer, html: String) {
    Mock::given(method("GET"))
        .and(path("/as/authorize"))
        .and(query_param("response_type", "code"))
        .and(query_param("code_challenge_method", "S256"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_start_policy(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(start_path()))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "interactionId": "i1",
            "interactionToken": "it1",
            "id": "e1"
        })))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_poll_continue(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(login_path(DEFAULT_CONNECTION)))
        .and(header("interactionId", "i1"))
        .and(header("interactionToken", "it1"))
        .and(body_partial_json(json!({
            "id": "e1",
            "eventName": "continue",
            "parameters": { "eventType": "polling" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "e2" })))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_submit_credentials(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(login_path(DEFAULT_CONNECTION)))
        .and(header("interactionId", "i1"))
        .and(header("interactionToken", "it1"))
        .and(body_partial_json(json!({
            "id": "e2",
            "nextEvent": { "eventName": "continue" },
            "parameters": {
                "buttonValue": "SIGNON",
                "username": USERNAME,
                "password": PASSWORD
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "e3",
            "connectionId": ROTATED_CONNECTION
        })))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_confirm_sign_on(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(login_path(ROTATED_CONNECTION)))
        .and(header("interactionId", "i1"))
        .and(header("interactionToken", "it1"))
        .and(body_partial_json(json!({
            "id": "e3",
            "parameters": { "buttonValue": "SIGNON" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dvResponse": "dv1" })))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_resume(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/as/resume"))
        .and(body_string_contains("dvResponse=dv1"))
        .and(body_string_contains("state=st2"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "https://fantasy.example/?state=st2&code=AUTH9"),
        )
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/as/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=AUTH9"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A1",
            "refresh_token": "R1",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount every step of a successful sign-in.
pub async fn mount_happy_path(server: &MockServer) {
    mount_authorize(server, login_page("tok1", "st2")).await;
    mount_start_policy(server).await;
    mount_poll_continue(server).await;
    mount_submit_credentials(server).await;
    mount_confirm_sign_on(server).await;
    mount_resume(server).await;
    mount_token(server).await;
}

/// Form field value from a urlencoded request body.
pub fn form_value(body: &[u8], key: &str) -> Option<String> {
    let url = reqwest::Url::parse(&format!(
        "http://form.invalid/?{}",
        String::from_utf8_lossy(body)
    ))
    .ok()?;
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
