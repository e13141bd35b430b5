//! End-to-end tests of the login gate routes.

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use hcp_server::{Server, ServerConfig};
use tower::ServiceExt;

const ADMIN: &str = "admin";
const ADMIN_PASSWORD: &str = "correct horse";

fn server(configure: impl FnOnce(&mut ServerConfig)) -> Server {
    let mut config = ServerConfig::for_testing();
    config.admin_user = Some(ADMIN.to_string());
    config.admin_password = Some(ADMIN_PASSWORD.to_string());
    configure(&mut config);
    Server::new(config).unwrap()
}

fn get(uri: &str, client: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "panel.example.com")
        .header("x-forwarded-for", client)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, client: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, "panel.example.com")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

/// Returns `name=value` of the session cookie set by the response.
fn session_cookie(response: &Response<Body>) -> String {
    let value = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    assert!(value.contains("HttpOnly"));
    value.split(';').next().unwrap().to_string()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn anonymous_visitor_gets_login_form() {
    let server = server(|_| {});
    let app = server.test_router();

    let response = send(&app, get("/", "192.0.2.1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).starts_with("hcp_session="));

    let html = body_text(response).await;
    assert!(html.contains(r#"name="uname""#));
    assert!(html.contains(r#"name="upass""#));
    assert!(html.contains("Login</title>"));
}

#[tokio::test]
async fn login_redirects_and_session_sticks() {
    let server = server(|_| {});
    let app = server.test_router();

    let first = send(&app, get("/", "192.0.2.2")).await;
    let anonymous_cookie = session_cookie(&first);

    let request = with_cookie(
        post("/", "192.0.2.2", "uname=admin&upass=correct+horse"),
        &anonymous_cookie,
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/index.php");

    let cookie = session_cookie(&response);
    assert_ne!(cookie, anonymous_cookie, "session id must change on login");

    let response = send(&app, with_cookie(get("/", "192.0.2.2"), &cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/index.php");

    let response = send(&app, with_cookie(get("/?logout", "192.0.2.2"), &cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, with_cookie(get("/", "192.0.2.2"), &cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_shows_error() {
    let server = server(|_| {});
    let app = server.test_router();

    let response = send(&app, post("/", "192.0.2.3", "uname=admin&upass=nope")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("You entered an incorrect username"));
    assert!(html.contains("You have to wait"));
}

#[tokio::test]
async fn empty_fields_are_required() {
    let server = server(|_| {});
    let app = server.test_router();

    let response = send(&app, post("/", "192.0.2.4", "uname=admin&upass=")).await;
    let html = body_text(response).await;
    assert!(html.contains("All fields are required."));
}

#[tokio::test]
async fn repeated_field_uses_last_value() {
    let server = server(|_| {});
    let app = server.test_router();

    let body = "uname=nobody&uname=admin&upass=correct+horse";
    let response = send(&app, post("/", "192.0.2.10", body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/index.php");
}

#[tokio::test]
async fn form_without_content_type_still_renders_page() {
    let server = server(|_| {});
    let app = server.test_router();

    let mut request = post("/", "192.0.2.11", "uname=admin&upass=correct+horse");
    request.headers_mut().remove(header::CONTENT_TYPE);
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains(r#"name="uname""#));
    assert!(!html.contains("All fields are required."));
}

#[tokio::test]
async fn repeated_query_flags_are_accepted() {
    let server = server(|_| {});
    let app = server.test_router();

    let response = send(&app, get("/?logout&logout&admin&admin=1", "192.0.2.12")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="uname""#));
}

#[tokio::test]
async fn partial_submission_renders_login_form() {
    let server = server(|_| {});
    let app = server.test_router();

    let response = send(&app, post("/", "192.0.2.13", "uname=admin")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains(r#"name="upass""#));
    assert!(!html.contains("All fields are required."));
    assert!(!html.contains("incorrect username"));
}

#[tokio::test]
async fn undecodable_form_body_still_renders_page() {
    let server = server(|_| {});
    let app = server.test_router();

    let response = send(&app, post("/", "192.0.2.14", "uname=%FF%FE&upass=x")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="uname""#));
}

#[tokio::test]
async fn maintenance_mode_shows_notice_unless_admin() {
    let server = server(|config| {
        config.panel.maintenance.enabled = true;
        config.panel.maintenance.message = "Upgrading the panel.".to_string();
    });
    let app = server.test_router();

    let response = send(&app, get("/", "192.0.2.5")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("System under maintenance"));
    assert!(html.contains("Upgrading the panel."));
    assert!(html.contains("?admin=1"));

    let response = send(&app, get("/?admin=1", "192.0.2.5")).await;
    let html = body_text(response).await;
    assert!(html.contains(r#"name="uname""#));
    assert!(html.contains("?admin=1"));
}

#[tokio::test]
async fn pending_database_update_shows_notice() {
    let server = server(|config| {
        config.db_revision = 10;
        config.db_revision_latest = 11;
    });
    let app = server.test_router();

    let html = body_text(send(&app, get("/", "192.0.2.6")).await).await;
    assert!(html.contains("System under maintenance"));
}

#[tokio::test]
async fn ssl_link_follows_forwarded_scheme() {
    let server = server(|config| config.panel.ssl_enabled = true);
    let app = server.test_router();

    let html = body_text(send(&app, get("/", "192.0.2.7")).await).await;
    assert!(html.contains("panel.example.com"));
    assert!(html.contains("i_lock"));
    assert!(html.contains("Secure connection"));

    let mut request = get("/", "192.0.2.7");
    request
        .headers_mut()
        .insert("x-forwarded-proto", "https".parse().unwrap());
    let response = send(&app, request).await;
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.contains("Secure"));

    let html = body_text(response).await;
    assert!(html.contains("i_unlock"));
    assert!(html.contains("Normal connection"));
}

#[test]
fn out_of_range_settings_stop_startup() {
    let mut config = ServerConfig::for_testing();
    config.panel.session_timeout_minutes = i64::MAX / 2;
    let err = Server::new(config).err().expect("startup must fail");
    assert!(err.to_string().contains("session timeout"));
}

#[tokio::test]
async fn health_endpoints() {
    let server = server(|_| {});
    let app = server.test_router();

    for uri in ["/health", "/health/live", "/health/ready"] {
        let response = send(&app, get(uri, "192.0.2.8")).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}
