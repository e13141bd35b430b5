//! Login gate HTTP handlers.
//!
//! Both `GET /` and `POST /` end up in the [`LoginGate`](crate::gate::LoginGate).
//! The handlers translate the request into a [`GateRequest`], load and save
//! the session behind the `hcp_session` cookie and turn the outcome into a
//! response.

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        ConnectInfo, FromRequestParts, Query, State,
    },
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use hcp_session::Session;
use uuid::Uuid;

use crate::gate::{GateOutcome, GateRequest, LoginForm};
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "hcp_session";

/// Decoded `name=value` pairs of a query string or form body.
///
/// Repeated names are kept and the last occurrence wins on lookup. A value
/// that could not be decoded at all yields no pairs, so the gate still runs.
#[derive(Debug, Default)]
pub struct Params(Vec<(String, String)>);

impl Params {
    fn from_query(query: Result<Query<Vec<(String, String)>>, QueryRejection>) -> Self {
        match query {
            Ok(Query(pairs)) => Self(pairs),
            Err(e) => {
                tracing::warn!("ignoring malformed query string: {e}");
                Self::default()
            }
        }
    }

    fn from_form(form: Result<Form<Vec<(String, String)>>, FormRejection>) -> Self {
        match form {
            Ok(Form(pairs)) => Self(pairs),
            Err(e) => {
                tracing::warn!("ignoring unreadable login form: {e}");
                Self::default()
            }
        }
    }

    /// Checks if `name` is present, with or without a value.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }

    /// Returns the last value given for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Client address as seen by the server.
///
/// Holds the peer address from the connection, when available, and the
/// first `X-Forwarded-For` entry.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr {
    peer: Option<IpAddr>,
    forwarded: Option<IpAddr>,
}

impl ClientAddr {
    /// Address used when neither the connection nor a proxy reveals one.
    pub const UNKNOWN: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

    /// Picks the client address, preferring the proxy header when trusted.
    #[must_use]
    pub fn resolve(&self, trust_proxy: bool) -> IpAddr {
        let forwarded = self.forwarded.filter(|_| trust_proxy);
        forwarded.or(self.peer).unwrap_or(Self::UNKNOWN)
    }
}

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse().ok());
        Ok(Self { peer, forwarded })
    }
}

/// Shows the login or maintenance page, or redirects a logged-in session.
pub async fn login_page(
    State(state): State<AppState>,
    client: ClientAddr,
    headers: HeaderMap,
    jar: CookieJar,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let query = Params::from_query(query);
    let request = gate_request(&state, &query, None, client, &headers);
    run_gate(&state, &request, jar).await
}

/// Handles login form submission.
pub async fn login_submit(
    State(state): State<AppState>,
    client: ClientAddr,
    headers: HeaderMap,
    jar: CookieJar,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let query = Params::from_query(query);
    let form = Params::from_form(form);
    let form = (form.contains("uname") || form.contains("upass")).then(|| LoginForm {
        uname: form.get("uname").map(str::to_string),
        upass: form.get("upass").map(str::to_string),
    });
    let request = gate_request(&state, &query, form, client, &headers);
    run_gate(&state, &request, jar).await
}

fn gate_request(
    state: &AppState,
    query: &Params,
    form: Option<LoginForm>,
    client: ClientAddr,
    headers: &HeaderMap,
) -> GateRequest {
    let config = state.config();
    let forwarded_https = config.trust_proxy
        && headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("https"));
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| format!("{}:{}", config.host, config.port), str::to_string);

    GateRequest {
        logout: query.contains("logout"),
        admin: query.contains("admin"),
        form,
        https: config.tls || forwarded_https,
        host,
        client: client.resolve(config.trust_proxy),
    }
}

async fn load_session(state: &AppState, jar: &CookieJar) -> Session {
    let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    else {
        return Session::new();
    };
    match state.sessions.load(id).await {
        Ok(Some(session)) => session,
        Ok(None) => Session::new(),
        Err(e) => {
            tracing::error!(session = %id, "failed to load session: {e}");
            Session::new()
        }
    }
}

async fn run_gate(state: &AppState, request: &GateRequest, jar: CookieJar) -> Response {
    let mut session = load_session(state, &jar).await;
    let was_authenticated = session.is_authenticated();

    let outcome = match state.gate.handle(request, &mut session).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response();
        }
    };

    if !was_authenticated && session.is_authenticated() {
        // Fresh login: never keep a session id chosen before authentication.
        if let Err(e) = state.sessions.remove(session.id).await {
            tracing::warn!(session = %session.id, "failed to drop pre-login session: {e}");
        }
        session.id = Uuid::new_v4();
    }
    if let Err(e) = state.sessions.save(&session).await {
        tracing::error!(session = %session.id, "failed to save session: {e}");
    }

    let cookie = Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(request.https);
    let jar = jar.add(cookie);

    match outcome {
        GateOutcome::Redirect(target) => (jar, Redirect::to(&target)).into_response(),
        GateOutcome::Page(page) => (jar, Html(page.document)).into_response(),
    }
}
