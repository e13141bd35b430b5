//! The login gate.
//!
//! [`LoginGate::handle`] runs once per request against the visitor's
//! session and decides between three outcomes: redirect an authenticated
//! session to its landing page, show the maintenance notice, or show the
//! login form.
//!
//! The steps, in order:
//!
//! 1. `logout` clears the session identity;
//! 2. an idle session loses its identity;
//! 3. brute force bookkeeping is prepared for the client address;
//! 4. submitted credentials are normalized, checked and authenticated;
//! 5. an authenticated session is revalidated and redirected, or logged
//!    out when its level has no landing page;
//! 6. the wait-between-attempts warning and tarpit delay are applied;
//! 7. the maintenance or login view is rendered.

use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use hcp_auth::input::{check_input, normalize_username};
use hcp_auth::{AuthError, Authenticator, LoginAttempt, LoginThrottle, UserLevel};
use hcp_core::event::{Event, EventType};
use hcp_core::{Catalog, DatabaseUpdate, PanelConfig, Translator, UpdateProbe};
use hcp_session::{Identity, Session, SessionState};

use crate::hooks::LoginHook;
use crate::message::PageMessages;
use crate::view::{
    AskamaRenderer, Layout, LoginPage, MaintenancePage, Page, RenderError, RenderedPage, Renderer,
    SslLink, View,
};

/// Target of the maintenance page's administrator login button.
pub const ADMIN_LOGIN_PATH: &str = "/?admin=1";

/// Submitted login form fields.
///
/// A field is `None` when it was absent from the submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// User name field.
    pub uname: Option<String>,
    /// Password field.
    pub upass: Option<String>,
}

/// What the gate needs to know about a request.
#[derive(Debug, Clone)]
pub struct GateRequest {
    /// `logout` query flag present.
    pub logout: bool,
    /// `admin` query flag present.
    pub admin: bool,
    /// Posted form, if the request carried a non-empty form body.
    pub form: Option<LoginForm>,
    /// Request arrived over HTTPS.
    pub https: bool,
    /// Host the request was addressed to.
    pub host: String,
    /// Client address.
    pub client: IpAddr,
}

impl GateRequest {
    /// Creates a plain `GET /` request from `client`.
    #[must_use]
    pub fn new(client: IpAddr, host: impl Into<String>) -> Self {
        Self {
            logout: false,
            admin: false,
            form: None,
            https: false,
            host: host.into(),
            client,
        }
    }

    /// Sets the `logout` flag.
    #[must_use]
    pub const fn with_logout(mut self) -> Self {
        self.logout = true;
        self
    }

    /// Sets the `admin` flag.
    #[must_use]
    pub const fn with_admin(mut self) -> Self {
        self.admin = true;
        self
    }

    /// Marks the request as received over HTTPS.
    #[must_use]
    pub const fn with_https(mut self) -> Self {
        self.https = true;
        self
    }

    /// Attaches a posted form with both fields present.
    #[must_use]
    pub fn with_credentials(mut self, uname: impl Into<String>, upass: impl Into<String>) -> Self {
        self.form = Some(LoginForm {
            uname: Some(uname.into()),
            upass: Some(upass.into()),
        });
        self
    }
}

/// Result of handling a request.
#[derive(Debug)]
pub enum GateOutcome {
    /// Send the visitor to this path.
    Redirect(String),
    /// Send this page.
    Page(Box<RenderedPage>),
}

impl GateOutcome {
    /// Returns the redirect target, if any.
    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Redirect(target) => Some(target),
            Self::Page(_) => None,
        }
    }

    /// Returns the rendered page, if any.
    #[must_use]
    pub fn page(&self) -> Option<&RenderedPage> {
        match self {
            Self::Page(page) => Some(&**page),
            Self::Redirect(_) => None,
        }
    }
}

/// Login gate with its collaborators.
pub struct LoginGate {
    config: PanelConfig,
    authenticator: Arc<dyn Authenticator>,
    throttle: Arc<LoginThrottle>,
    translator: Arc<dyn Translator>,
    renderer: Arc<dyn Renderer>,
    updates: Arc<dyn UpdateProbe>,
    hooks: Vec<Arc<dyn LoginHook>>,
}

/// Builder for [`LoginGate`].
pub struct LoginGateBuilder {
    gate: LoginGate,
}

impl LoginGateBuilder {
    /// Sets the translator (default: empty English catalog).
    #[must_use]
    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.gate.translator = translator;
        self
    }

    /// Sets the renderer (default: [`AskamaRenderer`]).
    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.gate.renderer = renderer;
        self
    }

    /// Sets the pending update probe (default: never pending).
    #[must_use]
    pub fn updates(mut self, updates: Arc<dyn UpdateProbe>) -> Self {
        self.gate.updates = updates;
        self
    }

    /// Registers a lifecycle hook.
    #[must_use]
    pub fn hook(mut self, hook: Arc<dyn LoginHook>) -> Self {
        self.gate.hooks.push(hook);
        self
    }

    /// Builds the gate.
    #[must_use]
    pub fn build(self) -> LoginGate {
        self.gate
    }
}

impl LoginGate {
    /// Starts building a gate.
    #[must_use]
    pub fn builder(
        config: PanelConfig,
        authenticator: Arc<dyn Authenticator>,
        throttle: Arc<LoginThrottle>,
    ) -> LoginGateBuilder {
        LoginGateBuilder {
            gate: Self {
                config,
                authenticator,
                throttle,
                translator: Arc::new(Catalog::new()),
                renderer: Arc::new(AskamaRenderer),
                updates: Arc::new(DatabaseUpdate::up_to_date()),
                hooks: Vec::new(),
            },
        }
    }

    /// Returns the panel configuration.
    #[must_use]
    pub const fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Checks if maintenance mode is on or a system update is pending.
    #[must_use]
    pub fn maintenance_active(&self) -> bool {
        self.config.maintenance.enabled || self.updates.is_update_available()
    }

    /// Handles one request against `session`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the chosen view cannot be rendered; every
    /// other failure degrades to a page message.
    pub async fn handle(
        &self,
        request: &GateRequest,
        session: &mut Session,
    ) -> Result<GateOutcome, RenderError> {
        for hook in &self.hooks {
            hook.on_start(request);
        }

        let now = Utc::now();
        let mut messages = PageMessages::default();

        if request.logout {
            if let Some(identity) = session.logout() {
                tracing::info!(user = %identity.user_name, "user logged out");
                Event::builder(EventType::Logout)
                    .user(identity.user_name)
                    .ip_address(request.client)
                    .session(session.id)
                    .emit();
            }
        }

        if let Some(identity) = session.expire_if_idle(self.config.session_timeout(), now) {
            tracing::info!(user = %identity.user_name, "session timed out");
            Event::builder(EventType::SessionTimeout)
                .user(identity.user_name)
                .ip_address(request.client)
                .session(session.id)
                .emit();
        }
        session.touch();

        self.throttle.init(request.client, now);

        match &request.form {
            Some(_) if request.logout => {
                tracing::debug!("credentials ignored on logout request");
            }
            Some(form) => self.submit(form, request, session, &mut messages).await,
            None => {}
        }

        let maintenance_gate = self.maintenance_active() && !request.admin;

        if !maintenance_gate && session.is_authenticated() {
            if let Some(target) = self.route(request, session).await {
                return Ok(GateOutcome::Redirect(target));
            }
        }

        if let Some(wait) = self.throttle.wait_remaining(request.client, now) {
            messages.warning(
                self.translator
                    .tr_args("You have to wait %d seconds.", &[&wait.num_seconds().max(1)]),
            );
        }
        let delay = self.throttle.tarpit(request.client);
        if !delay.is_zero() {
            tracing::debug!(client = %request.client, ?delay, "delaying response");
            tokio::time::sleep(delay).await;
        }

        let mut view = if maintenance_gate {
            self.maintenance_view(messages)
        } else {
            self.login_view(request, messages)
        };
        for hook in &self.hooks {
            hook.before_render(&mut view);
        }

        let document = self.renderer.render(&view)?;
        let mut page = RenderedPage { view, document };
        for hook in &self.hooks {
            hook.on_end(&mut page);
        }
        Ok(GateOutcome::Page(Box::new(page)))
    }

    /// Processes a posted login form.
    async fn submit(
        &self,
        form: &LoginForm,
        request: &GateRequest,
        session: &mut Session,
        messages: &mut PageMessages,
    ) {
        let (Some(uname), Some(upass)) = (&form.uname, &form.upass) else {
            return;
        };
        if uname.is_empty() || upass.is_empty() {
            messages.error(self.translator.tr("All fields are required."));
            return;
        }

        let user_name = match Self::sanitize(uname, upass) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(client = %request.client, error = %e, "login data rejected");
                Event::builder(EventType::InvalidInput)
                    .failure(e.to_string())
                    .ip_address(request.client)
                    .emit();
                messages.error(self.translator.tr("The submitted data contains invalid characters."));
                return;
            }
        };

        tracing::debug!(state = ?SessionState::Authenticating, user = %user_name, "checking credentials");
        let attempt = LoginAttempt::new(&user_name, upass, request.client)
            .in_maintenance(self.maintenance_active());

        match self.authenticator.authenticate(&attempt).await {
            Ok(user) => {
                tracing::info!(user = %user.name, level = %user.level, "user logged in");
                Event::builder(EventType::Login)
                    .user(user.name.as_str())
                    .ip_address(request.client)
                    .session(session.id)
                    .emit();
                session.login(Identity::new(user.id, user.name, user.level.as_str()));
            }
            Err(e) => messages.error(self.auth_message(&e)),
        }
    }

    /// IDN-normalizes the user name and checks both fields.
    fn sanitize(uname: &str, upass: &str) -> Result<String, AuthError> {
        let user_name = normalize_username(uname)?;
        check_input("uname", user_name.trim())?;
        check_input("upass", upass.trim())?;
        Ok(user_name)
    }

    fn auth_message(&self, err: &AuthError) -> String {
        let tr = self.translator.as_ref();
        match err {
            AuthError::InvalidCredentials => tr.tr("You entered an incorrect username/password."),
            AuthError::Maintenance => {
                tr.tr("System is currently under maintenance! Only administrators can login.")
            }
            AuthError::AccountDisabled => tr.tr("Your account has been disabled."),
            AuthError::AccountSuspended => tr.tr("Your account has been suspended."),
            AuthError::Blocked { until } => {
                let seconds = (*until - Utc::now()).num_seconds().max(0);
                tr.tr_args("You have been blocked for %d minutes.", &[&((seconds + 59) / 60)])
            }
            AuthError::MustWait { seconds } => {
                tr.tr_args("You have to wait %d seconds.", &[seconds])
            }
            AuthError::InvalidInput { .. } => {
                tr.tr("The submitted data contains invalid characters.")
            }
            AuthError::Internal(msg) => {
                tracing::error!("authentication failed internally: {msg}");
                tr.tr("An unexpected error occurred. Please try again.")
            }
        }
    }

    /// Revalidates an authenticated session and resolves its landing page.
    ///
    /// Returns `None` after clearing the identity when the user is gone or
    /// the level has no landing page, and `None` without clearing when the
    /// user store is unavailable.
    async fn route(&self, request: &GateRequest, session: &mut Session) -> Option<String> {
        let identity = session.identity.clone()?;

        match self.authenticator.revalidate(&identity.user_name).await {
            Ok(Some(user)) if user.id == identity.user_id => {}
            Ok(_) => {
                self.force_logout(request, session, "account no longer valid");
                return None;
            }
            Err(e) => {
                tracing::error!(user = %identity.user_name, "session revalidation failed: {e}");
                return None;
            }
        }

        match self.landing_page(&identity.level) {
            Some(target) => Some(target.to_string()),
            None => {
                self.force_logout(request, session, "no landing page for user level");
                None
            }
        }
    }

    /// Resolves the landing page of a stored user level.
    #[must_use]
    pub fn landing_page(&self, level: &str) -> Option<&str> {
        let landing = &self.config.landing;
        let path = match UserLevel::from_str(level).ok()? {
            UserLevel::Admin => &landing.admin,
            UserLevel::Reseller => &landing.reseller,
            UserLevel::Client => &landing.client,
        };
        (!path.is_empty()).then_some(path.as_str())
    }

    fn force_logout(&self, request: &GateRequest, session: &mut Session, reason: &str) {
        if let Some(identity) = session.logout() {
            tracing::warn!(user = %identity.user_name, level = %identity.level, reason, "forcing logout");
            Event::builder(EventType::ForcedLogout)
                .failure(reason)
                .user(identity.user_name)
                .ip_address(request.client)
                .session(session.id)
                .emit();
        }
    }

    fn layout(&self, title: &str, context_class: &'static str, messages: PageMessages) -> Layout {
        let branding = &self.config.branding;
        let tr = self.translator.as_ref();
        Layout {
            page_title: tr.tr_args(title, &[&branding.long_name]),
            context_class,
            product_long_name: tr.tr(&branding.long_name),
            product_link: branding.link.clone(),
            product_copyright: tr.tr(&branding.copyright),
            charset: branding.charset.clone(),
            messages,
        }
    }

    fn maintenance_view(&self, messages: PageMessages) -> View {
        let tr = self.translator.as_ref();
        View {
            layout: self.layout("%s / Maintenance", "box_message", messages),
            page: Page::Maintenance(MaintenancePage {
                title: tr.tr("System under maintenance"),
                message_lines: self
                    .config
                    .maintenance
                    .message
                    .lines()
                    .map(str::to_string)
                    .collect(),
                back_label: tr.tr("Administrator login"),
                back_destination: ADMIN_LOGIN_PATH,
            }),
        }
    }

    fn login_view(&self, request: &GateRequest, messages: PageMessages) -> View {
        let tr = self.translator.as_ref();
        View {
            layout: self.layout("%s / Login", "login", messages),
            page: Page::Login(LoginPage {
                action: if request.admin { ADMIN_LOGIN_PATH } else { "/" }.to_string(),
                tr_login: tr.tr("Login"),
                tr_username: tr.tr("Username"),
                tr_password: tr.tr("Password"),
                tr_phpmyadmin: tr.tr("phpMyAdmin"),
                tr_login_into_pma: tr.tr("Login into phpMyAdmin"),
                pma_link: "/pma",
                tr_webmail: tr.tr("Webmail"),
                tr_login_into_webmail: tr.tr("Login into the webmail"),
                webmail_link: "/webmail",
                tr_filemanager: tr.tr("FileManager"),
                tr_login_into_fmanager: tr.tr("Login into the filemanager"),
                ftp_link: "/ftp",
                ssl: self.ssl_link(request),
                lost_password: self
                    .config
                    .lost_password
                    .then(|| tr.tr("Lost password")),
            }),
        }
    }

    /// Builds the link switching to the other scheme, when SSL support is
    /// enabled.
    fn ssl_link(&self, request: &GateRequest) -> Option<SslLink> {
        if !self.config.ssl_enabled {
            return None;
        }
        let tr = self.translator.as_ref();
        let link = if request.https {
            SslLink {
                link: format!("http://{}", request.host),
                image_class: "i_unlock",
                label: tr.tr("Normal connection"),
                description: tr.tr("Use normal connection (No SSL)"),
            }
        } else {
            SslLink {
                link: format!("https://{}", request.host),
                image_class: "i_lock",
                label: tr.tr("Secure connection"),
                description: tr.tr("Use secure connection (SSL)"),
            }
        };
        Some(link)
    }
}
