//! Login and maintenance views.
//!
//! The gate builds a [`View`] (layout data plus exactly one page) and hands
//! it to a [`Renderer`]. [`AskamaRenderer`] renders the bundled templates.

use askama::Template;
use thiserror::Error;

use crate::message::PageMessages;

/// Rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template engine failure.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// A custom renderer could not handle the view.
    #[error("unsupported view: {0}")]
    Unsupported(&'static str),
}

/// Data shared by every page layout.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Document title.
    pub page_title: String,
    /// CSS class of the content area.
    pub context_class: &'static str,
    /// Long product name.
    pub product_long_name: String,
    /// Product homepage.
    pub product_link: String,
    /// Copyright line.
    pub product_copyright: String,
    /// Document character set.
    pub charset: String,
    /// Page messages.
    pub messages: PageMessages,
}

/// SSL switch link shown on the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslLink {
    /// Target URL on the other scheme.
    pub link: String,
    /// Lock icon class.
    pub image_class: &'static str,
    /// Link label.
    pub label: String,
    /// Link description.
    pub description: String,
}

/// Login form page.
#[derive(Debug, Clone)]
pub struct LoginPage {
    /// Form action URL.
    pub action: String,
    /// Form heading.
    pub tr_login: String,
    /// User name label.
    pub tr_username: String,
    /// Password label.
    pub tr_password: String,
    /// phpMyAdmin link label.
    pub tr_phpmyadmin: String,
    /// phpMyAdmin link description.
    pub tr_login_into_pma: String,
    /// phpMyAdmin URL.
    pub pma_link: &'static str,
    /// Webmail link label.
    pub tr_webmail: String,
    /// Webmail link description.
    pub tr_login_into_webmail: String,
    /// Webmail URL.
    pub webmail_link: &'static str,
    /// File manager link label.
    pub tr_filemanager: String,
    /// File manager link description.
    pub tr_login_into_fmanager: String,
    /// File manager URL.
    pub ftp_link: &'static str,
    /// SSL switch link, when SSL support is enabled.
    pub ssl: Option<SslLink>,
    /// Lost password link label, when the feature is enabled.
    pub lost_password: Option<String>,
}

/// Maintenance notice page.
#[derive(Debug, Clone)]
pub struct MaintenancePage {
    /// Notice heading.
    pub title: String,
    /// Notice text, one entry per line.
    pub message_lines: Vec<String>,
    /// Back button label.
    pub back_label: String,
    /// Back button target.
    pub back_destination: &'static str,
}

/// The page part of a view.
#[derive(Debug, Clone)]
pub enum Page {
    /// Login form.
    Login(LoginPage),
    /// Maintenance notice.
    Maintenance(MaintenancePage),
}

/// A complete view: layout data and one page.
#[derive(Debug, Clone)]
pub struct View {
    /// Layout data.
    pub layout: Layout,
    /// Page data.
    pub page: Page,
}

impl View {
    /// Returns the view name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self.page {
            Page::Login(_) => "login",
            Page::Maintenance(_) => "maintenance",
        }
    }

    /// Returns the login page, if this is the login view.
    #[must_use]
    pub const fn as_login(&self) -> Option<&LoginPage> {
        match &self.page {
            Page::Login(page) => Some(page),
            Page::Maintenance(_) => None,
        }
    }

    /// Checks if this is the maintenance view.
    #[must_use]
    pub const fn is_maintenance(&self) -> bool {
        matches!(self.page, Page::Maintenance(_))
    }
}

/// A rendered view.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// The view that was rendered.
    pub view: View,
    /// The HTML document.
    pub document: String,
}

/// Turns a view into an HTML document.
pub trait Renderer: Send + Sync {
    /// Renders `view`.
    ///
    /// # Errors
    ///
    /// Returns an error if the view cannot be rendered.
    fn render(&self, view: &View) -> Result<String, RenderError>;
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    layout: &'a Layout,
    page: &'a LoginPage,
    ssl: Option<&'a SslLink>,
    lost_password: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "box.html")]
struct MaintenanceTemplate<'a> {
    layout: &'a Layout,
    page: &'a MaintenancePage,
}

/// Renders views with the bundled askama templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct AskamaRenderer;

impl Renderer for AskamaRenderer {
    fn render(&self, view: &View) -> Result<String, RenderError> {
        let html = match &view.page {
            Page::Login(page) => LoginTemplate {
                layout: &view.layout,
                page,
                ssl: page.ssl.as_ref(),
                lost_password: page.lost_password.as_deref(),
            }
            .render()?,
            Page::Maintenance(page) => MaintenanceTemplate {
                layout: &view.layout,
                page,
            }
            .render()?,
        };
        Ok(html)
    }
}
