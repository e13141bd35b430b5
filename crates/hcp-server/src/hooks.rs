//! Extension points around the login page lifecycle.
//!
//! Hooks are called in registration order:
//!
//! 1. [`LoginHook::on_start`] before any session or credential handling;
//! 2. [`LoginHook::before_render`] with the view about to be rendered;
//! 3. [`LoginHook::on_end`] with the rendered page, before it is sent.
//!
//! Redirect responses only see `on_start`.

use crate::gate::GateRequest;
use crate::view::{RenderedPage, View};

/// Observer of the login page lifecycle.
pub trait LoginHook: Send + Sync {
    /// Called when a request reaches the login gate.
    fn on_start(&self, _request: &GateRequest) {}

    /// Called with the view before it is rendered; may add or change data.
    fn before_render(&self, _view: &mut View) {}

    /// Called with the rendered page; may rewrite the document.
    fn on_end(&self, _page: &mut RenderedPage) {}
}
