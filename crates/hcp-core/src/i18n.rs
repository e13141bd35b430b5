//! Message translation.
//!
//! Pages ask a [`Translator`] for every user-visible string. Keys are the
//! English source strings, so a translator that knows nothing returns the
//! key unchanged.

use std::collections::HashMap;
use std::fmt::Display;

/// Translates user-visible strings.
pub trait Translator: Send + Sync {
    /// Returns the localized form of `key`, or `key` itself when unknown.
    fn tr(&self, key: &str) -> String;

    /// Translates `key` and substitutes `%d` / `%s` placeholders in order.
    fn tr_args(&self, key: &str, args: &[&dyn Display]) -> String {
        substitute(&self.tr(key), args)
    }
}

/// In-memory message catalog for one locale.
#[derive(Debug, Default)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds translations from key/value pairs.
    #[must_use]
    pub fn with_messages<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.messages
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

impl Translator for Catalog {
    fn tr(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Replaces `%d` and `%s` placeholders with `args`, left to right.
///
/// Surplus placeholders are kept verbatim; surplus arguments are ignored.
fn substitute(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("%d") || tail.starts_with("%s") {
            match args.next() {
                Some(arg) => out.push_str(&arg.to_string()),
                None => out.push_str(&tail[..2]),
            }
            rest = &tail[2..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
