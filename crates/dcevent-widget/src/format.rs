//! HTML rendering of signup lists.

use std::collections::HashMap;
use std::fmt::{self, Write};
use std::sync::Arc;

use dcevent_signups::domain::signup::Signup;

/// Post-processes the escaped text of one list item. The returned string is
/// inserted into the `<li>` as is.
pub type ItemHook = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Item hooks registered by the host, looked up by the name a container
/// gives in `data-format-hook`.
#[derive(Clone, Default)]
pub struct FormatHooks {
    hooks: HashMap<String, ItemHook>,
}

impl FormatHooks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hook` under `name`, replacing any previous hook of that name.
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Arc::new(hook));
        self
    }

    /// The hook registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ItemHook> {
        self.hooks.get(name)
    }
}

impl fmt::Debug for FormatHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FormatHooks").field("names", &names).finish()
    }
}

/// Renders signups as an ordered list, one `<li>` per signup:
///
/// `lastName firstName[, city][ – partnerLastName partnerFirstName[, partnerCity]]`
///
/// Returns an empty string for an empty list. Text is HTML-escaped.
#[must_use]
pub fn format_signups(signups: &[Signup]) -> String {
    format_signups_with(signups, None)
}

/// Like [`format_signups`], passing every item through `hook` first.
#[must_use]
pub fn format_signups_with(signups: &[Signup], hook: Option<&ItemHook>) -> String {
    if signups.is_empty() {
        return String::new();
    }
    let items: Vec<String> = signups
        .iter()
        .map(|signup| {
            let item = format_item(signup);
            match hook {
                Some(hook) => hook(item),
                None => item,
            }
        })
        .collect();
    format!("<ol>\n<li>{}</li>\n</ol>", items.join("</li>\n<li>"))
}

fn format_item(signup: &Signup) -> String {
    let mut item = format!(
        "{} {}",
        escape(&signup.last_name),
        escape(&signup.first_name)
    );
    if let Some(city) = signup.city.as_deref().filter(|c| !c.is_empty()) {
        let _ = write!(item, ", {}", escape(city));
    }
    if signup.has_partner() {
        let _ = write!(
            item,
            " \u{2013} {} {}",
            escape(signup.partner_last_name.as_deref().unwrap_or_default()),
            escape(signup.partner_first_name.as_deref().unwrap_or_default())
        );
        if let Some(city) = signup.partner_city.as_deref().filter(|c| !c.is_empty()) {
            let _ = write!(item, ", {}", escape(city));
        }
    }
    item
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
