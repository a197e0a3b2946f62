//! URL templates of the danceconvention.net event API.

use reqwest::Url;

use crate::error::InvalidBaseUrl;

/// Base URL used when no override is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://danceconvention.net/eventdirector/rest/";

/// Resolves request keys to API URLs.
///
/// Every key becomes exactly one percent-encoded path segment, so a key
/// containing `/` or `?` cannot change the path or query of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
    lang: Option<String>,
}

impl Endpoints {
    /// Creates endpoints rooted at `base_url`.
    ///
    /// A trailing slash on `base_url` is optional.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBaseUrl` unless `base_url` is an absolute `http` or
    /// `https` URL.
    pub fn new(base_url: &str) -> Result<Self, InvalidBaseUrl> {
        let invalid = |reason: String| InvalidBaseUrl {
            url: base_url.to_owned(),
            reason,
        };
        let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(invalid("expected an http or https URL".to_owned()));
        }
        Ok(Self { base, lang: None })
    }

    /// Adds a `?lang=` query to every URL. Empty strings are ignored.
    #[must_use]
    pub fn with_lang(mut self, lang: Option<String>) -> Self {
        self.lang = lang.filter(|l| !l.is_empty());
        self
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// The configured language, if any.
    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    /// `{base}eventinfo/{event_id}/contests`
    #[must_use]
    pub fn event_contests(&self, event_id: &str) -> String {
        self.build(&["eventinfo", event_id, "contests"])
    }

    /// `{base}eventinfo/{event_id}/signups`
    #[must_use]
    pub fn event_signups(&self, event_id: &str) -> String {
        self.build(&["eventinfo", event_id, "signups"])
    }

    /// `{base}eventinfo/signups/{contest_id}/{selection}`
    #[must_use]
    pub fn contest_signups(&self, contest_id: &str, selection: &str) -> String {
        self.build(&["eventinfo", "signups", contest_id, selection])
    }

    // `.` and `..` are dropped by the URL path setter; callers reject them.
    fn build(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if let Some(lang) = &self.lang {
            url.query_pairs_mut().append_pair("lang", lang);
        }
        url.into()
    }
}
