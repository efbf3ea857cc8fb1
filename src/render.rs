//! Page rendering seam.
//!
//! The error-handling middleware decides *what* an error page says; a
//! [`Renderer`] decides what it looks like. Swap in a real template engine by
//! implementing the trait; [`HtmlRenderer`] is the minimal built-in.

use std::collections::BTreeMap;

use crate::request::RequestHead;
use crate::response::Response;

/// Template name for error pages.
pub const ERROR_PAGE: &str = "error-page";

/// Key → value data handed to a template.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RenderData(BTreeMap<String, String>);

impl RenderData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`. Returns `self` for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Overlays `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: RenderData) {
        self.0.extend(other.0);
    }
}

/// One render call: which template, with what data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenderRequest {
    pub template: String,
    pub data: RenderData,
}

impl RenderRequest {
    pub fn new(template: impl Into<String>, data: RenderData) -> Self {
        Self { template: template.into(), data }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown template `{0}`")]
    UnknownTemplate(String),

    #[error("template `{template}` requires `{key}`")]
    MissingData { template: String, key: &'static str },
}

/// Writes a complete response body for a template.
///
/// Status and headers are already set when `render` is called; a renderer
/// only fills in the body (and may add headers of its own).
pub trait Renderer: Send + Sync + 'static {
    fn render(
        &self,
        req: &RequestHead,
        res: &mut Response,
        request: RenderRequest,
    ) -> Result<(), RenderError>;
}

// ── HtmlRenderer ──────────────────────────────────────────────────────────────

/// Built-in renderer: a bare HTML page for [`ERROR_PAGE`].
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(
        &self,
        _req: &RequestHead,
        res: &mut Response,
        request: RenderRequest,
    ) -> Result<(), RenderError> {
        if request.template != ERROR_PAGE {
            return Err(RenderError::UnknownTemplate(request.template));
        }
        let Some(title) = request.data.get("title") else {
            return Err(RenderError::MissingData { template: request.template, key: "title" });
        };

        let title = escape(title);
        res.set_body(format!(
            "<!DOCTYPE html>\n<html>\n<head><title>{title}</title></head>\n\
             <body><h1>{title}</h1></body>\n</html>\n"
        ));
        Ok(())
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&'  => out.push_str("&amp;"),
            '<'  => out.push_str("&lt;"),
            '>'  => out.push_str("&gt;"),
            '"'  => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c    => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::request::Request;

    fn head() -> Arc<RequestHead> {
        let req = Request::from(http::Request::new(Bytes::new()));
        Arc::clone(req.head())
    }

    #[test]
    fn renders_escaped_title() {
        let mut res = Response::status(http::StatusCode::NOT_FOUND);
        let data = RenderData::new().with("title", "<Not> Found & \"gone\"");

        HtmlRenderer.render(&head(), &mut res, RenderRequest::new(ERROR_PAGE, data)).unwrap();

        let body = std::str::from_utf8(res.body()).unwrap();
        assert!(body.contains("<h1>&lt;Not&gt; Found &amp; &quot;gone&quot;</h1>"));
        assert!(!body.contains("<Not>"));
    }

    #[test]
    fn rejects_unknown_template() {
        let mut res = Response::status(http::StatusCode::OK);
        let err = HtmlRenderer
            .render(&head(), &mut res, RenderRequest::new("log-detail", RenderData::new()))
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownTemplate(name) if name == "log-detail"));
    }

    #[test]
    fn requires_a_title() {
        let mut res = Response::status(http::StatusCode::OK);
        let err = HtmlRenderer
            .render(&head(), &mut res, RenderRequest::new(ERROR_PAGE, RenderData::new()))
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingData { key: "title", .. }));
    }

    #[test]
    fn merge_prefers_the_overlay() {
        let mut base = RenderData::new().with("title", "base").with("siteTitle", "Gitiles");
        base.merge(RenderData::new().with("title", "Not Found"));

        assert_eq!(base.get("title"), Some("Not Found"));
        assert_eq!(base.get("siteTitle"), Some("Gitiles"));
        assert_eq!(base, RenderData::new().with("siteTitle", "Gitiles").with("title", "Not Found"));
    }
}
