//! Failure → HTTP error page.
//!
//! [`ErrorHandling`] sits at the outer edge of the chain. Successful
//! responses pass through untouched. A [`Failure`] is classified against a
//! fixed, ordered taxonomy; the first matching kind picks the status, the
//! public message, and the `X-Gitiles-Error` identifier:
//!
//! | Kind | Status | Message | `X-Gitiles-Error` |
//! |---|---|---|---|
//! | [`RequestFailure`] | its reason's status | its public message | its reason |
//! | [`RepositoryNotFound`] | 404 | `Not Found` | `REPOSITORY_NOT_FOUND` |
//! | [`AmbiguousObject`] | 400 | `Ambiguous Object` | `AMBIGUOUS_OBJECT` |
//! | [`ServiceMayNotContinue`] | its own | its own | — |
//! | anything else | 500 | `Internal Server Error` | — |
//!
//! Kinds are matched through the cause chain, so order matters: a
//! `RequestFailure` caused by a missing repository reports the
//! `RequestFailure`. Only the last row is logged; its public message says
//! nothing, so the log is the only place the detail survives.

use std::sync::Arc;

use http::header::{self, HeaderName, HeaderValue};
use http::StatusCode;
use tracing::warn;

use super::Next;
use crate::failure::{AmbiguousObject, Failure, RepositoryNotFound, RequestFailure, ServiceMayNotContinue};
use crate::reason::{FailureReason, ReasonTable};
use crate::render::{HtmlRenderer, RenderData, RenderError, RenderRequest, Renderer, ERROR_PAGE};
use crate::request::{Request, RequestHead};
use crate::response::{ContentType, Response};

/// Response header carrying the failure reason identifier.
pub const GITILES_ERROR: HeaderName = HeaderName::from_static("x-gitiles-error");

/// Which row of the taxonomy a failure matched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    Request,
    RepositoryNotFound,
    AmbiguousObject,
    ServiceMayNotContinue,
    Internal,
}

/// Status, message, and identifier chosen for one failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassifiedFailure {
    pub kind: FailureKind,
    pub status: StatusCode,
    pub message: String,
    pub diagnostic: Option<&'static str>,
}

impl ClassifiedFailure {
    fn from_reason(kind: FailureKind, reason: FailureReason, table: &ReasonTable) -> Self {
        Self {
            kind,
            status: table.status(reason),
            message: reason.message().to_owned(),
            diagnostic: Some(reason.as_str()),
        }
    }
}

/// Classifies `failure`. Depends only on the failure and the table.
pub fn classify(failure: &Failure, table: &ReasonTable) -> ClassifiedFailure {
    if let Some(explicit) = failure.find::<RequestFailure>() {
        return ClassifiedFailure {
            kind: FailureKind::Request,
            status: table.status(explicit.reason()),
            message: explicit.public_message().to_owned(),
            diagnostic: Some(explicit.reason().as_str()),
        };
    }
    if failure.find::<RepositoryNotFound>().is_some() {
        return ClassifiedFailure::from_reason(
            FailureKind::RepositoryNotFound,
            FailureReason::RepositoryNotFound,
            table,
        );
    }
    if failure.find::<AmbiguousObject>().is_some() {
        return ClassifiedFailure::from_reason(
            FailureKind::AmbiguousObject,
            FailureReason::AmbiguousObject,
            table,
        );
    }
    if let Some(abort) = failure.find::<ServiceMayNotContinue>() {
        return ClassifiedFailure {
            kind: FailureKind::ServiceMayNotContinue,
            status: abort.status(),
            message: abort.message().to_owned(),
            diagnostic: None,
        };
    }

    let reason = FailureReason::InternalServerError;
    ClassifiedFailure {
        kind: FailureKind::Internal,
        status: table.status(reason),
        message: reason.message().to_owned(),
        diagnostic: None,
    }
}

// ── ErrorHandling ─────────────────────────────────────────────────────────────

/// The error-translation middleware.
///
/// ```rust
/// use gitiles_http::{ErrorHandling, FailureReason, HtmlRenderer};
/// use http::StatusCode;
///
/// let errors = ErrorHandling::builder()
///     .status(FailureReason::AmbiguousObject, StatusCode::CONFLICT)
///     .render_data("siteTitle", "Gitiles")
///     .build(HtmlRenderer);
/// # let _ = errors;
/// ```
pub struct ErrorHandling {
    renderer: Arc<dyn Renderer>,
    reasons: ReasonTable,
    base_data: RenderData,
}

impl ErrorHandling {
    /// Default reason table, no base render data.
    pub fn new(renderer: impl Renderer) -> Self {
        Self::builder().build(renderer)
    }

    pub fn builder() -> ErrorHandlingBuilder {
        ErrorHandlingBuilder { reasons: ReasonTable::new(), base_data: RenderData::new() }
    }

    pub fn reasons(&self) -> &ReasonTable {
        &self.reasons
    }

    /// Runs `next` and translates a failure into an error page.
    ///
    /// A renderer error is returned as-is; the caller owns the fallback.
    pub async fn handle(&self, req: Request, next: Next) -> Result<Response, RenderError> {
        let head = Arc::clone(req.head());

        match next.run(req).await {
            Ok(res) => Ok(res),
            Err(failure) => self.translate(&head, failure),
        }
    }

    /// Error page for a failure raised before the chain could run, such as an
    /// unreadable request body.
    pub(crate) fn translate(
        &self,
        head: &RequestHead,
        failure: Failure,
    ) -> Result<Response, RenderError> {
        let classified = classify(&failure, &self.reasons);
        if classified.kind == FailureKind::Internal {
            warn!(
                method = %head.method(),
                path = head.path(),
                error = %failure,
                detail = ?failure,
                "internal server error"
            );
        }

        self.error_page(head, classified)
    }

    fn error_page(
        &self,
        head: &RequestHead,
        classified: ClassifiedFailure,
    ) -> Result<Response, RenderError> {
        let mut res = Response::status(classified.status);
        if let Some(id) = classified.diagnostic {
            res.headers_mut().insert(GITILES_ERROR, HeaderValue::from_static(id));
        }
        start_html_response(&mut res);

        let mut data = self.base_data.clone();
        data.merge(RenderData::new().with("title", classified.message));
        self.renderer.render(head, &mut res, RenderRequest::new(ERROR_PAGE, data))?;
        Ok(res)
    }
}

impl Default for ErrorHandling {
    fn default() -> Self {
        Self::new(HtmlRenderer)
    }
}

/// HTML, UTF-8, and never cached: an error page must not be stored under the
/// URL of the page that failed.
fn start_html_response(res: &mut Response) {
    let headers = res.headers_mut();
    headers.insert(header::CONTENT_TYPE, ContentType::Html.header_value());
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, max-age=0, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("Mon, 01 Jan 1990 00:00:00 GMT"));
}

/// Startup configuration for [`ErrorHandling`].
pub struct ErrorHandlingBuilder {
    reasons: ReasonTable,
    base_data: RenderData,
}

impl ErrorHandlingBuilder {
    /// Maps `reason` to `code` instead of its default status.
    pub fn status(mut self, reason: FailureReason, code: StatusCode) -> Self {
        self.reasons = self.reasons.with_status(reason, code);
        self
    }

    /// Replaces the whole reason table.
    pub fn reasons(mut self, reasons: ReasonTable) -> Self {
        self.reasons = reasons;
        self
    }

    /// Data passed to every error page. `title` is always overwritten.
    pub fn render_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.base_data.insert(key, value);
        self
    }

    pub fn build(self, renderer: impl Renderer) -> ErrorHandling {
        ErrorHandling {
            renderer: Arc::new(renderer),
            reasons: self.reasons,
            base_data: self.base_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rstest::rstest;

    use super::*;

    fn explicit_forbidden() -> Failure {
        RequestFailure::new(FailureReason::ServiceNotEnabled)
            .with_public_message("Forbidden")
            .into()
    }

    #[rstest]
    #[case::explicit(explicit_forbidden(), 403, "Forbidden", Some("SERVICE_NOT_ENABLED"))]
    #[case::repository(
        RepositoryNotFound::new("kernel").into(),
        404, "Not Found", Some("REPOSITORY_NOT_FOUND")
    )]
    #[case::ambiguous(
        AmbiguousObject::new("deadbe", vec!["deadbeef01".into(), "deadbeef02".into()]).into(),
        400, "Ambiguous Object", Some("AMBIGUOUS_OBJECT")
    )]
    #[case::service_abort(
        ServiceMayNotContinue::new("Too many clients")
            .with_status(StatusCode::SERVICE_UNAVAILABLE)
            .into(),
        503, "Too many clients", None
    )]
    #[case::io(io::Error::other("disk full").into(), 500, "Internal Server Error", None)]
    #[case::protocol(Failure::protocol("bad chunk size"), 500, "Internal Server Error", None)]
    fn classifies_each_kind(
        #[case] failure: Failure,
        #[case] status: u16,
        #[case] message: &str,
        #[case] diagnostic: Option<&str>,
    ) {
        let classified = classify(&failure, &ReasonTable::new());

        assert_eq!(classified.status.as_u16(), status);
        assert_eq!(classified.message, message);
        assert_eq!(classified.diagnostic, diagnostic);
    }

    #[rstest]
    #[case::explicit_over_repository(
        Failure::from(
            RequestFailure::new(FailureReason::ObjectNotFound)
                .with_cause(RepositoryNotFound::new("kernel")),
        ),
        FailureKind::Request
    )]
    #[case::repository_inside_io(
        Failure::Io(io::Error::other(RepositoryNotFound::new("kernel"))),
        FailureKind::RepositoryNotFound
    )]
    #[case::abort_inside_protocol(
        Failure::protocol(ServiceMayNotContinue::new("quota exceeded")),
        FailureKind::ServiceMayNotContinue
    )]
    #[case::repository_boxed_as_protocol(
        Failure::protocol(Failure::from(RepositoryNotFound::new("kernel"))),
        FailureKind::RepositoryNotFound
    )]
    #[case::explicit_failure_inside_io(
        Failure::Io(io::Error::other(Failure::from(FailureReason::ObjectNotFound))),
        FailureKind::Request
    )]
    #[case::ambiguous_two_layers_deep(
        Failure::Io(io::Error::other(Failure::protocol(Failure::from(
            AmbiguousObject::new("ab", Vec::new()),
        )))),
        FailureKind::AmbiguousObject
    )]
    #[case::plain_io(Failure::Io(io::Error::other("broken pipe")), FailureKind::Internal)]
    fn first_matching_kind_wins(#[case] failure: Failure, #[case] kind: FailureKind) {
        assert_eq!(classify(&failure, &ReasonTable::new()).kind, kind);
    }

    #[test]
    fn classification_is_repeatable() {
        let failure = Failure::from(RepositoryNotFound::new("kernel"));
        let table = ReasonTable::new();

        assert_eq!(classify(&failure, &table), classify(&failure, &table));
    }

    #[test]
    fn table_overrides_apply_to_reason_backed_kinds() {
        let table = ReasonTable::new()
            .with_status(FailureReason::AmbiguousObject, StatusCode::CONFLICT)
            .with_status(FailureReason::InternalServerError, StatusCode::SERVICE_UNAVAILABLE);

        let ambiguous = Failure::from(AmbiguousObject::new("ab", Vec::new()));
        let internal = Failure::protocol("reset by peer");

        assert_eq!(classify(&ambiguous, &table).status, StatusCode::CONFLICT);
        assert_eq!(classify(&internal, &table).status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn request_content_does_not_leak_into_the_message() {
        let failure = Failure::from(RepositoryNotFound::new("secret/internal-repo"));
        let classified = classify(&failure, &ReasonTable::new());

        assert!(!classified.message.contains("secret"));
    }
}
