//! The failure-reason taxonomy and the status table built from it.
//!
//! ```text
//! FailureReason ── identifier ──▶ X-Gitiles-Error
//!               ── status     ──▶ ReasonTable (overridable at startup)
//!               ── message    ──▶ {"title": …}
//! ```

use std::collections::HashMap;
use std::fmt;

use http::StatusCode;

/// Every reason a request can fail with a known, user-safe explanation.
///
/// The identifier, default status, and message are fixed at compile time.
/// Statuses can be remapped per deployment through [`ReasonTable`]; messages
/// cannot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FailureReason {
    AmbiguousObject,
    BlameRegionNotFound,
    CannotParseGitilesView,
    IncorrectParameter,
    IncorrectObjectType,
    MarkdownNotEnabled,
    NotAuthorized,
    NotFound,
    ObjectNotFound,
    ObjectTooLarge,
    RepositoryNotFound,
    ServiceNotEnabled,
    UnsupportedGitwebUrl,
    UnsupportedObjectType,
    UnsupportedResponseFormat,
    UnsupportedRevisionNames,
    InternalServerError,
}

impl FailureReason {
    /// Stable identifier sent in the `X-Gitiles-Error` header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AmbiguousObject           => "AMBIGUOUS_OBJECT",
            Self::BlameRegionNotFound       => "BLAME_REGION_NOT_FOUND",
            Self::CannotParseGitilesView    => "CANNOT_PARSE_GITILES_VIEW",
            Self::IncorrectParameter        => "INCORRECT_PARAMETER",
            Self::IncorrectObjectType       => "INCORRECT_OBJECT_TYPE",
            Self::MarkdownNotEnabled        => "MARKDOWN_NOT_ENABLED",
            Self::NotAuthorized             => "NOT_AUTHORIZED",
            Self::NotFound                  => "NOT_FOUND",
            Self::ObjectNotFound            => "OBJECT_NOT_FOUND",
            Self::ObjectTooLarge            => "OBJECT_TOO_LARGE",
            Self::RepositoryNotFound        => "REPOSITORY_NOT_FOUND",
            Self::ServiceNotEnabled         => "SERVICE_NOT_ENABLED",
            Self::UnsupportedGitwebUrl      => "UNSUPPORTED_GITWEB_URL",
            Self::UnsupportedObjectType     => "UNSUPPORTED_OBJECT_TYPE",
            Self::UnsupportedResponseFormat => "UNSUPPORTED_RESPONSE_FORMAT",
            Self::UnsupportedRevisionNames  => "UNSUPPORTED_REVISION_NAMES",
            Self::InternalServerError       => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Status used when no [`ReasonTable`] override applies.
    pub fn default_status(self) -> StatusCode {
        match self {
            Self::AmbiguousObject           => StatusCode::BAD_REQUEST,
            Self::BlameRegionNotFound       => StatusCode::NOT_FOUND,
            Self::CannotParseGitilesView    => StatusCode::NOT_FOUND,
            Self::IncorrectParameter        => StatusCode::BAD_REQUEST,
            Self::IncorrectObjectType       => StatusCode::BAD_REQUEST,
            Self::MarkdownNotEnabled        => StatusCode::NOT_FOUND,
            Self::NotAuthorized             => StatusCode::UNAUTHORIZED,
            Self::NotFound                  => StatusCode::NOT_FOUND,
            Self::ObjectNotFound            => StatusCode::NOT_FOUND,
            Self::ObjectTooLarge            => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RepositoryNotFound        => StatusCode::NOT_FOUND,
            Self::ServiceNotEnabled         => StatusCode::FORBIDDEN,
            Self::UnsupportedGitwebUrl      => StatusCode::GONE,
            Self::UnsupportedObjectType     => StatusCode::NOT_FOUND,
            Self::UnsupportedResponseFormat => StatusCode::BAD_REQUEST,
            Self::UnsupportedRevisionNames  => StatusCode::BAD_REQUEST,
            Self::InternalServerError       => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Public-safe message. Never carries request-specific detail.
    pub fn message(self) -> &'static str {
        match self {
            Self::AmbiguousObject           => "Ambiguous Object",
            Self::BlameRegionNotFound       => "Blame Region Not Found",
            Self::CannotParseGitilesView    => "Cannot Parse Gitiles URL",
            Self::IncorrectParameter        => "Incorrect Parameter",
            Self::IncorrectObjectType       => "Incorrect Object Type",
            Self::MarkdownNotEnabled        => "Markdown Not Enabled",
            Self::NotAuthorized             => "Not Authorized",
            Self::NotFound                  => "Not Found",
            Self::ObjectNotFound            => "Object Not Found",
            Self::ObjectTooLarge            => "Object Too Large",
            Self::RepositoryNotFound        => "Not Found",
            Self::ServiceNotEnabled         => "Service Not Enabled",
            Self::UnsupportedGitwebUrl      => "Gitweb URL Not Supported",
            Self::UnsupportedObjectType     => "Unsupported Object Type",
            Self::UnsupportedResponseFormat => "Unsupported Response Format",
            Self::UnsupportedRevisionNames  => "Unsupported Revision Names",
            Self::InternalServerError       => "Internal Server Error",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ReasonTable ───────────────────────────────────────────────────────────────

/// Reason → status mapping, fixed once the middleware is built.
///
/// Starts from [`FailureReason::default_status`]; deployments that disagree
/// with a default (the ambiguous-object code is the usual one) override it
/// here instead of patching call sites.
#[derive(Clone, Debug, Default)]
pub struct ReasonTable {
    overrides: HashMap<FailureReason, StatusCode>,
}

impl ReasonTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `reason` to `status` instead of its default. Returns `self` for chaining.
    pub fn with_status(mut self, reason: FailureReason, status: StatusCode) -> Self {
        self.overrides.insert(reason, status);
        self
    }

    pub fn status(&self, reason: FailureReason) -> StatusCode {
        self.overrides
            .get(&reason)
            .copied()
            .unwrap_or_else(|| reason.default_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reason() {
        let table = ReasonTable::new();
        assert_eq!(table.status(FailureReason::RepositoryNotFound), StatusCode::NOT_FOUND);
        assert_eq!(table.status(FailureReason::AmbiguousObject), StatusCode::BAD_REQUEST);
        assert_eq!(
            table.status(FailureReason::InternalServerError),
            StatusCode::INTERNAL_SERVER_ERROR,
        );
    }

    #[test]
    fn override_replaces_only_its_reason() {
        let table = ReasonTable::new()
            .with_status(FailureReason::AmbiguousObject, StatusCode::CONFLICT);

        assert_eq!(table.status(FailureReason::AmbiguousObject), StatusCode::CONFLICT);
        assert_eq!(table.status(FailureReason::IncorrectParameter), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn identifier_is_the_display_form() {
        assert_eq!(FailureReason::ServiceNotEnabled.to_string(), "SERVICE_NOT_ENABLED");
        assert_eq!(FailureReason::RepositoryNotFound.message(), "Not Found");
    }
}
