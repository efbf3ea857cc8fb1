//! Failure signals raised by handlers.
//!
//! Handlers return `Result<_, Failure>`. [`Failure`] is closed: every variant
//! is one kind the error-handling middleware knows how to translate, plus
//! [`Failure::Io`] and [`Failure::Protocol`] for everything else.
//!
//! Kinds may also arrive wrapped: a [`RequestFailure`] tunnelled through an
//! `io::Error`, a [`RepositoryNotFound`] boxed as a protocol error. The
//! middleware looks through the cause chain with [`Failure::find`], so the
//! wrapping does not change how a failure is classified.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use http::StatusCode;

use crate::reason::FailureReason;

/// Boxed error used for protocol-level failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Everything a handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error(transparent)]
    Request(#[from] RequestFailure),

    #[error(transparent)]
    RepositoryNotFound(#[from] RepositoryNotFound),

    #[error(transparent)]
    AmbiguousObject(#[from] AmbiguousObject),

    #[error(transparent)]
    ServiceMayNotContinue(#[from] ServiceMayNotContinue),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("protocol: {0}")]
    Protocol(BoxError),
}

impl Failure {
    /// Wraps any other error as a protocol-level failure.
    pub fn protocol(err: impl Into<BoxError>) -> Self {
        Self::Protocol(err.into())
    }

    /// Finds the first `T` in this failure or its cause chain.
    ///
    /// `io::Error` hides its payload from `source()`, so custom I/O errors are
    /// unwrapped with `get_ref()` on the way down. A nested `Failure` is
    /// opened up the same way, through its variant payload.
    pub fn find<T: StdError + 'static>(&self) -> Option<&T> {
        let mut current = Some(self.payload());
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<T>() {
                return Some(found);
            }
            current = if let Some(nested) = err.downcast_ref::<Failure>() {
                Some(nested.payload())
            } else if let Some(inner) = err.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
                Some(inner as &(dyn StdError + 'static))
            } else {
                err.source()
            };
        }
        None
    }

    fn payload(&self) -> &(dyn StdError + 'static) {
        match self {
            Self::Request(e)               => e,
            Self::RepositoryNotFound(e)    => e,
            Self::AmbiguousObject(e)       => e,
            Self::ServiceMayNotContinue(e) => e,
            Self::Io(e)                    => e,
            Self::Protocol(e)              => &**e,
        }
    }
}

impl From<http::Error> for Failure {
    fn from(e: http::Error) -> Self {
        Self::protocol(e)
    }
}

impl From<hyper::Error> for Failure {
    fn from(e: hyper::Error) -> Self {
        Self::protocol(e)
    }
}

// ── RequestFailure ────────────────────────────────────────────────────────────

/// An explicit failure carrying its own [`FailureReason`].
///
/// ```rust
/// use gitiles_http::{FailureReason, RequestFailure};
///
/// let failure = RequestFailure::new(FailureReason::ServiceNotEnabled)
///     .with_public_message("Forbidden");
/// assert_eq!(failure.public_message(), "Forbidden");
/// ```
#[derive(Debug, thiserror::Error)]
pub struct RequestFailure {
    reason: FailureReason,
    public_message: Option<String>,
    #[source]
    cause: Option<BoxError>,
}

impl RequestFailure {
    pub fn new(reason: FailureReason) -> Self {
        Self { reason, public_message: None, cause: None }
    }

    /// Replaces the reason's message. Whatever goes here is shown to the
    /// caller verbatim.
    pub fn with_public_message(mut self, message: impl Into<String>) -> Self {
        self.public_message = Some(message.into());
        self
    }

    /// Attaches the underlying error. It is never shown to the caller.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn reason(&self) -> FailureReason {
        self.reason
    }

    pub fn public_message(&self) -> &str {
        self.public_message.as_deref().unwrap_or(self.reason.message())
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.public_message())
    }
}

impl From<FailureReason> for RequestFailure {
    fn from(reason: FailureReason) -> Self {
        Self::new(reason)
    }
}

impl From<FailureReason> for Failure {
    fn from(reason: FailureReason) -> Self {
        Self::Request(RequestFailure::new(reason))
    }
}

// ── Repository / object resolution ────────────────────────────────────────────

/// The named repository does not exist, or is not visible to the caller.
#[derive(Debug, thiserror::Error)]
#[error("repository not found: {name}")]
pub struct RepositoryNotFound {
    pub name: String,
}

impl RepositoryNotFound {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An abbreviated object id matched more than one object.
#[derive(Debug, thiserror::Error)]
#[error("ambiguous object abbreviation {abbreviation}: {} candidates", .candidates.len())]
pub struct AmbiguousObject {
    pub abbreviation: String,
    pub candidates: Vec<String>,
}

impl AmbiguousObject {
    pub fn new(abbreviation: impl Into<String>, candidates: Vec<String>) -> Self {
        Self { abbreviation: abbreviation.into(), candidates }
    }
}

// ── ServiceMayNotContinue ─────────────────────────────────────────────────────

/// A downstream service refused to continue and chose its own status and
/// message. Both are passed to the caller as-is.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ServiceMayNotContinue {
    status: StatusCode,
    message: String,
}

impl ServiceMayNotContinue {
    /// Defaults to `403 Forbidden`.
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: StatusCode::FORBIDDEN, message: message.into() }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
