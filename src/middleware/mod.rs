//! Middleware layer.
//!
//! A middleware receives the request and a [`Next`] handle to the rest of
//! the chain. It decides whether and how to continue, and what to make of the
//! [`Outcome`](crate::handler::Outcome) that comes back.
//!
//! Built-in middleware:
//! - [`ErrorHandling`]: turns failures into HTML error pages

mod error_handling;

pub use error_handling::{
    classify, ClassifiedFailure, ErrorHandling, ErrorHandlingBuilder, FailureKind, GITILES_ERROR,
};

use crate::handler::{BoxedHandler, Handler, Outcome};
use crate::request::Request;

/// The remainder of the handling chain.
pub struct Next {
    endpoint: BoxedHandler,
}

impl Next {
    /// Continues into a single handler. Mostly useful in tests.
    pub fn handler(handler: impl Handler) -> Self {
        Self { endpoint: handler.into_boxed_handler() }
    }

    pub(crate) fn new(endpoint: BoxedHandler) -> Self {
        Self { endpoint }
    }

    /// Runs the rest of the chain to completion.
    pub async fn run(self, req: Request) -> Outcome {
        self.endpoint.call(req).await
    }
}
