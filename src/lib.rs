//! # gitiles-http
//!
//! The error-translation stage of a Gitiles-style HTTP front end, plus the
//! small hyper server it runs in.
//!
//! ## The contract
//!
//! Handlers return `Result<impl IntoResponse, Failure>`. [`Failure`] is a
//! closed set: an explicit [`RequestFailure`] with its own
//! [`FailureReason`], a missing repository, an ambiguous object id, a
//! service that refused to continue, or anything else (I/O, protocol).
//!
//! [`ErrorHandling`] turns each of those into an HTML error page with:
//!
//! - the status from the reason table (or the service's own status)
//! - a public message that never carries request detail
//! - `X-Gitiles-Error: <REASON>` when the kind has a reason
//! - `Content-Type: text/html; charset=utf-8` and no-cache headers
//!
//! The catch-all is the only kind that is logged, at `WARN`, with full
//! detail. Page bodies come from a pluggable [`Renderer`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gitiles_http::{
//!     ErrorHandling, Failure, FailureReason, HtmlRenderer, Request, RepositoryNotFound,
//!     Response, Router, Server,
//! };
//! use http::{Method, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gitiles_http::Error> {
//!     let app = Router::new()
//!         .on(Method::GET, "/{repo}/+log", log);
//!
//!     let errors = ErrorHandling::builder()
//!         .status(FailureReason::AmbiguousObject, StatusCode::BAD_REQUEST)
//!         .build(HtmlRenderer);
//!
//!     Server::bind("0.0.0.0:8080").error_handling(errors).serve(app).await
//! }
//!
//! async fn log(req: Request) -> Result<Response, Failure> {
//!     match req.param("repo") {
//!         Some("kernel") => Ok(Response::text("commit 1f0e…")),
//!         Some(name) => Err(RepositoryNotFound::new(name).into()),
//!         None => Err(FailureReason::IncorrectParameter.into()),
//!     }
//! }
//! ```

mod error;
mod failure;
mod handler;
mod reason;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;
pub mod render;

pub use error::Error;
pub use failure::{
    AmbiguousObject, BoxError, Failure, RepositoryNotFound, RequestFailure, ServiceMayNotContinue,
};
pub use handler::{Handler, Outcome};
pub use middleware::{ClassifiedFailure, ErrorHandling, FailureKind, Next, GITILES_ERROR};
pub use reason::{FailureReason, ReasonTable};
pub use render::{HtmlRenderer, RenderData, RenderError, RenderRequest, Renderer};
pub use request::{Request, RequestHead};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
