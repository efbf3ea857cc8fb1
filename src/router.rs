//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A path that matches no
//! route is a [`FailureReason::NotFound`] failure, translated like any other.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::failure::Failure;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
use crate::reason::FailureReason;
use crate::request::Request;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each [`Router::on`] call returns `self` so registrations chain naturally.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use gitiles_http::{Failure, Request, Response, Router};
    /// # use http::Method;
    /// # async fn log(_: Request) -> Result<Response, Failure> { Ok(Response::text("")) }
    /// # async fn show(_: Request) -> Result<Response, Failure> { Ok(Response::text("")) }
    /// Router::new()
    ///     .on(Method::GET, "/{repo}/+log",         log)
    ///     .on(Method::GET, "/{repo}/+show/{*rev}", show);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics on an invalid or conflicting route. Routes are fixed at startup,
    /// so this is a programming error rather than a runtime condition.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl ErasedHandler for Router {
    fn call(&self, mut req: Request) -> BoxFuture {
        match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.params = params;
                handler.call(req)
            }
            None => Box::pin(async { Err(Failure::from(FailureReason::NotFound)) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::failure::RequestFailure;
    use crate::response::Response;

    async fn log(req: Request) -> Result<Response, Failure> {
        Ok(Response::text(format!("log of {}", req.param("repo").unwrap_or("?"))))
    }

    fn request(method: Method, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .map(Request::from)
            .unwrap()
    }

    #[tokio::test]
    async fn dispatches_with_params() {
        let router = Router::new().on(Method::GET, "/{repo}/+log", log);

        let res = router.call(request(Method::GET, "/kernel/+log")).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"log of kernel");
    }

    #[tokio::test]
    async fn miss_is_a_not_found_failure() {
        let router = Router::new().on(Method::GET, "/{repo}/+log", log);

        for (method, path) in [(Method::GET, "/kernel/+refs"), (Method::POST, "/kernel/+log")] {
            let failure = router.call(request(method, path)).await.unwrap_err();
            let reason = failure.find::<RequestFailure>().map(RequestFailure::reason);
            assert_eq!(reason, Some(FailureReason::NotFound));
        }
    }
}
