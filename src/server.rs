//! HTTP server and graceful shutdown.
//!
//! Every request runs through the same chain:
//!
//! ```text
//! hyper ─▶ dispatch ─▶ ErrorHandling ─▶ Router ─▶ handler
//!                          ▲                          │
//!                          └──── Result<_, Failure> ◀─┘
//! ```
//!
//! A request body that cannot be read never reaches the router; it is handed
//! to `ErrorHandling` directly and gets the internal-error page. If the error
//! page itself cannot be rendered, the server answers with a bare `500` and
//! logs the render error. Nothing reaches hyper as an error.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or Ctrl-C the server stops accepting, lets every in-flight
//! connection finish, then returns from [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Error;
use crate::failure::Failure;
use crate::handler::BoxedHandler;
use crate::middleware::{ErrorHandling, Next};
use crate::render::RenderError;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: String,
    errors: ErrorHandling,
}

impl Server {
    /// Configures the server to bind to `addr` (`host:port`) when
    /// [`serve`](Server::serve) is called.
    ///
    /// ```rust,no_run
    /// use gitiles_http::Server;
    /// let server = Server::bind("0.0.0.0:8080");
    /// ```
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), errors: ErrorHandling::default() }
    }

    /// Replaces the default error handling (built-in HTML renderer, default
    /// reason table).
    pub fn error_handling(mut self, errors: ErrorHandling) -> Self {
        self.errors = errors;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let addr: SocketAddr = self.addr.parse().map_err(|source| Error::Addr {
            addr: self.addr.clone(),
            source,
        })?;
        let listener = TcpListener::bind(addr).await?;

        let app = Arc::new(App { router: Arc::new(router), errors: self.errors });

        info!(%addr, "gitiles-http listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even with connections queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("gitiles-http stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

struct App {
    router: Arc<Router>,
    errors: ErrorHandling,
}

async fn dispatch(
    app: Arc<App>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => Err(Failure::from(e)),
    };
    Ok(respond(&app, parts, body).await.into_inner())
}

/// Runs one request through the chain. A body that could not be read is a
/// failure like any other and gets the same error page.
async fn respond(app: &App, parts: http::request::Parts, body: Result<Bytes, Failure>) -> Response {
    let rendered = match body {
        Ok(body) => {
            let req = Request::from(http::Request::from_parts(parts, body));
            let next = Next::new(Arc::clone(&app.router) as BoxedHandler);
            app.errors.handle(req, next).await
        }
        Err(failure) => {
            let req = Request::from(http::Request::from_parts(parts, Bytes::new()));
            app.errors.translate(req.head(), failure)
        }
    };
    or_fallback(rendered)
}

fn or_fallback(rendered: Result<Response, RenderError>) -> Response {
    rendered.unwrap_or_else(|e| {
        error!("error page failed to render: {e}");
        Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .text("Internal Server Error")
    })
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT. If a handler cannot be
/// installed, that signal is logged and ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::Mutex;

    use http::{header, Method};
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::render::{RenderRequest, Renderer};
    use crate::request::RequestHead;

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, _: &RequestHead, _: &mut Response, r: RenderRequest) -> Result<(), RenderError> {
            Err(RenderError::UnknownTemplate(r.template))
        }
    }

    #[derive(Clone, Default)]
    struct Logs(Arc<Mutex<Vec<u8>>>);

    impl Logs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for Logs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Logs {
        type Writer = Logs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs() -> (Logs, tracing::subscriber::DefaultGuard) {
        let logs = Logs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    async fn log(_: Request) -> Result<Response, Failure> {
        Ok(Response::text("log"))
    }

    fn app(errors: ErrorHandling) -> App {
        App { router: Arc::new(Router::new().on(Method::GET, "/{repo}/+log", log)), errors }
    }

    fn parts(uri: &str) -> http::request::Parts {
        http::Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn routes_through_error_handling() {
        let app = app(ErrorHandling::default());

        let ok = respond(&app, parts("/kernel/+log"), Ok(Bytes::new())).await;
        assert_eq!(ok.status_code(), StatusCode::OK);
        assert_eq!(ok.body(), b"log");

        let miss = respond(&app, parts("/kernel/+refs"), Ok(Bytes::new())).await;
        assert_eq!(miss.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(miss.header(crate::GITILES_ERROR), Some("NOT_FOUND"));
    }

    #[tokio::test]
    async fn unreadable_body_gets_the_internal_error_page() {
        let (logs, _guard) = capture_logs();
        let app = app(ErrorHandling::default());
        let body = Err(Failure::from(io::Error::other("connection reset mid-body")));

        let res = respond(&app, parts("/kernel/+log"), body).await;

        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.header(header::CONTENT_TYPE), Some("text/html; charset=utf-8"));
        assert_eq!(res.header(header::PRAGMA), Some("no-cache"));
        assert!(std::str::from_utf8(res.body()).unwrap().contains("<h1>Internal Server Error</h1>"));

        let logs = logs.contents();
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("connection reset mid-body"), "{logs}");
        assert!(logs.contains("/kernel/+log"), "{logs}");
    }

    #[tokio::test]
    async fn render_failure_falls_back_to_plain_text() {
        let (logs, _guard) = capture_logs();
        let app = app(ErrorHandling::new(FailingRenderer));

        let res = respond(&app, parts("/missing"), Ok(Bytes::new())).await;

        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.header(header::CONTENT_TYPE), Some("text/plain; charset=utf-8"));
        assert_eq!(res.header(crate::GITILES_ERROR), None);
        assert_eq!(res.body(), b"Internal Server Error");

        let logs = logs.contents();
        assert!(logs.contains("ERROR"), "{logs}");
        assert!(logs.contains("error page failed to render: unknown template `error-page`"), "{logs}");
    }
}
