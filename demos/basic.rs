//! Minimal gitiles-http example: a fake repository browser that fails in
//! every way the error pages know about.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:8080/kernel/+log          # 200
//!   curl -i http://localhost:8080/nope/+log            # 404, X-Gitiles-Error: REPOSITORY_NOT_FOUND
//!   curl -i http://localhost:8080/kernel/+show/dead    # 400, X-Gitiles-Error: AMBIGUOUS_OBJECT
//!   curl -i http://localhost:8080/kernel/+archive      # 403, X-Gitiles-Error: SERVICE_NOT_ENABLED
//!   curl -i http://localhost:8080/kernel/+upload       # 503, service's own message
//!   curl -i http://localhost:8080/kernel/+blame/a.c    # 500, logged at WARN

use std::io;

use gitiles_http::{
    AmbiguousObject, ErrorHandling, Failure, FailureReason, HtmlRenderer, RepositoryNotFound,
    Request, RequestFailure, Response, Router, Server, ServiceMayNotContinue,
};
use http::{Method, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .on(Method::GET, "/{repo}/+log",          log)
        .on(Method::GET, "/{repo}/+show/{rev}",   show)
        .on(Method::GET, "/{repo}/+archive",      archive)
        .on(Method::GET, "/{repo}/+upload",       upload)
        .on(Method::GET, "/{repo}/+blame/{*path}", blame);

    let errors = ErrorHandling::builder()
        .render_data("siteTitle", "Gitiles demo")
        .build(HtmlRenderer);

    if let Err(e) = Server::bind("0.0.0.0:8080").error_handling(errors).serve(app).await {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}

fn repo(req: &Request) -> Result<&str, Failure> {
    match req.param("repo") {
        Some("kernel") => Ok("kernel"),
        Some(name) => Err(RepositoryNotFound::new(name).into()),
        None => Err(FailureReason::IncorrectParameter.into()),
    }
}

// GET /{repo}/+log
async fn log(req: Request) -> Result<Response, Failure> {
    let name = repo(&req)?;
    Ok(Response::text(format!("log of {name}\n")))
}

// GET /{repo}/+show/{rev}: short revisions are ambiguous
async fn show(req: Request) -> Result<Response, Failure> {
    repo(&req)?;
    let rev = req.param("rev").unwrap_or_default();
    if rev.len() < 7 {
        let candidates = vec![format!("{rev}0a1b2c"), format!("{rev}9f8e7d")];
        return Err(AmbiguousObject::new(rev, candidates).into());
    }
    Ok(Response::text(format!("commit {rev}\n")))
}

// GET /{repo}/+archive
async fn archive(req: Request) -> Result<Response, Failure> {
    repo(&req)?;
    Err(RequestFailure::new(FailureReason::ServiceNotEnabled)
        .with_public_message("Forbidden")
        .into())
}

// GET /{repo}/+upload
async fn upload(req: Request) -> Result<Response, Failure> {
    repo(&req)?;
    Err(ServiceMayNotContinue::new("Too many concurrent uploads")
        .with_status(StatusCode::SERVICE_UNAVAILABLE)
        .into())
}

// GET /{repo}/+blame/{*path}
async fn blame(req: Request) -> Result<Response, Failure> {
    repo(&req)?;
    Err(io::Error::other("pack index truncated").into())
}
