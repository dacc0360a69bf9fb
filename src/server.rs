// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.

use crate::config::Config;
use crate::{metrics, mounts, probe};
use anyhow::{Context, Result, anyhow};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};

static NOTFOUND: &[u8] = b"Not found";
static INDEX: &[u8] = br#"<html>
  <head><title>File system liveness exporter</title></head>
  <body>
    <h1>File system liveness exporter</h1>
    <p><a href="/metrics">Metrics</a></p>
  </body>
</html>"#;

type ResponseBody = BoxBody<Bytes, std::io::Error>;

fn full(bytes: Bytes) -> ResponseBody {
    Full::new(bytes).map_err(|e| match e {}).boxed()
}

/// One scrape: discover candidate mounts, probe all of them concurrently,
/// render the results. Discovery failure is fatal to the whole cycle (there
/// is no meaningful partial result without a mount list) and surfaces as a
/// 500; per-mount probe failures are contained to that mount's series.
async fn handle_metrics(config: &Config) -> Result<Response<ResponseBody>> {
    let mounts = mounts::discover(&config.mounts_file, &config.fs_types)?;
    let results = probe::run_cycle(mounts, &config.probe).await;
    let body = metrics::render(&results);

    Response::builder()
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(full(Bytes::from(body)))
        .map_err(|e| anyhow!("failed to build metrics response: {e}"))
}

fn index() -> Result<Response<ResponseBody>> {
    Response::builder()
        .header("Content-Type", "text/html")
        .body(full(Bytes::from_static(INDEX)))
        .map_err(|e| anyhow!("failed to build index response: {e}"))
}

fn not_found() -> Result<Response<ResponseBody>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(full(Bytes::from_static(NOTFOUND)))
        .map_err(|e| anyhow!("failed to build not found response: {e}"))
}

fn internal_error() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(full(Bytes::from_static(b"Internal Server Error")))
        .unwrap_or_else(|_| Response::new(full(Bytes::from_static(b"Error"))))
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    config: &Config,
) -> Result<Response<ResponseBody>> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => handle_metrics(config).await,
        (&Method::GET, "/") => index(),
        _ => {
            info!(
                "{} request to unknown endpoint: {}",
                req.method(),
                req.uri().path()
            );
            not_found()
        }
    }
}

/// Serve `/metrics` until SIGTERM or SIGINT. Each connection runs on its own
/// task; an in-flight probe cycle always runs to completion.
pub async fn run(config: Config) -> Result<()> {
    let listener = TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_address))?;
    let local_addr = listener
        .local_addr()
        .context("failed to read bound address")?;
    info!("serving metrics on http://{local_addr}/metrics");

    let mut sigterm = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let config = Arc::new(config);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = accepted.context("failed to accept connection")?;
                let io = TokioIo::new(stream);
                let config = Arc::clone(&config);

                tokio::task::spawn(async move {
                    let service = service_fn(move |req| {
                        let config = Arc::clone(&config);
                        async move {
                            Ok::<_, anyhow::Error>(handle_request(req, &config).await.unwrap_or_else(
                                |err| {
                                    error!("request handling failed: {err:#}");
                                    internal_error()
                                },
                            ))
                        }
                    });
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("error serving connection: {err}");
                    }
                });
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                return Ok(());
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                return Ok(());
            }
        }
    }
}
