//! Prometheus exposition format support.
//!
//! This module renders a [`MetricSet`] in the Prometheus text-based exposition
//! format and serves it over HTTP. Every request to the metrics path runs the
//! [`MetricAssembler`] against the current cache state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use statuswatch_sdk::Exporter;
//! use statuswatch_sdk::prometheus::PrometheusConfig;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = PrometheusConfig::builder()
//!         .listen_addr("0.0.0.0:8080")
//!         .metrics_path("/metrics")
//!         .build();
//!
//!     let exporter = Exporter::builder().build();
//!     let _refresh = exporter.start();
//!
//!     // Metrics available at http://localhost:8080/metrics
//!     exporter.serve(&config).await?.run().await
//! }
//! ```

use std::convert::Infallible;
use std::fmt::Write as _;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::assembler::{MetricAssembler, MetricKind, MetricSet};

/// Content type of the text exposition format.
pub const CONTENT_TYPE_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Configuration for the Prometheus metrics endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrometheusConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Path for metrics endpoint (e.g., "/metrics")
    pub metrics_path: String,
    /// Optional namespace prefix for all metrics
    pub namespace: Option<String>,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            metrics_path: "/metrics".to_string(),
            namespace: None,
        }
    }
}

impl PrometheusConfig {
    /// Create a new builder for PrometheusConfig.
    pub fn builder() -> PrometheusConfigBuilder {
        PrometheusConfigBuilder::default()
    }
}

/// Builder for PrometheusConfig.
#[derive(Debug, Default)]
pub struct PrometheusConfigBuilder {
    listen_addr: Option<String>,
    metrics_path: Option<String>,
    namespace: Option<String>,
}

impl PrometheusConfigBuilder {
    /// Set the listen address.
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the metrics path.
    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    /// Set the namespace prefix for all metrics.
    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = Some(ns.into());
        self
    }

    /// Build the PrometheusConfig.
    pub fn build(self) -> PrometheusConfig {
        let defaults = PrometheusConfig::default();
        PrometheusConfig {
            listen_addr: self.listen_addr.unwrap_or(defaults.listen_addr),
            metrics_path: self.metrics_path.unwrap_or(defaults.metrics_path),
            namespace: self.namespace.filter(|ns| !ns.is_empty()),
        }
    }
}

/// Request handling shared by every connection.
#[derive(Debug)]
struct Endpoint {
    metrics_path: String,
    namespace: Option<String>,
    assembler: Arc<MetricAssembler>,
}

impl Endpoint {
    async fn respond(&self, path: &str) -> Response<Full<Bytes>> {
        if path == self.metrics_path {
            let set = self.assembler.collect().await;
            let body = format_prometheus(&set, self.namespace.as_deref());
            text_response(StatusCode::OK, CONTENT_TYPE_TEXT, body)
        } else if path == "/health" || path == "/healthz" {
            text_response(StatusCode::OK, "text/plain", "OK")
        } else {
            text_response(StatusCode::NOT_FOUND, "text/plain", "Not Found")
        }
    }
}

fn text_response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// HTTP server exposing the assembled metrics.
#[derive(Debug)]
pub struct PrometheusServer {
    listener: TcpListener,
    endpoint: Arc<Endpoint>,
}

impl PrometheusServer {
    /// Bind the listener described by `config`.
    ///
    /// Binding happens eagerly so that an unusable address is reported to
    /// the caller instead of inside a background task.
    pub async fn bind(config: &PrometheusConfig, assembler: Arc<MetricAssembler>) -> io::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr.as_str()).await?;
        let endpoint = Arc::new(Endpoint {
            metrics_path: config.metrics_path.clone(),
            namespace: config.namespace.clone(),
            assembler,
        });

        Ok(Self { listener, endpoint })
    }

    /// The address the server is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the task is cancelled.
    pub async fn run(self) -> io::Result<()> {
        info!(
            addr = %self.local_addr()?,
            path = %self.endpoint.metrics_path,
            "serving metrics"
        );

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let endpoint = self.endpoint.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let endpoint = endpoint.clone();
                    async move { Ok::<_, Infallible>(endpoint.respond(req.uri().path()).await) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(%peer, error = %e, "metrics connection error");
                }
            });
        }
    }

    /// Run the server on a background task.
    pub fn start(self) -> tokio::task::JoinHandle<io::Result<()>> {
        tokio::spawn(self.run())
    }
}

/// Format a metric set as Prometheus exposition format.
///
/// Families are written in [`MetricKind::ALL`] order, each preceded by its
/// `# HELP` and `# TYPE` lines. Families without samples are omitted.
pub fn format_prometheus(set: &MetricSet, namespace: Option<&str>) -> String {
    let mut output = String::new();
    let prefix = namespace.map(|n| format!("{}_", n)).unwrap_or_default();

    for kind in MetricKind::ALL {
        let mut samples = set.of_kind(kind).peekable();
        if samples.peek().is_none() {
            continue;
        }

        let name = kind.name();
        let _ = writeln!(output, "# HELP {}{} {}", prefix, name, kind.help());
        let _ = writeln!(output, "# TYPE {}{} gauge", prefix, name);

        for sample in samples {
            let labels = sample
                .label_pairs()
                .map(|(name, value)| format!("{}=\"{}\"", name, escape_label_value(value)))
                .collect::<Vec<_>>()
                .join(",");
            let _ = writeln!(output, "{}{}{{{}}} {}", prefix, name, labels, sample.value);
        }
    }

    output
}

/// Check a metric namespace against the Prometheus name rules,
/// `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_namespace(namespace: &str) -> bool {
    let mut chars = namespace.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Escape a label value for Prometheus format.
/// Backslash, double-quote, and newline must be escaped.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
