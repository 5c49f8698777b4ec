// src/serve/proxy.rs

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use warp::http::{HeaderMap, Method, Response, StatusCode};
use warp::path::FullPath;
use warp::Filter;

use crate::config::ProxyConfig;
use crate::serve::TlsFiles;

/// Headers that belong to one hop and must not be forwarded in either
/// direction. `host` and `content-length` are recomputed by the client.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "proxy-connection",
    "keep-alive",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// One route from the config, compiled for serving: parsed upstream URL and
/// a dedicated client honouring the route's TLS-verification toggle.
pub struct CompiledRoute {
    pub prefix: String,
    pub target: reqwest::Url,
    pub headers: BTreeMap<String, String>,
    client: reqwest::Client,
}

/// Parse and compile the configured routes, longest prefix first.
pub fn compile_routes(cfg: &ProxyConfig) -> Result<Vec<CompiledRoute>> {
    let mut routes = Vec::with_capacity(cfg.route.len());

    for (prefix, route) in cfg.route.iter() {
        let target = reqwest::Url::parse(&route.host)
            .with_context(|| format!("invalid upstream host for route '{}'", prefix))?;
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(route.insecure_skip_verify)
            .build()
            .with_context(|| format!("building http client for route '{}'", prefix))?;

        routes.push(CompiledRoute {
            prefix: prefix.clone(),
            target,
            headers: route.headers.clone(),
            client,
        });
    }

    routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    Ok(routes)
}

/// Pick the route with the longest prefix matching `path`.
///
/// A prefix ending in `/` matches its whole subtree; a prefix without a
/// trailing slash matches the exact path or a subtree below it.
pub fn match_route<'a>(routes: &'a [CompiledRoute], path: &str) -> Option<&'a CompiledRoute> {
    routes.iter().find(|route| prefix_matches(&route.prefix, path))
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    if let Some(stripped) = prefix.strip_suffix('/') {
        return path.starts_with(prefix) || path == stripped;
    }
    path == prefix || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
}

/// Rewrite the incoming path for the upstream: strip the matched prefix and
/// keep a leading slash.
pub fn downstream_path(prefix: &str, path: &str) -> String {
    let trimmed = path
        .strip_prefix(prefix.trim_end_matches('/'))
        .unwrap_or(path);
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Serve the reverse proxy until `token` is cancelled.
pub async fn run_proxy(
    cfg: ProxyConfig,
    tls: Option<TlsFiles>,
    token: CancellationToken,
) -> Result<()> {
    let addr: SocketAddr = cfg
        .bind
        .parse()
        .with_context(|| format!("invalid proxy bind address '{}'", cfg.bind))?;

    let routes = Arc::new(compile_routes(&cfg)?);
    for route in routes.iter() {
        info!(prefix = %route.prefix, host = %route.target, "reverse proxy route");
    }

    let routes_filter = warp::any().map(move || Arc::clone(&routes));
    let handler = warp::filters::method::method()
        .and(warp::path::full())
        .and(raw_query())
        .and(warp::header::headers_cloned())
        .and(warp::body::bytes())
        .and(routes_filter)
        .and_then(handle_request);

    let shutdown = async move { token.cancelled().await };

    match tls {
        Some(tls) => {
            info!(addr = %addr, cert = %tls.cert.display(), "reverse proxy listening (tls)");
            let (_, server) = warp::serve(handler)
                .tls()
                .cert_path(&tls.cert)
                .key_path(&tls.key)
                .bind_with_graceful_shutdown(addr, shutdown);
            server.await;
        }
        None => {
            info!(addr = %addr, "reverse proxy listening");
            let (_, server) = warp::serve(handler).bind_with_graceful_shutdown(addr, shutdown);
            server.await;
        }
    }

    info!("reverse proxy shutdown");
    Ok(())
}

/// The raw query filter rejects requests without a query string; recover
/// those into an empty string.
fn raw_query() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::filters::query::raw()
        .or_else(|_| async { Ok::<(String,), warp::Rejection>((String::new(),)) })
}

async fn handle_request(
    method: Method,
    path: FullPath,
    query: String,
    headers: HeaderMap,
    body: warp::hyper::body::Bytes,
    routes: Arc<Vec<CompiledRoute>>,
) -> Result<Response<Vec<u8>>, warp::Rejection> {
    let Some(route) = match_route(&routes, path.as_str()) else {
        warn!(path = %path.as_str(), "no proxy route matches request");
        return Ok(status_response(StatusCode::NOT_FOUND, "no route"));
    };

    let mut url = route.target.clone();
    url.set_path(&downstream_path(&route.prefix, path.as_str()));
    if !query.is_empty() {
        url.set_query(Some(&query));
    }

    let upstream_method = match reqwest::Method::from_bytes(method.as_str().as_bytes()) {
        Ok(m) => m,
        Err(_) => return Ok(status_response(StatusCode::BAD_REQUEST, "unsupported method")),
    };

    let mut req = route.client.request(upstream_method, url.clone());
    for (name, value) in headers.iter() {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            req = req.header(name.as_str(), value);
        }
    }
    for (name, value) in route.headers.iter() {
        debug!(key = %name, value = %value, "reverse proxy add header");
        req = req.header(name.as_str(), value.as_str());
    }
    if !body.is_empty() {
        req = req.body(body.to_vec());
    }

    info!(
        prefix = %route.prefix,
        incoming = %path.as_str(),
        downstream = %url,
        "reverse proxy forward"
    );

    let upstream = match req.send().await {
        Ok(resp) => resp,
        Err(err) => {
            error!(prefix = %route.prefix, host = %route.target, error = %err, "upstream request failed");
            return Ok(status_response(StatusCode::BAD_GATEWAY, "bad gateway"));
        }
    };

    let mut response = Response::builder().status(upstream.status().as_u16());
    for (name, value) in upstream.headers().iter() {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            response = response.header(name.as_str(), value);
        }
    }

    let body = match upstream.bytes().await {
        Ok(body) => body.to_vec(),
        Err(err) => {
            error!(prefix = %route.prefix, error = %err, "reading upstream body failed");
            return Ok(status_response(StatusCode::BAD_GATEWAY, "bad gateway"));
        }
    };

    match response.body(body) {
        Ok(resp) => Ok(resp),
        Err(err) => {
            error!(error = %err, "assembling proxy response failed");
            Ok(status_response(StatusCode::BAD_GATEWAY, "bad gateway"))
        }
    }
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.contains(&name)
}

fn status_response(status: StatusCode, msg: &str) -> Response<Vec<u8>> {
    let mut res = Response::new(msg.as_bytes().to_vec());
    *res.status_mut() = status;
    res
}
