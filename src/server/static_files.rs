//! Static file serving with `start()`/`stop()` lifecycle.
//!
//! Request paths resolve, in order, to the exact file, the directory's index
//! file, `<path>.html`, then `<path>.htm`. Anything else gets the site's
//! `404.html` (if present) with a 404 status.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::SiteConfig;
use crate::error::ServerError;

/// Shared state for the file handler.
#[derive(Debug, Clone)]
pub struct SiteState {
    root: PathBuf,
    index: String,
}

impl SiteState {
    pub fn new(root: PathBuf, index: impl Into<String>) -> Self {
        Self {
            root,
            index: index.into(),
        }
    }
}

/// Router serving every path from the site root.
pub fn router(state: SiteState) -> Router {
    Router::new()
        .fallback(site_handler)
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

async fn site_handler(State(state): State<Arc<SiteState>>, uri: Uri) -> Response {
    serve_site_file(&state, uri.path()).await
}

async fn serve_site_file(state: &SiteState, request_path: &str) -> Response {
    let relative = match urlencoding::decode(request_path.trim_start_matches('/')) {
        Ok(p) => p.into_owned(),
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid path").into_response(),
    };

    let root = match state.root.canonicalize() {
        Ok(p) => p,
        Err(_) => return (StatusCode::NOT_FOUND, "Not found").into_response(),
    };

    let requested = root.join(&relative);
    let candidates = [
        requested.clone(),
        requested.join(&state.index),
        with_extension_appended(&requested, "html"),
        with_extension_appended(&requested, "htm"),
    ];

    for candidate in &candidates {
        // Path traversal guard
        let Ok(canonical) = candidate.canonicalize() else {
            continue;
        };
        if !canonical.starts_with(&root) {
            return (StatusCode::FORBIDDEN, "Forbidden").into_response();
        }
        if canonical.is_file() {
            return file_response(StatusCode::OK, &canonical).await;
        }
    }

    let not_found = root.join("404.html");
    if wants_page(&relative) && not_found.is_file() {
        return file_response(StatusCode::NOT_FOUND, &not_found).await;
    }
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

async fn file_response(status: StatusCode, path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(contents) => {
            let mime = mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string();
            (status, [(header::CONTENT_TYPE, mime)], contents).into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Page requests have no extension or an `.html`/`.htm` one; assets do not
/// get the site's 404 page.
fn wants_page(relative: &str) -> bool {
    match Path::new(relative).extension().and_then(|e| e.to_str()) {
        None => true,
        Some(ext) => ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"),
    }
}

fn with_extension_appended(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// A static file server that can be started and stopped.
///
/// Stopped means there is no running handle; `stop()` on a stopped server
/// does nothing.
pub struct StaticServer {
    config: SiteConfig,
    running: Mutex<Option<RunningServer>>,
}

impl StaticServer {
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Address the server is listening on, if running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.addr)
    }

    /// Start serving. Resolves once the listener is bound.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().await;
        if let Some(server) = running.as_ref() {
            return Err(ServerError::AlreadyRunning(server.addr));
        }

        let root = &self.config.dir;
        check_content_root(root).await?;

        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port))
                .await
                .map_err(|e| ServerError::Bind {
                    addr: self.config.addr(),
                    reason: e.to_string(),
                })?;
        let bound = listener.local_addr()?;

        let app = router(SiteState::new(root.clone(), &self.config.index));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    tracing::debug!("Static server shutting down");
                })
                .await
            {
                tracing::error!("Static server error: {}", e);
            }
        });

        tracing::info!(
            root = %root.display(),
            "Static server has started listening at http://{}/",
            bound
        );

        *running = Some(RunningServer {
            addr: bound,
            shutdown_tx,
            task,
        });
        Ok(bound)
    }

    /// Stop serving and wait for the listener to close.
    pub async fn stop(&self) {
        let Some(server) = self.running.lock().await.take() else {
            return;
        };

        tracing::info!("Closing the static server on {}", server.addr);
        let _ = server.shutdown_tx.send(());
        if let Err(e) = server.task.await {
            tracing::warn!("Static server task ended abnormally: {}", e);
        }
    }
}

async fn check_content_root(root: &Path) -> Result<(), ServerError> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServerError::ContentRootMissing(root.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    if entries.next_entry().await?.is_none() {
        return Err(ServerError::ContentRootEmpty(root.to_path_buf()));
    }
    Ok(())
}
