//! Development server with live reload via Server-Sent Events.
//!
//! Serves a directory through [`LiveReloadDir`], pushes change notifications
//! from the [`EventBus`] to connected pages, and shuts down when its
//! cancellation token fires.

use crate::dev::files;
use crate::dev::live_dir::{LiveReloadDir, LIVE_PATH};
use crate::dev::{DevConfig, EventBus, ListenAddr, Message};
use crate::error::{CliError, Result, ResultExt, ServerError};
use crate::ui;
use crate::watch::{FileWatcher, WatchDispatcher};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::{any, get},
    Router,
};
use std::convert::Infallible;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// How many consecutive ports are tried before giving up.
pub const PORT_SCAN_SPAN: u16 = 100;

const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// 1x1 PNG served for `/favicon.ico`.
const FAVICON: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
    0x77, 0x53, 0xde, 0x00, 0x00, 0x00, 0x01, 0x73, 0x52, 0x47, 0x42, 0x00, 0xae, 0xce, 0x1c,
    0xe9, 0x00, 0x00, 0x00, 0x04, 0x67, 0x41, 0x4d, 0x41, 0x00, 0x00, 0xb1, 0x8f, 0x0b, 0xfc,
    0x61, 0x05, 0x00, 0x00, 0x00, 0x09, 0x70, 0x48, 0x59, 0x73, 0x00, 0x00, 0x0e, 0xc4, 0x00,
    0x00, 0x0e, 0xc4, 0x01, 0x95, 0x2b, 0x0e, 0x1b, 0x00, 0x00, 0x00, 0x0c, 0x49, 0x44, 0x41,
    0x54, 0x08, 0xd7, 0x63, 0xf8,
];

/// Bind the first free port in `port..port + PORT_SCAN_SPAN` on the
/// address's bind host.
///
/// # Errors
///
/// [`ServerError::NoPortAvailable`] when every port in the window is taken.
pub async fn find_next_port(addr: &ListenAddr) -> Result<TcpListener, ServerError> {
    find_next_port_within(addr, PORT_SCAN_SPAN).await
}

/// [`find_next_port`] with an explicit window size.
pub async fn find_next_port_within(
    addr: &ListenAddr,
    span: u16,
) -> Result<TcpListener, ServerError> {
    let bind_host = addr.bind_host();
    let port = addr.port;
    let end = port.saturating_add(span.saturating_sub(1));

    for candidate in port..=end {
        match TcpListener::bind((bind_host, candidate)).await {
            Ok(listener) => {
                if candidate != port {
                    tracing::debug!(requested = port, bound = candidate, "requested port busy");
                }
                return Ok(listener);
            }
            Err(err) => tracing::trace!(port = candidate, %err, "bind failed"),
        }
    }

    Err(ServerError::NoPortAvailable {
        host: addr.host.clone(),
        start: port,
        end,
    })
}

#[derive(Clone)]
struct AppState {
    dir: Arc<LiveReloadDir>,
    bus: EventBus,
}

/// Build the router for `dir`.
///
/// `/favicon.ico` is always answered. [`LIVE_PATH`] streams bus messages only
/// when `dir` injects the reload client. Everything else is a static file.
pub fn build_router(dir: LiveReloadDir, bus: EventBus) -> Router {
    let live = dir.injects();
    let state = AppState {
        dir: Arc::new(dir),
        bus,
    };

    let mut router = Router::new().route("/favicon.ico", get(handle_favicon));
    if live {
        router = router.route(LIVE_PATH, get(handle_live));
    }

    router
        .route("/", any(handle_root))
        .route("/{*path}", any(handle_path))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_favicon() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], FAVICON)
}

/// Stream bus messages to one page until it disconnects or the bus closes.
async fn handle_live(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.bus.subscribe();
    tracing::debug!(id = subscription.id(), "live-reload client connected");

    let stream = subscription.map(|message| Ok(to_sse_event(&message)));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(SSE_KEEP_ALIVE).text("ping"))
}

/// Unnamed event so `EventSource.onmessage` fires; the data is informational.
fn to_sse_event(message: &Message) -> Event {
    Event::default().data(sse_data(message))
}

fn sse_data(message: &Message) -> String {
    serde_json::json!({
        "op": &*message.topic,
        "path": String::from_utf8_lossy(&message.payload),
    })
    .to_string()
}

async fn handle_root(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    serve_static(state, method, String::new(), uri, headers).await
}

async fn handle_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    serve_static(state, method, path, uri, headers).await
}

async fn serve_static(
    state: AppState,
    method: Method,
    rel: String,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
            "405 method not allowed\n",
        )
            .into_response();
    }

    let head = method == Method::HEAD;
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let raw_path = uri.path().to_owned();
    let dir = Arc::clone(&state.dir);

    let task = tokio::task::spawn_blocking(move || {
        files::respond(&dir, &rel, &raw_path, range.as_deref(), head)
    });
    match task.await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(%err, "static file task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Open `url` with the platform's default handler.
pub async fn open_browser(url: &str) -> io::Result<()> {
    let (program, args): (&str, Vec<&str>) = if cfg!(target_os = "macos") {
        ("open", vec![url])
    } else if cfg!(windows) {
        ("cmd", vec!["/C", "start", "", url])
    } else {
        ("xdg-open", vec![url])
    };

    let status = tokio::process::Command::new(program)
        .args(&args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("{program} exited with {status}")))
    }
}

/// Development server.
pub struct DevServer {
    config: DevConfig,
}

impl DevServer {
    pub fn new(config: DevConfig) -> Self {
        Self { config }
    }

    /// Bind, serve and (with live reload) watch until `cancel` fires or one of
    /// the tasks ends.
    ///
    /// The HTTP server and the watch pipeline run side by side; whichever
    /// finishes first cancels the other and its error, if any, is returned.
    /// Opening the browser is best effort and never ends the run.
    ///
    /// # Errors
    ///
    /// Startup failures (missing directory, no free port, watcher setup) and
    /// the first task error.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let config = self.config;
        config.validate()?;
        let root = std::fs::canonicalize(&config.root).with_path(&config.root)?;

        let listener = find_next_port(&config.listen).await?;
        let port = listener.local_addr()?.port();
        let url = config.listen.display_url(port);
        if port != config.listen.port {
            ui::warning(&format!(
                "Port {} is busy, using port {} instead",
                config.listen.port, port
            ));
        }

        let bus = EventBus::new();
        let router = build_router(LiveReloadDir::new(&root, config.live), bus.clone());
        let token = cancel.child_token();
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();

        let shutdown = {
            let token = token.clone();
            let bus = bus.clone();
            async move {
                token.cancelled().await;
                // Ends every SSE stream so graceful shutdown can finish.
                bus.close();
            }
        };
        tasks.spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
                .map_err(|e| CliError::from(ServerError::Serve(e)))
        });

        if config.live {
            let (watcher, batches) = FileWatcher::start(&root, config.debounce)?;
            let dispatcher = WatchDispatcher::publish(config.filter.clone(), bus.clone());
            let token = token.clone();
            tasks.spawn(async move {
                let _watcher = watcher;
                dispatcher.run(batches, token).await
            });
        }

        ui::success(&format!("Serving {} at {}", root.display(), url));

        if config.open {
            tokio::spawn(async move {
                if let Err(err) = open_browser(&url).await {
                    ui::warning(&format!("Could not open browser: {err}"));
                }
            });
        }

        let mut first: Option<Result<()>> = None;
        tokio::select! {
            _ = token.cancelled() => {}
            Some(joined) = tasks.join_next() => first = Some(flatten(joined)),
        }
        token.cancel();
        bus.close();

        while let Some(joined) = tasks.join_next().await {
            let result = flatten(joined);
            if first.is_none() || (matches!(first, Some(Ok(()))) && result.is_err()) {
                first = Some(result);
            }
        }

        tracing::debug!("dev server stopped");
        first.unwrap_or(Ok(()))
    }
}

fn flatten(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    joined.map_err(|e| CliError::Custom(format!("server task failed: {e}")))?
}
