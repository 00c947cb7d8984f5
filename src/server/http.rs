//! HTTP endpoints for authorization and webhooks
//!
//! The router exposes the surface a Pusher-compatible client library and the
//! service itself talk to:
//!
//! - `POST <auth_path>`: channel authorization, single or batched
//! - `POST /events/channel_existence`
//! - `POST /events/presence`
//! - `POST /events/client`
//!
//! Nest the router under a prefix (e.g. `/pusher`) to namespace the whole
//! surface. Everything protocol-level lives in the core modules; this layer
//! only translates forms, headers, and status codes.

use crate::auth::{AuthBroker, AuthError};
use crate::config::Credentials;
use crate::signing::Signer;
use crate::webhooks::{WebhookError, WebhookKind, Webhooks};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routing configuration for the mounted endpoints
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Path the authorization endpoint is served at. Must begin with `/`.
    pub auth_path: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            auth_path: "/auth".to_string(),
        }
    }
}

/// Shared state for the extension: credentials, the signer derived from
/// them, and the two request-serving cores.
#[derive(Clone)]
pub struct Countersign {
    pub credentials: Arc<Credentials>,
    pub signer: Arc<Signer>,
    pub broker: Arc<AuthBroker>,
    pub webhooks: Arc<Webhooks>,
}

impl Countersign {
    pub fn new(credentials: Credentials) -> Self {
        let signer = Arc::new(Signer::new(
            credentials.key.clone(),
            credentials.secret.as_bytes(),
        ));
        Self {
            credentials: Arc::new(credentials),
            signer: signer.clone(),
            broker: Arc::new(AuthBroker::new(signer.clone())),
            webhooks: Arc::new(Webhooks::new(signer)),
        }
    }

    /// The public application key, safe to embed in pages and clients
    pub fn key(&self) -> &str {
        self.signer.key()
    }

    /// Register the authorization predicate, called as
    /// `predicate(channel_name, socket_id)`
    pub fn auth<F>(&self, predicate: F)
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.broker.set_predicate(predicate);
    }

    /// Register the presence channel-data provider, called as
    /// `provider(channel_name, socket_id)`
    pub fn channel_data<F>(&self, provider: F)
    where
        F: Fn(&str, &str) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.broker.set_channel_data(provider);
    }

    /// Build the extension router with default paths
    pub fn router(&self) -> Router {
        create_router(self.clone())
    }

    /// Build the extension router with a custom authorization path
    pub fn router_with_config(&self, config: RouterConfig) -> Router {
        create_router_with_config(self.clone(), config)
    }
}

/// Create the extension router with default paths
pub fn create_router(ext: Countersign) -> Router {
    create_router_with_config(ext, RouterConfig::default())
}

/// Create the extension router, serving authorization at `config.auth_path`.
/// Webhook endpoints are always served at `/events/<kind>`.
pub fn create_router_with_config(ext: Countersign, config: RouterConfig) -> Router {
    Router::new()
        .route(&config.auth_path, post(auth_handler))
        .route("/events/channel_existence", post(channel_existence_handler))
        .route("/events/presence", post(presence_handler))
        .route("/events/client", post(client_handler))
        .with_state(ext)
}

async fn auth_handler(
    State(ext): State<Countersign>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if !ext.broker.is_configured() {
        warn!("authorization request received before a predicate was registered");
        return StatusCode::FORBIDDEN.into_response();
    }

    let socket_id = match form.get("socket_id").map(String::as_str) {
        Some(socket_id) if !socket_id.is_empty() => socket_id,
        _ => return StatusCode::BAD_REQUEST.into_response(),
    };

    match form.get("channel_name").map(String::as_str) {
        Some(channel_name) if !channel_name.is_empty() => {
            match ext.broker.authorize(socket_id, channel_name) {
                Ok(auth) => {
                    debug!(channel = %channel_name, socket_id = %socket_id, "subscription authorized");
                    (StatusCode::OK, Json(auth)).into_response()
                }
                Err(err) => {
                    debug!(channel = %channel_name, socket_id = %socket_id, error = %err, "subscription refused");
                    auth_error_status(&err).into_response()
                }
            }
        }
        _ => {
            let channels = indexed_channel_names(&form);
            match ext.broker.authorize_batch(socket_id, &channels) {
                Ok(batch) => {
                    debug!(socket_id = %socket_id, channels = channels.len(), "batch authorized");
                    (StatusCode::OK, Json(batch)).into_response()
                }
                Err(err) => {
                    debug!(socket_id = %socket_id, error = %err, "batch refused");
                    auth_error_status(&err).into_response()
                }
            }
        }
    }
}

/// Collect `channel_name[0]`, `channel_name[1]`, ... until the first index
/// that is missing or empty. Gaps end the walk, so only a contiguous
/// zero-based run is accepted.
fn indexed_channel_names(form: &HashMap<String, String>) -> Vec<String> {
    let mut channels = Vec::new();
    loop {
        let key = format!("channel_name[{}]", channels.len());
        match form.get(&key) {
            Some(name) if !name.is_empty() => channels.push(name.clone()),
            _ => break,
        }
    }
    channels
}

fn auth_error_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::NotConfigured | AuthError::Denied(_) => StatusCode::FORBIDDEN,
        AuthError::UnknownChannelKind(_) => StatusCode::NOT_FOUND,
        AuthError::EmptyBatch => StatusCode::BAD_REQUEST,
    }
}

async fn channel_existence_handler(
    State(ext): State<Countersign>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    dispatch_webhook(&ext, WebhookKind::ChannelExistence, &headers, &body)
}

async fn presence_handler(
    State(ext): State<Countersign>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    dispatch_webhook(&ext, WebhookKind::Presence, &headers, &body)
}

async fn client_handler(State(ext): State<Countersign>, headers: HeaderMap, body: Bytes) -> Response {
    dispatch_webhook(&ext, WebhookKind::Client, &headers, &body)
}

fn dispatch_webhook(
    ext: &Countersign,
    kind: WebhookKind,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let key = headers.get("x-pusher-key").and_then(|v| v.to_str().ok());
    let signature = headers.get("x-pusher-signature").and_then(|v| v.to_str().ok());

    match ext.webhooks.handle(kind, key, signature, body) {
        Ok(()) => {
            debug!(kind = %kind, "webhook delivered");
            (StatusCode::OK, "OK").into_response()
        }
        Err(err) => {
            warn!(kind = %kind, error = %err, "webhook rejected");
            webhook_error_status(&err).into_response()
        }
    }
}

fn webhook_error_status(err: &WebhookError) -> StatusCode {
    match err {
        WebhookError::NoHandler(_) => StatusCode::NOT_FOUND,
        WebhookError::InvalidKey | WebhookError::InvalidSignature => StatusCode::FORBIDDEN,
    }
}

/// Serve the extension router on its own listener
pub async fn run_http_server(bind_addr: SocketAddr, ext: Countersign) -> std::io::Result<()> {
    let app = create_router(ext);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "authorization server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
