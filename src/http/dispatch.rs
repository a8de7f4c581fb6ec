//! Per-request protocol dispatch.
//!
//! # Responsibilities
//! - Classify each inbound exchange (content-type x protocol version x path)
//! - Forward RPC traffic to the gRPC engine untouched
//! - Answer liveness probes and reject everything else locally
//!
//! Classification is a strict priority order: the RPC check always runs
//! before path matching, so the liveness path is unreachable to the RPC
//! engine even when content-type headers are spoofed. The same table applies
//! over cleartext h2c and over TLS; nothing here branches on the transport.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use crate::rpc::{self, pb::greeter_server::GreeterServer, GreeterService};

/// Well-known liveness path. GET, no query parameters, no body.
pub const HEALTH_PATH: &str = "/health";

/// Content-type prefix identifying RPC traffic.
const RPC_CONTENT_TYPE: &str = "application/grpc";

/// Routing decision derived per exchange; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// RPC content-type over the multiplexed HTTP/2 transport.
    Rpc,
    /// RPC content-type over anything other than HTTP/2.
    RpcWrongProtocol,
    /// Exact match on the liveness path, RPC ruled out.
    Liveness,
    /// Everything else.
    Unknown,
}

/// Classify an exchange by content-type, protocol version, and path.
pub fn classify<B>(req: &Request<B>) -> RequestClass {
    let is_rpc = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with(RPC_CONTENT_TYPE));

    if is_rpc {
        if req.version() == Version::HTTP_2 {
            RequestClass::Rpc
        } else {
            RequestClass::RpcWrongProtocol
        }
    } else if req.uri().path() == HEALTH_PATH {
        RequestClass::Liveness
    } else {
        RequestClass::Unknown
    }
}

#[derive(Clone)]
struct DispatchState {
    rpc: GreeterServer<GreeterService>,
}

/// Build the dispatch router served on both transport variants.
pub fn router() -> Router {
    let state = DispatchState {
        rpc: rpc::service(),
    };

    Router::new()
        .route("/", any(dispatch))
        .route("/{*path}", any(dispatch))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Resolve one exchange to a handler or a local status response.
///
/// A malformed exchange never aborts the listener; every outcome is one of
/// the responses below.
async fn dispatch(State(state): State<DispatchState>, req: Request<Body>) -> Response {
    match classify(&req) {
        RequestClass::Rpc => {
            tracing::debug!(path = %req.uri().path(), "dispatching rpc exchange");

            let req = req.map(tonic::body::Body::new);
            match state.rpc.clone().oneshot(req).await {
                Ok(res) => res.map(Body::new).into_response(),
                Err(infallible) => match infallible {},
            }
        }
        RequestClass::RpcWrongProtocol => StatusCode::UPGRADE_REQUIRED.into_response(),
        RequestClass::Liveness => StatusCode::OK.into_response(),
        RequestClass::Unknown => StatusCode::NOT_FOUND.into_response(),
    }
}
