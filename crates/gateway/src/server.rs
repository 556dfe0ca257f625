use std::net::SocketAddr;

use {
    axum::{Router, extract::State, routing::get},
    relaybot_config::LivenessConfig,
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{error, info},
};

/// Fixed body served on `/`.
#[derive(Clone)]
struct LivenessState {
    message: String,
}

/// Build the liveness router (shared between production startup and tests).
pub fn build_liveness_app(message: impl Into<String>) -> Router {
    Router::new()
        .route("/", get(liveness_handler))
        .with_state(LivenessState {
            message: message.into(),
        })
}

/// Bind the liveness listener and serve it in the background until `cancel`
/// fires.
///
/// Binding happens before this returns, so an unusable address is reported
/// to the caller instead of being lost in the spawned task.
pub async fn start_liveness(
    config: &LivenessConfig,
    cancel: CancellationToken,
) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind liveness endpoint on {addr}: {e}"))?;
    let local_addr = listener.local_addr()?;
    let app = build_liveness_app(config.message.clone());

    info!(addr = %local_addr, "liveness endpoint listening");

    let handle = tokio::spawn(async move {
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(cancel.cancelled_owned())
            .await;
        match served {
            Ok(()) => info!("liveness endpoint stopped"),
            Err(e) => error!(error = %e, "liveness endpoint failed"),
        }
    });

    Ok((local_addr, handle))
}

async fn liveness_handler(State(state): State<LivenessState>) -> String {
    state.message
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        axum::{
            body::Body,
            http::{Method, Request, StatusCode},
        },
        tower::ServiceExt,
    };

    use super::*;

    #[tokio::test]
    async fn root_returns_configured_message() {
        let response = build_liveness_app("Bot is running")
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Bot is running");
    }

    #[tokio::test]
    async fn head_is_answered_too() {
        let response = build_liveness_app("up")
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn other_paths_are_not_found() {
        let response = build_liveness_app("up")
            .oneshot(Request::get("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
