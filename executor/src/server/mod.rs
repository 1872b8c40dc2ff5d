pub mod error;
pub mod route;

use std::net::SocketAddr;
use std::sync::Arc;

pub use error::{ServerError, ServerResult};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::server::route::server_router;
use crate::service::ExecutionService;
use crate::types::params::ServerParams;
use crate::ExecutorResult;

/// State shared by the route handlers.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ExecutionService>,
    /// Cancelled on shutdown, ends the open event streams
    pub shutdown: CancellationToken,
}

/// Handle for managing the HTTP server lifecycle.
pub struct ServerHandle {
    shutdown_token: CancellationToken,
    task_handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Stops accepting connections and waits for in-flight requests to complete.
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        info!("Initiating server graceful shutdown");
        self.shutdown_token.cancel();
        self.task_handle.await
    }
}

/// Binds the listener and serves the API in a separate task.
///
/// # Returns
/// * `(SocketAddr, ServerHandle)` - The bound address and handle for managing the server
///
/// # Errors
/// * `ExecutorError::ServerError` - If the address cannot be bound
pub async fn setup_server(
    server_params: &ServerParams,
    service: Arc<ExecutionService>,
) -> ExecutorResult<(SocketAddr, ServerHandle)> {
    let (api_server_url, listener) = get_server_url(server_params).await?;

    let shutdown_token = CancellationToken::new();
    let server_token = shutdown_token.clone();

    let app = server_router(ApiState { service, shutdown: shutdown_token.clone() });
    let task_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(server_token.cancelled_owned()).await {
            error!(error = %e, "API server stopped with an error");
        }
    });

    info!(address = %api_server_url, "🌐 API server listening");
    Ok((api_server_url, ServerHandle { shutdown_token, task_handle }))
}

pub(crate) async fn get_server_url(
    server_params: &ServerParams,
) -> std::io::Result<(SocketAddr, tokio::net::TcpListener)> {
    // In test mode, use port 0 to get a random available port
    let port = if cfg!(test) { 0 } else { server_params.port };

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", server_params.host, port)).await?;
    let api_server_url = listener.local_addr()?;

    Ok((api_server_url, listener))
}
