pub mod auth;
pub mod conversations;
pub mod error;
pub mod extractors;
pub mod favorites;
pub mod images;
pub mod listings;
pub mod messages;
pub mod routes;
pub mod token;

pub use auth::{AppState, AppStateInner};
pub use routes::router;

use tracing::error;

use crate::error::{ApiError, ApiResult};

/// Run synchronous store work off the async executor.
pub(crate) async fn blocking<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("Blocking task failed: {}", e);
        ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
    })?
}
