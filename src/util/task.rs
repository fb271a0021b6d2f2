use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Run a future and turn a panic inside it into `Err(message)`.
///
/// Spawned fetch tasks report back over a channel; without this a panic
/// would silently drop the completion and leave the feed stuck in its
/// loading state.
pub async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            }
        })
}
