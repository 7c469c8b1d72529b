// src/utils/retry.rs

use std::time::Duration;

/// Re-runs an idempotent store read once if the first attempt fails with a
/// transient error. Writes must not go through here.
pub async fn retry_read<F, Fut, T>(mut f: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match f().await {
        Ok(v) => Ok(v),
        Err(e) if is_transient(&e) => {
            tracing::warn!("Read failed, retrying once: {}", e);
            tokio::time::sleep(Duration::from_millis(50)).await;
            f().await
        }
        Err(e) => Err(e),
    }
}

fn is_transient(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
}
