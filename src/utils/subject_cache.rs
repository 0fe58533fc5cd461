use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// subject_name -> employee id, for the punch hot path. Every accepted
/// punch starts with a subject lookup; this keeps the common case off the
/// database. Only active employees are cached.
pub static SUBJECT_CACHE: Lazy<Cache<String, u64>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Remember a subject mapping (at enrollment or after a DB fallback hit)
pub async fn remember(subject: &str, employee_id: u64) {
    SUBJECT_CACHE.insert(subject.to_string(), employee_id).await;
}

/// Look up an employee id by subject name
pub async fn lookup(subject: &str) -> Option<u64> {
    SUBJECT_CACHE.get(subject).await
}

/// Drop a mapping (employee deactivated)
pub async fn forget(subject: &str) {
    SUBJECT_CACHE.invalidate(subject).await;
}

/// Batch insert mappings
async fn batch_remember(entries: &[(String, u64)]) {
    let futures: Vec<_> = entries
        .iter()
        .map(|(subject, id)| SUBJECT_CACHE.insert(subject.clone(), *id))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load active employees' subject mappings into the cache (batched)
pub async fn warmup_subject_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, u64)>(
        r#"
        SELECT subject_name, id
        FROM employees
        WHERE is_active = TRUE
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        batch.push(row?);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_remember(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_remember(&batch).await;
    }

    tracing::info!("Subject cache warmup complete: {} employees", total_count);

    Ok(())
}
