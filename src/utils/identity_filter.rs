use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real employee counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Holds employee codes and emails. A miss proves the identifier is free;
/// a hit still needs the authoritative DB check.
static IDENTITY_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(key: &str) -> String {
    key.to_lowercase()
}

/// Check if an employee code or email might already be taken
pub fn might_exist(key: &str) -> bool {
    let key = normalize(key);
    IDENTITY_FILTER
        .read()
        .expect("identity filter poisoned")
        .contains(&key)
}

/// Insert an identifier into the filter
pub fn insert(key: &str) {
    let key = normalize(key);
    IDENTITY_FILTER
        .write()
        .expect("identity filter poisoned")
        .add(&key);
}

/// Remove an identifier from the filter
pub fn remove(key: &str) {
    let key = normalize(key);
    IDENTITY_FILTER
        .write()
        .expect("identity filter poisoned")
        .remove(&key);
}

/// Warm up the filter from the employees table using streaming + batching
pub async fn warmup_identity_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String, String)>("SELECT employee_code, email FROM employees")
            .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size * 2);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (code, email) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&code));
        batch.push(normalize(&email));
        total += 1;

        if batch.len() >= batch_size * 2 {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    tracing::info!("Identity filter warmup complete: {} employees", total);
    Ok(())
}

/// Insert a batch of normalized identifiers
fn insert_batch(keys: &[String]) {
    let mut filter = IDENTITY_FILTER.write().expect("identity filter poisoned");

    for key in keys {
        filter.add(key);
    }
}
