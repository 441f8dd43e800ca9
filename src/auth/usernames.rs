//! "Is this username taken?" without a database round trip for most answers.
//!
//! A cuckoo filter answers the negative case (definitely free). A moka cache
//! holds recently active usernames for the positive case. Anything else falls
//! through to the `users` table.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;

const FILTER_CAPACITY: usize = 10_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;
const CACHE_CAPACITY: u64 = 50_000;
const CACHE_TTL: Duration = Duration::from_secs(86_400);

#[inline]
fn normalize(username: &str) -> String {
    username.trim().to_lowercase()
}

pub struct UsernameRegistry {
    filter: RwLock<CuckooFilter<String>>,
    /// true => taken
    cache: Cache<String, bool>,
}

impl Default for UsernameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UsernameRegistry {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// False positives possible, false negatives not.
    pub fn might_exist(&self, username: &str) -> bool {
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&normalize(username))
    }

    pub async fn is_taken(&self, username: &str) -> bool {
        self.cache.get(&normalize(username)).await.unwrap_or(false)
    }

    /// Records a username that now exists in the database.
    pub async fn mark_taken(&self, username: &str) {
        let username = normalize(username);
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&username);
        self.cache.insert(username, true).await;
    }

    /// true => username AVAILABLE
    pub async fn is_available(&self, username: &str, pool: &MySqlPool) -> bool {
        let username = normalize(username);

        if !self.might_exist(&username) {
            return true;
        }

        if self.is_taken(&username).await {
            return false;
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
        )
        .bind(&username)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Username lookup failed, treating as taken");
            true
        });

        if exists {
            self.cache.insert(username, true).await;
        }

        !exists
    }

    fn add_batch(&self, usernames: &[String]) {
        let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
        for username in usernames {
            filter.add(username);
        }
    }

    async fn cache_batch(&self, usernames: &[String]) {
        let inserts: Vec<_> = usernames
            .iter()
            .map(|u| self.cache.insert(u.clone(), true))
            .collect();
        futures::future::join_all(inserts).await;
    }

    /// Streams every username into the filter.
    pub async fn warmup_filter(&self, pool: &MySqlPool, batch_size: usize) -> Result<usize> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT username FROM users").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (username,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            batch.push(normalize(&username));
            total += 1;

            if batch.len() == batch_size {
                self.add_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.add_batch(&batch);
        }

        tracing::info!(total, "Username filter warmup complete");
        Ok(total)
    }

    /// Caches users who logged in during the last `days` days.
    pub async fn warmup_cache(&self, pool: &MySqlPool, days: u32, batch_size: usize) -> Result<usize> {
        let mut stream = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT username
            FROM users
            WHERE last_login_at >= NOW() - INTERVAL ? DAY
            ORDER BY last_login_at DESC
            "#,
        )
        .bind(days)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (username,) = row?;
            batch.push(normalize(&username));
            total += 1;

            if batch.len() >= batch_size {
                self.cache_batch(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.cache_batch(&batch).await;
        }

        tracing::info!(total, days, "Username cache warmup complete");
        Ok(total)
    }
}
