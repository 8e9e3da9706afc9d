use crate::api::ApiResult;
use crate::cache::CacheClient;
use crate::db::ConnectionPool;
use crate::model::enums::{Privacy, Rating};
use crate::schema::{post, post_tag};
use crate::string::SmallString;
use diesel::prelude::*;
use diesel::PgConnection;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Counter deltas queued per worker pool. Sized generously; a full queue
/// only drops increments, which the next forced seed corrects.
const QUEUE_DEPTH: usize = 4096;

/// Workers draining the queue. Bounds concurrent cache/database load from
/// counter maintenance regardless of request volume.
const WORKER_COUNT: usize = 4;

/// Attempts per delta before it is dropped.
const MAX_ATTEMPTS: u32 = 3;

/// Denormalized public-post tallies. Each key counts the public posts
/// visible under some filter; the relational store stays authoritative and
/// reseeds any key that goes missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterKey {
    Global,
    User(i64),
    Rating(Rating),
    Tag(SmallString),
}

impl Display for CounterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => f.write_str("_"),
            Self::User(user_id) => write!(f, "@{user_id}"),
            Self::Rating(rating) => rating.fmt(f),
            Self::Tag(tag) => tag.fmt(f),
        }
    }
}

impl CounterKey {
    /// The canonical count this key caches.
    fn canonical_count(&self, conn: &mut PgConnection) -> QueryResult<i64> {
        match self {
            Self::Global => post::table
                .filter(post::privacy.eq(Privacy::Public))
                .count()
                .get_result(conn),
            Self::User(user_id) => post::table
                .filter(post::privacy.eq(Privacy::Public))
                .filter(post::user_id.eq(user_id))
                .count()
                .get_result(conn),
            Self::Rating(rating) => post::table
                .filter(post::privacy.eq(Privacy::Public))
                .filter(post::rating.eq(rating))
                .count()
                .get_result(conn),
            Self::Tag(tag) => post_tag::table
                .inner_join(post::table)
                .filter(post::privacy.eq(Privacy::Public))
                .filter(post_tag::tag.eq(&**tag))
                .count()
                .get_result(conn),
        }
    }
}

#[derive(Debug)]
pub struct CounterUpdate {
    pub key: CounterKey,
    pub delta: i64,
}

/// Fire-and-forget queue in front of the counter workers. Failures are
/// logged and swallowed; the counters only promise convergence over a
/// quiescent system.
#[derive(Clone)]
pub struct CounterQueue {
    sender: mpsc::Sender<CounterUpdate>,
}

impl CounterQueue {
    pub fn start(cache: CacheClient, connection_pool: ConnectionPool) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        for _ in 0..WORKER_COUNT {
            let cache = cache.clone();
            let connection_pool = connection_pool.clone();
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move {
                loop {
                    let update = receiver.lock().await.recv().await;
                    match update {
                        Some(update) => apply_with_retries(&cache, &connection_pool, update).await,
                        None => break,
                    }
                }
            });
        }
        Self { sender }
    }

    pub fn push(&self, key: CounterKey, delta: i64) {
        if let Err(err) = self.sender.try_send(CounterUpdate { key, delta }) {
            warn!("Dropping counter update: {err}");
        }
    }
}

async fn apply_with_retries(cache: &CacheClient, connection_pool: &ConnectionPool, update: CounterUpdate) {
    for attempt in 1..=MAX_ATTEMPTS {
        match apply(cache, connection_pool, &update).await {
            Ok(value) => {
                debug!("Counter '{}' now {value}", update.key);
                return;
            }
            Err(err) if attempt < MAX_ATTEMPTS => {
                warn!("Counter update for '{}' failed on attempt {attempt}: {err}", update.key);
            }
            Err(err) => {
                warn!("Giving up on counter update for '{}': {err}", update.key);
            }
        }
    }
}

/// Seeds the key from SQL when absent, then applies the delta atomically.
/// The seed is create-if-absent so it cannot overwrite a counter that a
/// concurrent writer seeded and already moved.
async fn apply(cache: &CacheClient, connection_pool: &ConnectionPool, update: &CounterUpdate) -> ApiResult<i64> {
    let key = update.key.to_string();
    if !cache.exists(&key).await? {
        let mut conn = connection_pool.get()?;
        let seeded = update.key.canonical_count(&mut conn)?;
        cache.put_if_absent(&key, seeded).await?;
    }
    cache.increment(&key, update.delta).await
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counter_key_formats() {
        assert_eq!(CounterKey::Global.to_string(), "_");
        assert_eq!(CounterKey::User(7).to_string(), "@7");
        assert_eq!(CounterKey::Rating(Rating::Mature).to_string(), "mature");
        assert_eq!(CounterKey::Tag(SmallString::new("wolf")).to_string(), "wolf");
    }
}
