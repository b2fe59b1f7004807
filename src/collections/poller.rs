use super::CollectionStore;
use crate::errors::{DashboardError, DashboardResult};
use crate::models::{Collection, Record};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Vec<Record>>> + Send + 'a>>;

pub trait CollectionSource: Send + Sync {
    fn name(&self) -> &str;
    fn fetch(&self) -> FetchFuture<'_>;
}

pub struct FnSource<F> {
    name: String,
    fetch: F,
}

impl<F> FnSource<F> {
    pub fn new(name: &str, fetch: F) -> Self {
        Self {
            name: name.to_string(),
            fetch,
        }
    }
}

impl<F, Fut> CollectionSource for FnSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<Record>>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> FetchFuture<'_> {
        Box::pin((self.fetch)())
    }
}

/// Fetches once and publishes the result. A failed fetch publishes a
/// disconnected collection rather than keeping the stale one.
pub async fn poll_once(store: &CollectionStore, source: &dyn CollectionSource) -> bool {
    match source.fetch().await {
        Ok(items) => {
            store.publish(source.name(), Collection::connected(items));
            true
        }
        Err(error) => {
            tracing::warn!(collection = %source.name(), error = %error, "collection fetch failed");
            store.publish(source.name(), Collection::disconnected());
            false
        }
    }
}

pub fn spawn_poller(
    store: CollectionStore,
    source: Arc<dyn CollectionSource>,
    interval: Duration,
) -> DashboardResult<JoinHandle<()>> {
    if interval.is_zero() {
        return Err(DashboardError::Settings(format!(
            "poll interval for '{}' must be greater than zero",
            source.name()
        )));
    }
    Ok(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            poll_once(&store, source.as_ref()).await;
        }
    }))
}
