//! Observable queries that re-run whenever the weather table changes.

use futures::future::BoxFuture;
use futures::stream::{self, Stream};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

pub(crate) type QueryFn<T> =
    Arc<dyn Fn() -> BoxFuture<'static, Result<T, sqlx::Error>> + Send + Sync>;

/// A query bound to the store's change feed.
///
/// `current()` evaluates the query immediately. `changed()` parks until the
/// next committed write to the store and then evaluates it again, so a holder
/// always observes the latest rows without polling.
pub struct LiveQuery<T> {
    changes: watch::Receiver<u64>,
    run: QueryFn<T>,
}

impl<T: Send + 'static> LiveQuery<T> {
    pub(crate) fn new(mut changes: watch::Receiver<u64>, run: QueryFn<T>) -> Self {
        changes.borrow_and_update();
        Self { changes, run }
    }

    /// Evaluate the query against the store as it is now.
    pub async fn current(&self) -> Result<T, sqlx::Error> {
        (self.run)().await
    }

    /// Wait for the next store write, then evaluate.
    ///
    /// Returns `None` once every `WeatherDao` handle on the store is dropped.
    pub async fn changed(&mut self) -> Option<Result<T, sqlx::Error>> {
        self.changes.changed().await.ok()?;
        Some(self.current().await)
    }

    /// The current value followed by one value per subsequent store write.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, sqlx::Error>> + Send {
        stream::unfold((self, true), |(mut query, first)| async move {
            let item = if first {
                Some(query.current().await)
            } else {
                query.changed().await
            };
            item.map(|value| (value, (query, false)))
        })
    }
}

impl<T> Clone for LiveQuery<T> {
    fn clone(&self) -> Self {
        Self {
            changes: self.changes.clone(),
            run: self.run.clone(),
        }
    }
}

impl<T> fmt::Debug for LiveQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveQuery")
            .field("version", &*self.changes.borrow())
            .finish_non_exhaustive()
    }
}
