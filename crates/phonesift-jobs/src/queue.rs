use crate::error::Result;
use crate::task::Task;
use phonesift_store::repo::JobNew;
use phonesift_store::Store;
use tracing::debug;

/// Destination for follow-up tasks emitted by job handlers.
pub trait TaskQueue {
    fn dispatch(&self, now_utc: i64, queue: &str, task: &Task) -> Result<()>;
}

/// Writes tasks into the store's `jobs` table, ready immediately.
pub struct StoreQueue<'a> {
    store: &'a Store,
}

impl<'a> StoreQueue<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl TaskQueue for StoreQueue<'_> {
    fn dispatch(&self, now_utc: i64, queue: &str, task: &Task) -> Result<()> {
        let job = self.store.jobs().push(
            now_utc,
            JobNew {
                queue: queue.to_string(),
                payload: task.encode()?,
                available_at: now_utc,
            },
        )?;
        debug!(job_id = %job.id, queue, task = task.name(), "task dispatched");
        Ok(())
    }
}

/// Everything a handler needs for one invocation.
pub struct JobContext<'a> {
    pub store: &'a Store,
    pub queue: &'a dyn TaskQueue,
    pub now_utc: i64,
}
