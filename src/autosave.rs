//! Debounced autosave
//!
//! At most one save is pending at a time. Scheduling a new save cancels the
//! pending one and restarts the delay, so only the last state in a quiet
//! window reaches storage. A save whose delay has elapsed claims its write
//! and is never aborted; [`Autosave::cancel`] and [`Autosave::flush`] wait
//! for claimed writes, so nothing written afterwards can be overwritten by
//! an older snapshot. Writes go through one lock and land in claim order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use crate::document::ResumeDocument;
use crate::profile::{ProfileId, Template};
use crate::storage::Storage;
use crate::Result;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Everything a save writes, captured when the save is scheduled
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub profile_id: ProfileId,
    pub name: String,
    pub document: ResumeDocument,
    pub template: Template,
}

struct Pending {
    request: SaveRequest,
    /// Set by whichever side gets there first: the timer (to write) or
    /// `cancel` (to drop the request).
    claimed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Pending {
    fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::SeqCst)
    }
}

pub struct Autosave {
    storage: Arc<Storage>,
    delay: Duration,
    pending: Option<Pending>,
    in_flight: Vec<JoinHandle<()>>,
    writes: Arc<Mutex<()>>,
}

impl Autosave {
    pub fn new(storage: Arc<Storage>, delay: Duration) -> Self {
        Self {
            storage,
            delay,
            pending: None,
            in_flight: Vec::new(),
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// True while a save is waiting for its delay to elapse
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.claimed.load(Ordering::SeqCst))
    }

    /// Arm (or re-arm) the timer with `request`
    pub fn schedule(&mut self, request: SaveRequest) {
        self.disarm();
        self.in_flight.retain(|t| !t.is_finished());

        let storage = self.storage.clone();
        let writes = self.writes.clone();
        let delay = self.delay;
        let claimed = Arc::new(AtomicBool::new(false));
        let snapshot = request.clone();
        let task = {
            let claimed = claimed.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if claimed.swap(true, Ordering::SeqCst) {
                    return;
                }
                let _guard = writes.lock().await;
                persist(&storage, &snapshot).await;
            })
        };

        tracing::debug!(
            "autosave armed for profile {} ({}ms)",
            request.profile_id,
            delay.as_millis()
        );
        self.pending = Some(Pending {
            request,
            claimed,
            task,
        });
    }

    /// Take the pending save without waiting. An unfired request is
    /// returned; a fired one keeps running and is tracked until it lands.
    fn disarm(&mut self) -> Option<SaveRequest> {
        let pending = self.pending.take()?;
        if pending.claim() {
            pending.task.abort();
            return Some(pending.request);
        }
        self.in_flight.push(pending.task);
        None
    }

    /// Stop the timer and wait for any write already underway. Returns the
    /// request if it had not fired yet.
    pub async fn cancel(&mut self) -> Option<SaveRequest> {
        let request = self.disarm();
        self.settle().await;
        request
    }

    /// Wait for fired saves to finish writing
    async fn settle(&mut self) {
        for task in self.in_flight.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!("autosave task ended early: {}", e);
            }
        }
    }

    /// Write the pending request now instead of waiting for the timer.
    /// A failed write is re-armed so the edit is not lost.
    pub async fn flush(&mut self) -> Result<bool> {
        let Some(request) = self.cancel().await else {
            return Ok(false);
        };
        let result = {
            let _guard = self.writes.lock().await;
            save(&self.storage, &request).await
        };
        match result {
            Ok(saved) => Ok(saved),
            Err(e) => {
                self.schedule(request);
                Err(e)
            }
        }
    }
}

async fn save(storage: &Storage, request: &SaveRequest) -> Result<bool> {
    let saved = storage
        .save_profile(request.profile_id, &request.name, &request.document, request.template)
        .await?;
    if saved {
        tracing::debug!("autosaved profile {}", request.profile_id);
    } else {
        tracing::warn!("autosave skipped: profile {} no longer exists", request.profile_id);
    }
    Ok(saved)
}

async fn persist(storage: &Storage, request: &SaveRequest) {
    if let Err(e) = save(storage, request).await {
        tracing::error!("Autosave of profile {} failed: {}", request.profile_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentPatch;

    async fn storage_with_profile() -> (Arc<Storage>, ProfileId) {
        let storage = Arc::new(Storage::in_memory());
        let id = storage
            .create_profile("Main", &ResumeDocument::default(), Template::Modern)
            .await
            .unwrap();
        (storage, id)
    }

    fn request(id: ProfileId, summary: &str) -> SaveRequest {
        SaveRequest {
            profile_id: id,
            name: "Main".into(),
            document: DocumentPatch::summary(summary).merged(&ResumeDocument::default()),
            template: Template::Modern,
        }
    }

    async fn stored_summary(storage: &Storage, id: ProfileId) -> String {
        storage.get_profile(id).await.unwrap().unwrap().data.summary
    }

    #[tokio::test(start_paused = true)]
    async fn test_saves_after_delay() {
        let (storage, id) = storage_with_profile().await;
        let mut autosave = Autosave::new(storage.clone(), DEFAULT_DELAY);

        autosave.schedule(request(id, "draft"));
        assert!(autosave.is_pending());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(stored_summary(&storage, id).await, "");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(stored_summary(&storage, id).await, "draft");
        assert!(!autosave.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_restarts_delay() {
        let (storage, id) = storage_with_profile().await;
        let mut autosave = Autosave::new(storage.clone(), DEFAULT_DELAY);

        autosave.schedule(request(id, "one"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        autosave.schedule(request(id, "two"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(stored_summary(&storage, id).await, "");

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(stored_summary(&storage, id).await, "two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_returns_unfired_request() {
        let (storage, id) = storage_with_profile().await;
        let mut autosave = Autosave::new(storage.clone(), DEFAULT_DELAY);

        autosave.schedule(request(id, "never"));
        let cancelled = autosave.cancel().await.unwrap();
        assert_eq!(cancelled.document.summary, "never");
        assert!(autosave.cancel().await.is_none());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(stored_summary(&storage, id).await, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let (storage, id) = storage_with_profile().await;
        let mut autosave = Autosave::new(storage.clone(), DEFAULT_DELAY);

        assert!(!autosave.flush().await.unwrap());

        autosave.schedule(request(id, "flushed"));
        assert!(autosave.flush().await.unwrap());
        assert_eq!(stored_summary(&storage, id).await, "flushed");
        assert!(!autosave.is_pending());
    }
}
