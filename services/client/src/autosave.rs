//! services/client/src/autosave.rs
//!
//! The editor session: local draft state plus a background worker that
//! saves it once edits have been quiet for the configured delay.
//!
//! Every edit restarts the timer. A save only goes out when the draft differs
//! from the last snapshot the server acknowledged, so typing a word and
//! deleting it again costs nothing. Manual saves skip the timer. Closing or
//! dropping a dirty session issues one final save.

use atticus_core::draft::{DraftSnapshot, DraftTracker};
use atticus_core::ports::{DraftSink, PortResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What the editor shows next to the draft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveStatus {
    pub dirty: bool,
    pub saving: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub word_count: usize,
}

//=========================================================================================
// Shared State
//=========================================================================================

struct Shared {
    draft: Mutex<DraftTracker>,
    sink: Arc<dyn DraftSink>,
    status: watch::Sender<SaveStatus>,
    // Held for the duration of a save so manual and automatic saves never overlap.
    save_lock: Mutex<()>,
}

impl Shared {
    /// Sends the pending snapshot, if any. Returns whether a request was made.
    async fn save_pending(&self) -> PortResult<bool> {
        let _saving = self.save_lock.lock().await;

        let snapshot = {
            let draft = self.draft.lock().await;
            match draft.pending() {
                Some(snapshot) => snapshot,
                None => {
                    self.status.send_modify(|s| s.dirty = false);
                    return Ok(false);
                }
            }
        };

        self.status.send_modify(|s| s.saving = true);
        let result = self.sink.save_draft(&snapshot.to_update()).await;

        let mut draft = self.draft.lock().await;
        match result {
            Ok(()) => {
                draft.mark_saved(snapshot);
                let dirty = draft.is_dirty();
                self.status.send_modify(|s| {
                    s.saving = false;
                    s.dirty = dirty;
                    s.last_saved_at = Some(Utc::now());
                });
                debug!("Draft saved.");
                Ok(true)
            }
            Err(e) => {
                self.status.send_modify(|s| s.saving = false);
                Err(e)
            }
        }
    }

    async fn edit<F: FnOnce(&mut DraftTracker)>(&self, apply: F) {
        let mut draft = self.draft.lock().await;
        apply(&mut draft);
        let dirty = draft.is_dirty();
        let words = draft.word_count();
        self.status.send_modify(|s| {
            s.dirty = dirty;
            s.word_count = words;
        });
    }
}

//=========================================================================================
// The Editor Session
//=========================================================================================

pub struct EditorSession {
    shared: Arc<Shared>,
    edits: mpsc::UnboundedSender<()>,
    cancellation_token: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl EditorSession {
    /// Opens a session on `initial`, which is taken to be what the server
    /// already holds. Must be called from within a Tokio runtime.
    pub fn new(initial: DraftSnapshot, sink: Arc<dyn DraftSink>, delay: Duration) -> Self {
        let tracker = DraftTracker::new(initial);
        let (status, _) = watch::channel(SaveStatus {
            word_count: tracker.word_count(),
            ..Default::default()
        });
        let shared = Arc::new(Shared {
            draft: Mutex::new(tracker),
            sink,
            status,
            save_lock: Mutex::new(()),
        });

        let (edits, edit_rx) = mpsc::unbounded_channel();
        let cancellation_token = CancellationToken::new();
        let worker = {
            let shared = shared.clone();
            let token = cancellation_token.clone();
            tokio::spawn(async move { autosave_process(shared, edit_rx, delay, token).await })
        };

        Self {
            shared,
            edits,
            cancellation_token,
            worker: Some(worker),
        }
    }

    pub async fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.shared.edit(|draft| draft.set_title(title)).await;
        self.notify();
    }

    pub async fn set_content(&self, content: impl Into<String>) {
        let content = content.into();
        self.shared.edit(|draft| draft.set_content(content)).await;
        self.notify();
    }

    /// Saves immediately, bypassing the timer. Errors are returned to the caller.
    pub async fn save_now(&self) -> PortResult<bool> {
        self.shared.save_pending().await
    }

    pub fn status(&self) -> SaveStatus {
        self.shared.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.shared.status.subscribe()
    }

    /// Stops the timer and saves whatever is still pending.
    pub async fn close(mut self) -> PortResult<bool> {
        self.cancellation_token.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                error!("Auto-save worker panicked: {:?}", e);
            }
        }
        let result = self.shared.save_pending().await;
        // Nothing left for `Drop` to do.
        self.shared.status.send_modify(|s| s.dirty = false);
        result
    }

    fn notify(&self) {
        if self.edits.send(()).is_err() {
            warn!("Auto-save worker is gone; edits will only be saved manually.");
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
        if !self.shared.status.borrow().dirty {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let shared = self.shared.clone();
                handle.spawn(async move {
                    match shared.save_pending().await {
                        Ok(_) => info!("Saved draft on close."),
                        Err(e) => warn!("Save on close failed: {}", e),
                    }
                });
            }
            Err(_) => warn!("Editor dropped outside a runtime; unsaved changes were lost."),
        }
    }
}

/// The debounce worker. Waits for an edit, then for a quiet period of
/// `delay` with no further edits, then saves.
async fn autosave_process(
    shared: Arc<Shared>,
    mut edits: mpsc::UnboundedReceiver<()>,
    delay: Duration,
    cancellation_token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => return,
            edit = edits.recv() => if edit.is_none() { return },
        }

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => return,
                edit = edits.recv() => match edit {
                    Some(()) => continue,
                    None => return,
                },
                _ = tokio::time::sleep(delay) => break,
            }
        }

        if let Err(e) = shared.save_pending().await {
            warn!("Auto-save failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use atticus_core::domain::DraftUpdate;
    use atticus_core::ports::PortError;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct RecordingSink {
        saved: std::sync::Mutex<Vec<DraftUpdate>>,
        fail: AtomicBool,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.saved.lock().unwrap().len()
        }

        fn last(&self) -> Option<DraftUpdate> {
            self.saved.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl DraftSink for RecordingSink {
        async fn save_draft(&self, update: &DraftUpdate) -> PortResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PortError::Network("offline".to_string()));
            }
            self.saved.lock().unwrap().push(update.clone());
            Ok(())
        }
    }

    const DELAY: Duration = Duration::from_millis(1000);

    fn open(sink: &Arc<RecordingSink>) -> EditorSession {
        EditorSession::new(DraftSnapshot::new("Chapter 1", "a"), sink.clone(), DELAY)
    }

    async fn wait(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_produce_one_save() {
        let sink = Arc::new(RecordingSink::default());
        let session = open(&sink);

        session.set_content("ab").await;
        wait(400).await;
        session.set_content("abc").await;
        wait(400).await;
        session.set_content("abc def").await;
        wait(400).await;
        assert_eq!(sink.count(), 0);

        wait(800).await;
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.last().unwrap().content, "<p>abc def</p>");

        let status = session.status();
        assert!(!status.dirty);
        assert!(!status.saving);
        assert!(status.last_saved_at.is_some());
        assert_eq!(status.word_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn returning_to_the_saved_value_saves_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let session = open(&sink);

        session.set_content("ab").await;
        wait(100).await;
        session.set_content("a").await;
        wait(2000).await;
        assert_eq!(sink.count(), 0);
        assert!(!session.status().dirty);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_save_skips_the_timer() {
        let sink = Arc::new(RecordingSink::default());
        let session = open(&sink);

        session.set_title("Prologue").await;
        assert!(session.save_now().await.unwrap());
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.last().unwrap().title, "Prologue");

        // The timer still fires but finds nothing to send.
        wait(2000).await;
        assert_eq!(sink.count(), 1);
        assert!(!session.save_now().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_auto_save_keeps_the_draft_dirty() {
        let sink = Arc::new(RecordingSink::default());
        sink.fail.store(true, Ordering::SeqCst);
        let session = open(&sink);

        session.set_content("lost?").await;
        wait(1500).await;
        let status = session.status();
        assert!(status.dirty);
        assert!(!status.saving);

        sink.fail.store(false, Ordering::SeqCst);
        assert!(session.save_now().await.unwrap());
        assert_eq!(sink.last().unwrap().content, "<p>lost?</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn manual_save_surfaces_errors() {
        let sink = Arc::new(RecordingSink::default());
        sink.fail.store(true, Ordering::SeqCst);
        let session = open(&sink);
        session.set_content("b").await;
        assert!(matches!(session.save_now().await, Err(PortError::Network(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn closing_saves_pending_edits() {
        let sink = Arc::new(RecordingSink::default());
        let session = open(&sink);
        session.set_content("final words").await;
        assert!(session.close().await.unwrap());
        assert_eq!(sink.count(), 1);

        // Nothing further is sent once the worker is gone.
        wait(2000).await;
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_dirty_session_saves_in_the_background() {
        let sink = Arc::new(RecordingSink::default());
        let session = open(&sink);
        session.set_content("unmounted").await;
        drop(session);

        wait(10).await;
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.last().unwrap().content, "<p>unmounted</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_clean_session_sends_nothing() {
        let sink = Arc::new(RecordingSink::default());
        drop(open(&sink));
        wait(2000).await;
        assert_eq!(sink.count(), 0);
    }
}
