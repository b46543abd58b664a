//! Turning change batches into actions.

use crate::dev::EventBus;
use crate::error::Result;
use crate::process::Supervisor;
use crate::ui;
use crate::watch::{ChangeEvent, ChangeFilter};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// What a qualifying batch triggers.
pub enum Reaction {
    /// Serve mode: announce the change to live-reload clients.
    Publish(EventBus),
    /// Watch mode: restart the command, optionally clearing the screen first.
    Restart { supervisor: Supervisor, clear: bool },
}

/// Result of handling one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Empty, or nothing in it passed the filter.
    Ignored,
    /// Published to this many subscribers.
    Published(usize),
    Restarted,
    /// The restart failed; the error has been reported.
    RestartFailed,
}

/// Consumes batches one at a time and applies the session's reaction.
pub struct WatchDispatcher {
    filter: ChangeFilter,
    reaction: Reaction,
}

impl WatchDispatcher {
    pub fn new(filter: ChangeFilter, reaction: Reaction) -> Self {
        Self { filter, reaction }
    }

    pub fn publish(filter: ChangeFilter, bus: EventBus) -> Self {
        Self::new(filter, Reaction::Publish(bus))
    }

    pub fn restart(filter: ChangeFilter, supervisor: Supervisor, clear: bool) -> Self {
        Self::new(filter, Reaction::Restart { supervisor, clear })
    }

    /// Handle one batch.
    ///
    /// Publishing sends only the first qualifying event. Restarting waits until
    /// the previous child has been reaped and the new one spawned; failures
    /// are printed and reported as [`Outcome::RestartFailed`].
    pub async fn handle_batch(&self, batch: &[ChangeEvent]) -> Outcome {
        let Some(trigger) = self.filter.first_match(batch) else {
            if !batch.is_empty() {
                tracing::debug!(events = batch.len(), "batch filtered out");
            }
            return Outcome::Ignored;
        };

        match &self.reaction {
            Reaction::Publish(bus) => {
                let delivered = bus.publish(trigger.op.as_str(), trigger.path.as_bytes().to_vec());
                tracing::debug!(change = %trigger, delivered, "published change");
                Outcome::Published(delivered)
            }
            Reaction::Restart { supervisor, clear } => {
                if *clear {
                    ui::clear_screen();
                }
                tracing::info!(change = %trigger, "restarting");
                let started = Instant::now();
                match supervisor.restart().await {
                    Ok(pid) => {
                        tracing::debug!(pid, "restarted");
                        ui::debug(&format!(
                            "{trigger} restarted the command in {}",
                            ui::format_duration(started.elapsed())
                        ));
                        Outcome::Restarted
                    }
                    Err(err) => {
                        ui::error(&err.to_string());
                        Outcome::RestartFailed
                    }
                }
            }
        }
    }

    /// Process batches in order until the channel closes or `cancel` fires.
    ///
    /// A batch is fully handled before the next one is read, so restarts
    /// never overlap.
    pub async fn run(
        self,
        mut batches: mpsc::Receiver<Vec<ChangeEvent>>,
        cancel: CancellationToken,
    ) -> Result<()> {
        loop {
            let batch = tokio::select! {
                _ = cancel.cancelled() => break,
                batch = batches.recv() => match batch {
                    Some(batch) => batch,
                    None => break,
                },
            };
            self.handle_batch(&batch).await;
        }
        tracing::debug!("watch dispatcher stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::LaunchOptions;
    use crate::watch::ChangeOp;

    fn batch() -> Vec<ChangeEvent> {
        vec![
            ChangeEvent::new(ChangeOp::Modify, "a/b.go"),
            ChangeEvent::new(ChangeOp::Create, "c/ignored.txt"),
        ]
    }

    #[tokio::test]
    async fn test_publish_sends_first_event() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        let dispatcher = WatchDispatcher::publish(ChangeFilter::allow_all(), bus);

        assert_eq!(dispatcher.handle_batch(&batch()).await, Outcome::Published(1));

        let message = sub.recv().await.unwrap();
        assert_eq!(&*message.topic, "modify");
        assert_eq!(&*message.payload, b"a/b.go");
    }

    #[tokio::test]
    async fn test_publish_respects_filter() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        let filter = ChangeFilter::new(&["*.txt"], &[]).unwrap();
        let dispatcher = WatchDispatcher::publish(filter, bus);

        dispatcher.handle_batch(&batch()).await;
        assert_eq!(&*sub.recv().await.unwrap().payload, b"c/ignored.txt");
    }

    #[tokio::test]
    async fn test_empty_batch_is_ignored() {
        let bus = EventBus::new();
        let _sub = bus.subscribe();
        let dispatcher = WatchDispatcher::publish(ChangeFilter::allow_all(), bus);
        assert_eq!(dispatcher.handle_batch(&[]).await, Outcome::Ignored);
    }

    #[tokio::test]
    async fn test_restart_without_start_reports_failure() {
        let supervisor = Supervisor::new(LaunchOptions::default());
        let filter = ChangeFilter::new(&["*.go"], &[]).unwrap();
        let dispatcher = WatchDispatcher::restart(filter, supervisor, false);

        assert_eq!(dispatcher.handle_batch(&batch()).await, Outcome::RestartFailed);
    }

    #[tokio::test]
    async fn test_excluded_batch_does_not_restart() {
        let supervisor = Supervisor::new(LaunchOptions::default());
        let filter = ChangeFilter::new(&["*.go"], &["a/*"]).unwrap();
        let dispatcher = WatchDispatcher::restart(filter, supervisor, false);

        assert_eq!(dispatcher.handle_batch(&batch()).await, Outcome::Ignored);
    }

    #[tokio::test]
    async fn test_run_stops_when_channel_closes() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        let dispatcher = WatchDispatcher::publish(ChangeFilter::allow_all(), bus);
        let (tx, rx) = mpsc::channel(4);

        let task = tokio::spawn(dispatcher.run(rx, CancellationToken::new()));
        tx.send(batch()).await.unwrap();
        tx.send(vec![]).await.unwrap();
        tx.send(vec![ChangeEvent::new(ChangeOp::Remove, "x.css")])
            .await
            .unwrap();
        drop(tx);

        task.await.unwrap().unwrap();
        assert_eq!(&*sub.recv().await.unwrap().payload, b"a/b.go");
        assert_eq!(&*sub.recv().await.unwrap().topic, "remove");
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let dispatcher = WatchDispatcher::publish(ChangeFilter::allow_all(), EventBus::new());
        let (_tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(dispatcher.run(rx, cancel.clone()));
        cancel.cancel();
        task.await.unwrap().unwrap();
    }
}
