//! Timed polling of the provider's notification queue.
//!
//! The provider offers no push channel to desktop clients, so the chat
//! drains the queue on a fixed interval: receive one notification, hand its
//! text to the view, acknowledge it, sleep, repeat. A transport failure stops
//! the loop for good; the user can pause and resume it.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, Credentials, MessagingApi};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    UserPaused,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Stopped(StopReason),
}

/// What a running loop reports back to the chat. `generation` identifies the
/// loop instance that produced the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Incoming { generation: u64, text: String },
    Failed { generation: u64, error: ApiError },
}

pub struct PollLoop {
    api: Arc<dyn MessagingApi>,
    creds: Credentials,
    interval: Duration,
    runtime: Handle,
    events: Option<UnboundedSender<PollEvent>>,
    state: PollState,
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl PollLoop {
    /// Creates an idle loop and the receiving end of its event channel. The
    /// channel outlives pause/resume cycles and closes after `shutdown`.
    pub fn new(
        api: Arc<dyn MessagingApi>,
        creds: Credentials,
        interval: Duration,
        runtime: Handle,
    ) -> (Self, UnboundedReceiver<PollEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let poll = Self {
            api,
            creds,
            interval,
            runtime,
            events: Some(events),
            state: PollState::Idle,
            generation: 0,
            cancel: None,
        };
        (poll, rx)
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Starts polling from `Idle` or a user pause. The first cycle runs immediately.
    /// Returns false when the loop is already running, was stopped by an error
    /// or has been shut down.
    pub fn start(&mut self) -> bool {
        match self.state {
            PollState::Idle | PollState::Stopped(StopReason::UserPaused) => {}
            PollState::Polling | PollState::Stopped(StopReason::Error) => return false,
        }
        let Some(events) = self.events.clone() else {
            return false;
        };
        self.generation += 1;
        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        self.state = PollState::Polling;
        info!("Polling for notifications every {:?}", self.interval);
        self.runtime.spawn(run(
            self.api.clone(),
            self.creds.clone(),
            self.interval,
            cancel,
            self.generation,
            events,
        ));
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state != PollState::Polling {
            return false;
        }
        self.cancel_task();
        self.state = PollState::Stopped(StopReason::UserPaused);
        info!("Polling paused");
        true
    }

    /// Pause when polling, resume when paused. Returns the resulting state.
    pub fn toggle(&mut self) -> PollState {
        match self.state {
            PollState::Polling => {
                self.pause();
            }
            PollState::Stopped(StopReason::UserPaused) => {
                self.start();
            }
            PollState::Idle | PollState::Stopped(StopReason::Error) => {}
        }
        self.state
    }

    /// Tears the loop down for good (view unmount or logout). The event
    /// channel closes once the running task has exited.
    pub fn shutdown(&mut self) {
        self.cancel_task();
        self.events = None;
        self.state = PollState::Idle;
    }

    /// Folds an event into the loop state. Returns the event if the view should act on it.
    ///
    /// Incoming text is always kept since it has already been acknowledged.
    /// A failure only counts when it comes from the loop that is currently running.
    pub fn observe(&mut self, event: PollEvent) -> Option<PollEvent> {
        match &event {
            PollEvent::Incoming { .. } => Some(event),
            PollEvent::Failed { generation, error } => {
                if *generation != self.generation || self.state != PollState::Polling {
                    debug!("Dropping stale failure from poll loop {}: {}", generation, error);
                    return None;
                }
                self.cancel = None;
                self.state = PollState::Stopped(StopReason::Error);
                Some(event)
            }
        }
    }

    fn cancel_task(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.cancel_task();
    }
}

async fn run(
    api: Arc<dyn MessagingApi>,
    creds: Credentials,
    interval: Duration,
    cancel: CancellationToken,
    generation: u64,
    events: UnboundedSender<PollEvent>,
) {
    loop {
        let received = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            res = api.receive_notification(&creds) => res,
        };

        match received {
            Ok(Some(notification)) => {
                if let Some(text) = notification.incoming_text() {
                    // Left unacknowledged so it is redelivered after a resume.
                    if cancel.is_cancelled() {
                        break;
                    }
                    let event = PollEvent::Incoming { generation, text: text.to_string() };
                    if events.send(event).is_err() {
                        break;
                    }
                } else {
                    debug!(
                        "Discarding {} notification {}",
                        notification.body.type_webhook, notification.receipt_id
                    );
                }
                if let Err(e) = api.delete_notification(&creds, notification.receipt_id).await {
                    warn!("Failed to acknowledge notification {}: {}", notification.receipt_id, e);
                }
            }
            Ok(None) => {}
            Err(error) => {
                warn!("Polling stopped: {}", error);
                if !cancel.is_cancelled() {
                    let _ = events.send(PollEvent::Failed { generation, error });
                }
                break;
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    debug!("Poll loop {} finished", generation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{status_notification, text_notification, FakeApi};
    use tokio::time::sleep;

    fn setup(api: &Arc<FakeApi>) -> (PollLoop, UnboundedReceiver<PollEvent>) {
        PollLoop::new(
            api.clone(),
            Credentials::new("1101000001", "token"),
            DEFAULT_POLL_INTERVAL,
            Handle::current(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn text_notification_is_reported_then_acknowledged() {
        let api = Arc::new(FakeApi::new());
        api.push_receive(Ok(Some(text_notification(17, "hello"))));
        let (mut poll, mut rx) = setup(&api);
        assert_eq!(poll.state(), PollState::Idle);

        assert!(poll.start());
        let event = rx.recv().await.unwrap();
        assert_eq!(event, PollEvent::Incoming { generation: 1, text: "hello".into() });
        assert_eq!(poll.observe(event.clone()), Some(event));

        sleep(Duration::from_millis(10)).await;
        assert_eq!(api.deleted(), vec![17]);
        assert_eq!(poll.state(), PollState::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn non_text_notifications_are_acknowledged_silently() {
        let api = Arc::new(FakeApi::new());
        api.push_receive(Ok(Some(status_notification(3))));
        let (mut poll, mut rx) = setup(&api);
        poll.start();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(api.deleted(), vec![3]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cycles_follow_the_interval() {
        let api = Arc::new(FakeApi::new());
        let (mut poll, _rx) = setup(&api);
        poll.start();

        // cycles at 0s, 5s and 10s
        sleep(Duration::from_secs(12)).await;
        assert_eq!(api.receive_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_stops_polling_for_good() {
        let api = Arc::new(FakeApi::new());
        api.push_receive(Err(ApiError::Status(502)));
        let (mut poll, mut rx) = setup(&api);
        poll.start();

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, PollEvent::Failed { generation: 1, .. }));
        assert!(poll.observe(event).is_some());
        assert_eq!(poll.state(), PollState::Stopped(StopReason::Error));

        sleep(Duration::from_secs(60)).await;
        assert_eq!(api.receive_count(), 1);

        // neither toggle nor start revive an errored loop
        assert_eq!(poll.toggle(), PollState::Stopped(StopReason::Error));
        assert!(!poll.start());
        sleep(Duration::from_secs(60)).await;
        assert_eq!(api.receive_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn acknowledgement_failure_does_not_stop_polling() {
        let api = Arc::new(FakeApi::new());
        api.fail_deletes(ApiError::Status(500));
        api.push_receive(Ok(Some(text_notification(1, "one"))));
        let (mut poll, mut rx) = setup(&api);
        poll.start();

        let event = rx.recv().await.unwrap();
        poll.observe(event);
        sleep(Duration::from_secs(11)).await;
        assert_eq!(api.receive_count(), 3);
        assert_eq!(poll.state(), PollState::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_skips_next_cycle_and_resume_polls_immediately() {
        let api = Arc::new(FakeApi::new());
        let (mut poll, _rx) = setup(&api);
        poll.start();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(api.receive_count(), 1);

        assert_eq!(poll.toggle(), PollState::Stopped(StopReason::UserPaused));
        sleep(Duration::from_secs(30)).await;
        assert_eq!(api.receive_count(), 1);

        assert_eq!(poll.toggle(), PollState::Polling);
        sleep(Duration::from_millis(1)).await;
        assert_eq!(api.receive_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_failure_does_not_stop_a_resumed_loop() {
        let api = Arc::new(FakeApi::new());
        let (mut poll, _rx) = setup(&api);
        poll.start();
        poll.pause();
        poll.start();

        let stale = PollEvent::Failed { generation: 1, error: ApiError::Network("reset".into()) };
        assert!(poll.observe(stale).is_none());
        assert_eq!(poll.state(), PollState::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_during_receive_drops_the_notification_unacknowledged() {
        let api = Arc::new(FakeApi::new());
        api.delay_receives(Duration::from_secs(3));
        api.push_receive(Ok(Some(text_notification(21, "late"))));
        let (mut poll, mut rx) = setup(&api);
        poll.start();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(api.receive_count(), 1);
        assert!(poll.pause());

        sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
        assert!(api.deleted().is_empty());
        assert_eq!(api.receive_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn notification_pending_during_pause_arrives_after_resume() {
        let api = Arc::new(FakeApi::new());
        api.delay_receives(Duration::from_secs(3));
        api.push_receive(Ok(Some(text_notification(22, "again"))));
        let (mut poll, mut rx) = setup(&api);
        poll.start();
        sleep(Duration::from_secs(1)).await;
        poll.pause();

        assert!(poll.start());
        let event = rx.recv().await.unwrap();
        assert_eq!(event, PollEvent::Incoming { generation: 2, text: "again".into() });
        sleep(Duration::from_millis(10)).await;
        assert_eq!(api.deleted(), vec![22]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_the_channel_and_blocks_restart() {
        let api = Arc::new(FakeApi::new());
        let (mut poll, mut rx) = setup(&api);
        poll.start();
        sleep(Duration::from_secs(1)).await;

        poll.shutdown();
        assert_eq!(rx.recv().await, None);
        assert!(!poll.start());
        assert_eq!(poll.state(), PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_loop_cancels_the_task() {
        let api = Arc::new(FakeApi::new());
        let (mut poll, _rx) = setup(&api);
        poll.start();
        sleep(Duration::from_secs(1)).await;
        drop(poll);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(api.receive_count(), 1);
    }
}
