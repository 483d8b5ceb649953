//! Stream session
//!
//! The server-side state of one `subscribe` call. [`StreamSession::recv`]
//! suspends until a message is queued or the session closes; it is cancel
//! safe, so it can sit in a `tokio::select!` next to a socket read.

use std::sync::Arc;

use super::error::SessionError;
use super::state::{CloseReason, SessionPhase};
use crate::dispatch::Dispatcher;
use crate::message::{Message, MessageKind};
use crate::registry::{Mailbox, SubscriberHandle, SubscriberId};
use crate::stats::SubscriberStats;

/// Lazy sequence of messages for one subscriber
///
/// Dropping the session counts as a receiver disconnect: queued messages are
/// abandoned and the subscriber is removed from the registry.
#[derive(Debug)]
pub struct StreamSession {
    subscriber: SubscriberHandle,
    mailbox: Mailbox,
    dispatcher: Arc<Dispatcher>,
    announce_presence: bool,
    finished: bool,
}

impl StreamSession {
    pub(crate) fn new(
        subscriber: SubscriberHandle,
        mailbox: Mailbox,
        dispatcher: Arc<Dispatcher>,
        announce_presence: bool,
    ) -> Self {
        Self {
            subscriber,
            mailbox,
            dispatcher,
            announce_presence,
            finished: false,
        }
    }

    /// Session identifier
    pub fn id(&self) -> SubscriberId {
        self.subscriber.id()
    }

    pub fn phase(&self) -> SessionPhase {
        self.subscriber.phase()
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.subscriber.close_reason()
    }

    pub fn stats(&self) -> SubscriberStats {
        self.subscriber.stats()
    }

    /// Receive the next message
    ///
    /// Returns `Some(Ok(_))` for each message in FIFO order. When the session
    /// closes, queued messages are drained first, then a terminal
    /// `Some(Err(_))` is returned for eviction or shutdown, and `None` after
    /// that (or immediately, for a clean close).
    pub async fn recv(&mut self) -> Option<Result<Arc<Message>, SessionError>> {
        if self.finished {
            return None;
        }

        loop {
            let reason = *self.mailbox.closed.borrow_and_update();

            if let Some(reason) = reason {
                if reason.drains_queue() {
                    if let Some(message) = self.mailbox.try_take() {
                        return Some(Ok(message));
                    }
                }
                return self.finish(reason).map(Err);
            }

            tokio::select! {
                biased;

                message = self.mailbox.messages.recv() => {
                    match message {
                        Some(message) => return Some(Ok(message)),
                        // The sender lives in our own subscriber handle
                        None => return self.finish(CloseReason::Disconnected).map(Err),
                    }
                }
                changed = self.mailbox.closed.changed() => {
                    if changed.is_err() {
                        return self.finish(CloseReason::Disconnected).map(Err);
                    }
                }
            }
        }
    }

    /// Explicit unsubscribe
    ///
    /// Messages already queued are still returned by `recv`, which then ends
    /// with `None`.
    pub fn close(&mut self) {
        if self.subscriber.close(CloseReason::Unsubscribed) {
            tracing::debug!(session_id = self.id(), "Session close requested");
        }
        self.dispatcher.registry().unregister(&self.subscriber);
    }

    fn finish(&mut self, reason: CloseReason) -> Option<SessionError> {
        self.finished = true;
        self.subscriber.mark_closed();
        self.dispatcher.registry().unregister(&self.subscriber);

        tracing::info!(
            session_id = self.id(),
            reason = %reason,
            delivered = self.subscriber.enqueued(),
            "Session closed"
        );

        if self.announce_presence && reason != CloseReason::Shutdown {
            self.dispatcher.publish(Message::notice(
                MessageKind::Left,
                format!("session {} left", self.id()),
            ));
        }

        reason.terminal_error(self.subscriber.capacity())
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.subscriber.close(CloseReason::Disconnected);
        let reason = self
            .subscriber
            .close_reason()
            .unwrap_or(CloseReason::Disconnected);
        self.finish(reason);
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_pending, assert_ready};

    use super::*;
    use crate::message::{validate, RawMessage};
    use crate::registry::{RegistryConfig, SubscriberRegistry};
    use crate::stats::BrokerMetrics;

    fn dispatcher(config: RegistryConfig) -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new(
            Arc::new(SubscriberRegistry::with_config(config)),
            Arc::new(BrokerMetrics::new()),
        ))
    }

    fn open_session(dispatcher: &Arc<Dispatcher>) -> StreamSession {
        let (handle, mailbox) = dispatcher.registry().register().unwrap();
        StreamSession::new(handle, mailbox, Arc::clone(dispatcher), false)
    }

    fn publish(dispatcher: &Dispatcher, body: &str) {
        dispatcher.publish(validate(RawMessage::new("alice", body)).unwrap());
    }

    async fn next_body(session: &mut StreamSession) -> String {
        session.recv().await.unwrap().unwrap().body().to_string()
    }

    #[tokio::test]
    async fn test_recv_suspends_until_message() {
        let dispatcher = dispatcher(RegistryConfig::default());
        let mut session = open_session(&dispatcher);

        {
            let mut recv = tokio_test::task::spawn(session.recv());
            assert_pending!(recv.poll());

            publish(&dispatcher, "hello");
            assert!(recv.is_woken());

            let item = assert_ready!(recv.poll());
            assert_eq!(item.unwrap().unwrap().body(), "hello");
        }

        assert_eq!(session.phase(), SessionPhase::Open);
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let dispatcher = dispatcher(RegistryConfig::default());
        let mut session = open_session(&dispatcher);

        publish(&dispatcher, "one");
        publish(&dispatcher, "two");
        session.close();
        publish(&dispatcher, "three");

        assert!(!dispatcher.registry().contains(session.id()));
        assert_eq!(next_body(&mut session).await, "one");
        assert_eq!(next_body(&mut session).await, "two");
        assert!(session.recv().await.is_none());
        assert!(session.recv().await.is_none());
        assert_eq!(session.phase(), SessionPhase::Closed);
    }

    #[tokio::test]
    async fn test_slow_consumer_terminates_with_error() {
        let dispatcher = dispatcher(RegistryConfig::default().queue_capacity(3));
        let mut slow = open_session(&dispatcher);
        let mut fast = open_session(&dispatcher);

        for i in 0..4 {
            publish(&dispatcher, &i.to_string());
            assert_eq!(next_body(&mut fast).await, i.to_string());
        }

        assert!(!dispatcher.registry().contains(slow.id()));
        for i in 0..3 {
            assert_eq!(next_body(&mut slow).await, i.to_string());
        }
        assert_eq!(
            slow.recv().await.unwrap().unwrap_err(),
            SessionError::SlowConsumer { capacity: 3 }
        );
        assert!(slow.recv().await.is_none());

        // The fast subscriber keeps going
        publish(&dispatcher, "after");
        assert_eq!(next_body(&mut fast).await, "after");
    }

    #[tokio::test]
    async fn test_shutdown_reports_error_after_queued() {
        let dispatcher = dispatcher(RegistryConfig::default());
        let mut session = open_session(&dispatcher);

        publish(&dispatcher, "last words");
        dispatcher.registry().shutdown();

        assert_eq!(next_body(&mut session).await, "last words");
        assert_eq!(
            session.recv().await.unwrap().unwrap_err(),
            SessionError::Shutdown
        );
        assert!(session.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_pending_recv_wakes_on_close() {
        let dispatcher = dispatcher(RegistryConfig::default());
        let mut session = open_session(&dispatcher);
        let handle = dispatcher.registry().get(session.id()).unwrap();

        let mut recv = tokio_test::task::spawn(session.recv());
        assert_pending!(recv.poll());

        dispatcher.registry().unregister(&handle);
        assert!(recv.is_woken());
        assert!(assert_ready!(recv.poll()).is_none());
    }

    #[tokio::test]
    async fn test_drop_unregisters() {
        let dispatcher = dispatcher(RegistryConfig::default());
        let session = open_session(&dispatcher);
        let id = session.id();
        let handle = dispatcher.registry().get(id).unwrap();

        publish(&dispatcher, "never read");
        drop(session);

        assert!(!dispatcher.registry().contains(id));
        assert_eq!(handle.close_reason(), Some(CloseReason::Disconnected));
        assert_eq!(handle.phase(), SessionPhase::Closed);
    }

    #[tokio::test]
    async fn test_leave_notice_when_announcing() {
        let dispatcher = dispatcher(RegistryConfig::default());
        let mut watcher = open_session(&dispatcher);
        let (handle, mailbox) = dispatcher.registry().register().unwrap();
        let leaving = StreamSession::new(handle, mailbox, Arc::clone(&dispatcher), true);
        let id = leaving.id();

        drop(leaving);

        let notice = watcher.recv().await.unwrap().unwrap();
        assert_eq!(notice.kind(), MessageKind::Left);
        assert_eq!(notice.body(), format!("session {} left", id));
    }
}
