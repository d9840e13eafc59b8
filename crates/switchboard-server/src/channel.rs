//! Per-session message channel.
//!
//! The channel is the session's transport binding: the server pushes
//! messages into it, the transport streams them out, and closing it fires
//! the registered close callbacks exactly once.

use parking_lot::Mutex;
use serde::Serialize;
use switchboard_transport::Subscription;
use tokio::sync::{broadcast, watch};
use tracing::warn;

type CloseCallback = Box<dyn FnOnce(&str) + Send>;

const CHANNEL_CAPACITY: usize = 256;

pub struct SessionChannel {
    session_id: String,
    messages: broadcast::Sender<String>,
    closed: watch::Sender<bool>,
    on_close: Mutex<Vec<CloseCallback>>,
}

impl SessionChannel {
    pub fn bind(session_id: impl Into<String>) -> Self {
        let (messages, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (closed, _) = watch::channel(false);
        Self {
            session_id: session_id.into(),
            messages,
            closed,
            on_close: Mutex::new(Vec::new()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Push a message to every open stream. Returns how many streams got it.
    pub fn send<T: Serialize>(&self, message: &T) -> usize {
        if self.is_closed() {
            return 0;
        }
        match serde_json::to_string(message) {
            Ok(json) => self.messages.send(json).unwrap_or(0),
            Err(e) => {
                warn!("Dropping unserializable message for session {}: {}", self.session_id, e);
                0
            }
        }
    }

    /// Register `callback` to run when the channel closes. Runs it right
    /// away if the channel is already closed.
    pub fn on_close(&self, callback: impl FnOnce(&str) + Send + 'static) {
        {
            let mut callbacks = self.on_close.lock();
            if !*self.closed.borrow() {
                callbacks.push(Box::new(callback));
                return;
            }
        }
        callback(&self.session_id);
    }

    /// Close the channel. Only the first call fires the callbacks.
    pub fn close(&self) -> bool {
        let callbacks = {
            let mut callbacks = self.on_close.lock();
            if self.closed.send_replace(true) {
                return false;
            }
            std::mem::take(&mut *callbacks)
        };
        for callback in callbacks {
            callback(&self.session_id);
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            messages: self.messages.subscribe(),
            closed: self.closed.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use serde_json::json;

    #[test]
    fn close_fires_callbacks_once() {
        let channel = SessionChannel::bind("s1");
        let fired = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let fired = fired.clone();
            channel.on_close(move |id| {
                assert_eq!(id, "s1");
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(channel.close());
        assert!(!channel.close());
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn late_callback_runs_immediately() {
        let channel = SessionChannel::bind("s1");
        channel.close();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        channel.on_close(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subscribers_receive_messages_until_close() {
        let channel = SessionChannel::bind("s1");
        assert_eq!(channel.send(&json!({ "n": 0 })), 0);

        let mut sub = channel.subscribe();
        assert_eq!(channel.send(&json!({ "n": 1 })), 1);
        assert_eq!(sub.messages.recv().await.unwrap(), r#"{"n":1}"#);

        channel.close();
        sub.closed.changed().await.unwrap();
        assert!(*sub.closed.borrow());
        assert!(channel.is_closed());
        assert_eq!(channel.send(&json!({ "n": 2 })), 0);
    }
}
