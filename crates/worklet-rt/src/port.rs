//! Audio thread → controller message port.
//!
//! The port is unbounded so that posting from the audio thread never waits and
//! never drops a message while the controller is alive.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::de::DeserializeOwned;

use crate::error::{SendError, TryRecvError};

/// Opaque payload emitted by the engine, forwarded byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    payload: Vec<u8>,
}

impl OutgoingMessage {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl From<Vec<u8>> for OutgoingMessage {
    fn from(payload: Vec<u8>) -> Self {
        Self { payload }
    }
}

/// Posting half, owned by the audio thread.
#[derive(Debug)]
pub struct MessageSender {
    tx: Sender<OutgoingMessage>,
}

impl MessageSender {
    /// Fire-and-forget post. Fails only when the controller has gone away.
    #[inline]
    pub fn post(&self, message: OutgoingMessage) -> Result<(), SendError> {
        self.tx.send(message).map_err(SendError::from)
    }
}

/// Receiving half, owned by the controlling thread.
#[derive(Debug)]
pub struct MessageReceiver {
    rx: Receiver<OutgoingMessage>,
}

impl MessageReceiver {
    pub fn try_recv(&self) -> Result<OutgoingMessage, TryRecvError> {
        self.rx.try_recv().map_err(TryRecvError::from)
    }

    /// Everything currently queued, oldest first.
    pub fn drain(&self) -> Vec<OutgoingMessage> {
        self.rx.try_iter().collect()
    }

    /// Pops the next message and decodes it as JSON. Messages that are not
    /// valid `T` are consumed and reported as `Some(Err(..))`.
    pub fn try_recv_json<T: DeserializeOwned>(&self) -> Option<serde_json::Result<T>> {
        let message = self.rx.try_recv().ok()?;
        Some(serde_json::from_slice(message.as_bytes()))
    }

    pub fn iter(&self) -> impl Iterator<Item = OutgoingMessage> + '_ {
        self.rx.iter()
    }
}

pub fn message_port() -> (MessageSender, MessageReceiver) {
    let (tx, rx) = unbounded();
    (MessageSender { tx }, MessageReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Peak {
        left: f32,
        right: f32,
    }

    #[test]
    fn messages_arrive_in_post_order() {
        let (tx, rx) = message_port();
        for index in 0u8..5 {
            tx.post(OutgoingMessage::new(vec![index])).unwrap();
        }
        let payloads: Vec<_> = rx.drain().into_iter().map(|m| m.into_bytes()).collect();
        assert_eq!(payloads, vec![vec![0], vec![1], vec![2], vec![3], vec![4]]);
    }

    #[test]
    fn json_payloads_decode() {
        let (tx, rx) = message_port();
        tx.post(OutgoingMessage::new(&br#"{"left":0.5,"right":0.25}"#[..]))
            .unwrap();
        tx.post(OutgoingMessage::new(&b"not json"[..])).unwrap();

        let peak = rx.try_recv_json::<Peak>().unwrap().unwrap();
        assert_eq!(peak, Peak { left: 0.5, right: 0.25 });
        assert!(rx.try_recv_json::<Peak>().unwrap().is_err());
        assert!(rx.try_recv_json::<Peak>().is_none());
    }

    #[test]
    fn receiver_distinguishes_empty_from_closed() {
        let (tx, rx) = message_port();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        tx.post(OutgoingMessage::new(vec![7])).unwrap();
        drop(tx);
        assert_eq!(rx.try_recv(), Ok(OutgoingMessage::new(vec![7])));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn post_after_controller_drop_fails() {
        let (tx, rx) = message_port();
        drop(rx);
        assert_eq!(tx.post(OutgoingMessage::default()), Err(SendError));
    }
}
