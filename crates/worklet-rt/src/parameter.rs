//! Controller → audio thread parameter channel.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::error::{TryRecvError, TrySendError};

/// A single `{ id, value }` update. Range checking belongs to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub id: u32,
    pub value: f32,
}

impl ParameterUpdate {
    pub fn new(id: u32, value: f32) -> Self {
        Self { id, value }
    }
}

/// Sending half, owned by the controlling thread.
#[derive(Debug)]
pub struct ParameterSender {
    tx: Sender<ParameterUpdate>,
}

impl ParameterSender {
    /// Queues `update` without blocking. Errors are local to the sender;
    /// nothing is ever reported back from the audio thread.
    pub fn send(&self, update: ParameterUpdate) -> Result<(), TrySendError> {
        self.tx.try_send(update).map_err(TrySendError::from)
    }

    pub fn set(&self, id: u32, value: f32) -> Result<(), TrySendError> {
        self.send(ParameterUpdate::new(id, value))
    }

    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Receiving half, owned by the audio thread.
#[derive(Debug)]
pub struct ParameterReceiver {
    rx: Receiver<ParameterUpdate>,
}

impl ParameterReceiver {
    #[inline]
    pub fn try_recv(&self) -> Result<ParameterUpdate, TryRecvError> {
        self.rx.try_recv().map_err(TryRecvError::from)
    }

    /// Hands every queued update to `hook` in send order.
    #[inline]
    pub fn dispatch(&self, mut hook: impl FnMut(ParameterUpdate)) -> usize {
        let mut count = 0;
        while let Ok(update) = self.rx.try_recv() {
            hook(update);
            count += 1;
        }
        count
    }
}

/// Creates the bounded SPSC parameter channel.
pub fn parameter_channel(capacity: usize) -> (ParameterSender, ParameterReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (ParameterSender { tx }, ParameterReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn send_and_dispatch_in_order() {
        let (tx, rx) = parameter_channel(4);
        tx.set(1, 0.5).unwrap();
        tx.set(2, 0.25).unwrap();
        tx.set(1, 0.75).unwrap();

        let mut seen = Vec::new();
        assert_eq!(rx.dispatch(|update| seen.push(update)), 3);
        assert_eq!(
            seen,
            vec![
                ParameterUpdate::new(1, 0.5),
                ParameterUpdate::new(2, 0.25),
                ParameterUpdate::new(1, 0.75),
            ]
        );
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn full_channel_rejects_without_blocking() {
        let (tx, _rx) = parameter_channel(1);
        tx.set(0, 1.0).unwrap();
        assert_eq!(tx.set(0, 2.0), Err(TrySendError::Full));
        assert_eq!(tx.pending(), 1);
    }

    #[test]
    fn dropping_either_end_disconnects() {
        let (tx, rx) = parameter_channel(2);
        drop(rx);
        assert_eq!(tx.set(0, 1.0), Err(TrySendError::Disconnected));

        let (tx, rx) = parameter_channel(2);
        drop(tx);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }
}
