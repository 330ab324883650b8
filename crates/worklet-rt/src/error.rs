//! Channel errors, split by the side that can observe them.

/// Returned by a non-blocking send on a bounded channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrySendError {
    #[error("channel is full")]
    Full,
    #[error("receiver was dropped")]
    Disconnected,
}

/// Returned by a send on an unbounded channel; the only way it fails is a
/// dropped receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("receiver was dropped")]
pub struct SendError;

/// Returned by a non-blocking receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TryRecvError {
    #[error("channel is empty")]
    Empty,
    #[error("sender was dropped")]
    Disconnected,
}

impl From<crossbeam_channel::TryRecvError> for TryRecvError {
    fn from(err: crossbeam_channel::TryRecvError) -> Self {
        match err {
            crossbeam_channel::TryRecvError::Empty => TryRecvError::Empty,
            crossbeam_channel::TryRecvError::Disconnected => TryRecvError::Disconnected,
        }
    }
}

impl<T> From<crossbeam_channel::TrySendError<T>> for TrySendError {
    fn from(err: crossbeam_channel::TrySendError<T>) -> Self {
        match err {
            crossbeam_channel::TrySendError::Full(_) => TrySendError::Full,
            crossbeam_channel::TrySendError::Disconnected(_) => TrySendError::Disconnected,
        }
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for SendError {
    fn from(_: crossbeam_channel::SendError<T>) -> Self {
        SendError
    }
}
