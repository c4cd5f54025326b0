// channel error types.

use std::fmt;
use thiserror::Error;

/// Error for sending into a channel for which all receivers have been dropped
///
/// Carries the value that could not be delivered, so the caller can recover or redirect
/// it. A send never destroys its value silently.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SendError<T> {
    /// The value that was not delivered
    pub value: T,
}

impl<T> SendError<T> {
    /// Recover the value that could not be sent
    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sending into a channel with no receivers")
    }
}

impl<T: fmt::Debug> std::error::Error for SendError<T> {}

/// Error for sending into a channel without suspending
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TrySendError<T> {
    /// The buffer is at capacity. The channel is still open, so a later attempt may
    /// succeed.
    Full(T),
    /// All receivers have been dropped. No send on this channel can ever succeed again.
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Recover the value that could not be sent
    pub fn into_value(self) -> T {
        match self {
            TrySendError::Full(value) | TrySendError::Closed(value) => value,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, TrySendError::Full(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TrySendError::Closed(_))
    }
}

impl<T> From<SendError<T>> for TrySendError<T> {
    fn from(e: SendError<T>) -> Self {
        TrySendError::Closed(e.value)
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => write!(f, "sending into a full channel"),
            TrySendError::Closed(_) => write!(f, "sending into a channel with no receivers"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for TrySendError<T> {}

/// Error for receiving from a channel without suspending
///
/// Both variants mean no value is available right now; `Closed` additionally means none
/// ever will be.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TryRecvError {
    /// The buffer is empty, but senders remain alive
    #[error("receiving from an empty channel")]
    Empty,
    /// The buffer is empty and all senders have been dropped
    #[error("receiving from an empty channel with no senders")]
    Closed,
}

impl TryRecvError {
    pub fn is_empty(&self) -> bool {
        matches!(self, TryRecvError::Empty)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TryRecvError::Closed)
    }
}
