// exposed API of channels

use self::future::*;
use super::{
    core,
    error::*,
    polling::{block_on, Timeout},
};
use std::{
    fmt,
    sync::atomic::Ordering::Relaxed,
    time::{Duration, Instant},
};


// ==== helper functions for adapting core API to exposed API ====


// 1. increment channel send count.
// 2. clone another handle to the channel.
fn clone_sender<T>(channel: &core::Channel<T>) -> core::Channel<T> {
    channel.send_count().fetch_add(1, Relaxed);
    channel.clone()
}

// 1. decrement channel send count.
// 2. if the send count was lowered to 0, wake all waiting receivers so they can observe
//    end-of-stream once the buffer drains.
fn drop_sender<T>(channel: &core::Channel<T>) {
    let prev_send_count = channel.send_count().fetch_sub(1, Relaxed);
    if prev_send_count == 1 {
        trace!("last sender dropped, closing producer side");
        channel.close_send_side();
    }
}

// 1. increment channel recv count.
// 2. clone another handle to the channel.
fn clone_receiver<T>(channel: &core::Channel<T>) -> core::Channel<T> {
    channel.recv_count().fetch_add(1, Relaxed);
    channel.clone()
}

// 1. decrement channel recv count.
// 2. if the recv count was lowered to 0, wake all waiting senders so they can fail fast
//    and hand their values back.
fn drop_receiver<T>(channel: &core::Channel<T>) {
    let prev_recv_count = channel.recv_count().fetch_sub(1, Relaxed);
    if prev_recv_count == 1 {
        trace!("last receiver dropped, closing consumer side");
        channel.close_recv_side();
    }
}


// ==== the exposed API ====


/// Create a bounded channel with stack (last-in-first-out) buffering
///
/// Returns a linked [`Sender`]/[`Receiver`] pair sharing a buffer of at most `capacity`
/// values. Receive operations always take the most recently sent value still buffered,
/// so retrieval order among buffered values is the reverse of send order.
///
/// Each side closes when its last handle (including unresolved send/recv futures) is
/// dropped; there is no explicit close operation.
///
/// # Panics
///
/// Panics if `capacity` is zero. A channel that can hold nothing is a programmer error,
/// not a runtime condition.
pub fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    assert!(capacity >= 1, "channel capacity must be at least 1");
    let channel_1 = core::Channel::new(capacity);
    let channel_2 = channel_1.clone();
    trace!(capacity, "created channel");
    (Sender(channel_1), Receiver(channel_2))
}

/// Sender handle to a channel, with backpressure
///
/// Cloneable. The channel's consumer side stays open as long as at least one `Receiver`
/// handle or unresolved receive future exists; once all are dropped, every send fails and
/// hands its value back.
pub struct Sender<T>(core::Channel<T>);

impl<T> Sender<T> {
    /// Create a future to send a value into the channel
    ///
    /// The future resolves to `Ok(())` once the value is buffered, suspending
    /// cooperatively while the buffer is full. It resolves to `Err(SendError)` carrying
    /// the value back if the last receiver is dropped before the value could be buffered.
    ///
    /// For purposes of closing the channel, the returned future counts as a live sender
    /// until it is dropped.
    pub fn send(&self, value: T) -> SendFut<T> {
        SendFut::new(clone_sender(&self.0), value)
    }

    /// Send a value if the channel has space, without suspending or blocking
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.0.try_push(value)
    }

    /// Send a value, blocking the calling thread until there is space
    ///
    /// Must not be called from asynchronous contexts.
    pub fn send_blocking(&self, value: T) -> Result<(), SendError<T>> {
        block_on(self.send(value), Timeout::Never)
            .ok().expect("timed out with Timeout::Never")
    }

    /// Send a value, blocking the calling thread until there is space or the timeout
    /// elapses
    ///
    /// On timeout the value is handed back in [`TrySendError::Full`].
    pub fn send_blocking_timeout(
        &self,
        value: T,
        timeout: Duration,
    ) -> Result<(), TrySendError<T>> {
        match block_on(self.send(value), Timeout::At(Instant::now() + timeout)) {
            Ok(result) => result.map_err(TrySendError::from),
            Err(mut fut) => Err(TrySendError::Full(fut.cancel().unwrap())),
        }
    }

    /// Maximum number of values the channel buffers
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    /// Number of values currently buffered
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer is currently empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the buffer is currently at capacity
    pub fn is_full(&self) -> bool {
        self.0.len() == self.0.capacity()
    }

    /// Whether all receiver handles have been dropped
    ///
    /// Once this returns true it never returns false again; every current and future
    /// send attempt fails.
    pub fn is_closed(&self) -> bool {
        self.0.recv_count().load(Relaxed) == 0
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Sender(clone_sender(&self.0))
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        drop_sender(&self.0);
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}

/// Receiver handle to a channel
///
/// Cloneable. The channel's producer side stays open as long as at least one `Sender`
/// handle or unresolved send future exists; once all are dropped, receivers drain what is
/// buffered and then observe end-of-stream.
pub struct Receiver<T>(core::Channel<T>);

impl<T> Receiver<T> {
    /// Create a future to receive the most recently sent value
    ///
    /// The future resolves to `Some(value)`, suspending cooperatively while the buffer is
    /// empty and senders remain, or to `None` once all senders are dropped and the buffer
    /// is drained. `None` is terminal: every later receive also resolves `None`.
    ///
    /// For purposes of closing the channel, the returned future counts as a live receiver
    /// until it is dropped.
    pub fn recv(&self) -> RecvFut<T> {
        RecvFut::new(clone_receiver(&self.0))
    }

    /// Take the most recently sent value if one is buffered, without suspending or
    /// blocking
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.0.try_pop()
    }

    /// Receive a value, blocking the calling thread until one is available
    ///
    /// Returns `None` once all senders are dropped and the buffer is drained. Must not be
    /// called from asynchronous contexts.
    pub fn recv_blocking(&self) -> Option<T> {
        block_on(self.recv(), Timeout::Never)
            .ok().expect("timed out with Timeout::Never")
    }

    /// Receive a value, blocking the calling thread until one is available or the
    /// timeout elapses
    pub fn recv_blocking_timeout(&self, timeout: Duration) -> Result<Option<T>, TryRecvError> {
        match block_on(self.recv(), Timeout::At(Instant::now() + timeout)) {
            Ok(result) => Ok(result),
            Err(_) => Err(TryRecvError::Empty),
        }
    }

    /// Convert into a stream of received values
    ///
    /// The stream yields buffered values newest-first, suspending between items exactly
    /// as [`recv`](Self::recv) does, and terminates permanently once all senders are
    /// dropped and the buffer is drained.
    #[cfg(feature = "futures")]
    pub fn into_stream(self) -> RecvStream<T> {
        RecvStream {
            receiver: self,
            fut: None,
            done: false,
        }
    }

    /// Maximum number of values the channel buffers
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    /// Number of values currently buffered
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer is currently empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether all sender handles have been dropped
    ///
    /// Buffered values remain receivable after this returns true; receive attempts only
    /// report end-of-stream once the buffer is also drained.
    pub fn is_closed(&self) -> bool {
        self.0.send_count().load(Relaxed) == 0
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Receiver(clone_receiver(&self.0))
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        drop_receiver(&self.0);
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver").finish_non_exhaustive()
    }
}


// future types for channels.
pub(crate) mod future {
    use super::*;
    use crate::channel::waiters::WaiterToken;
    use std::{
        future::Future,
        pin::Pin,
        task::{Context, Poll},
    };

    /// Future for sending into a [`Sender`]
    ///
    /// The value is not buffered until this future resolves. If the future has not yet
    /// resolved, the send may be aborted and its value retrieved by calling
    /// [`cancel`](Self::cancel) (or abandoned by dropping).
    ///
    /// For purposes of closing the channel, this future counts as a live sender until it
    /// is dropped.
    pub struct SendFut<T> {
        channel: core::Channel<T>,
        value: Option<T>,
        token: Option<WaiterToken>,
        done: bool,
    }

    impl<T> Unpin for SendFut<T> {}

    impl<T> SendFut<T> {
        pub(super) fn new(channel: core::Channel<T>, value: T) -> Self {
            SendFut {
                channel,
                value: Some(value),
                token: None,
                done: false,
            }
        }

        /// Abort the send operation and take back the value, if it has not resolved yet
        ///
        /// Returns `Some` if and only if this future has not yet resolved or cancelled.
        /// Polling the future afterwards returns `Poll::Pending` forever.
        pub fn cancel(&mut self) -> Option<T> {
            if let Some(token) = self.token.take() {
                self.channel.cancel_send(token);
            }
            let value = self.value.take();
            if value.is_some() {
                self.done = true;
            }
            value
        }

        /// Whether this future has already resolved or cancelled
        pub fn is_terminated(&self) -> bool {
            self.done
        }
    }

    impl<T> Future for SendFut<T> {
        type Output = Result<(), SendError<T>>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
            let this = self.get_mut();
            // for implementation of FusedFuture
            if this.done {
                return Poll::Pending;
            }
            let polled = this.channel.poll_push(&mut this.value, &mut this.token, cx);
            if polled.is_ready() {
                this.done = true;
            }
            polled
        }
    }

    #[cfg(feature = "futures")]
    impl<T> futures::future::FusedFuture for SendFut<T> {
        fn is_terminated(&self) -> bool {
            Self::is_terminated(self)
        }
    }

    impl<T> Drop for SendFut<T> {
        fn drop(&mut self) {
            if let Some(token) = self.token.take() {
                self.channel.cancel_send(token);
            }
            drop_sender(&self.channel);
        }
    }

    /// Future for receiving from a [`Receiver`]
    ///
    /// Resolves to `None` to represent end-of-stream: all senders dropped and the buffer
    /// drained. End-of-stream is terminal for the channel, so every receive operation
    /// created afterwards also resolves to `None`.
    ///
    /// A value is not taken from the channel until this future resolves. If the future
    /// has not yet resolved, the receive may be aborted by calling
    /// [`cancel`](Self::cancel) (or by dropping).
    ///
    /// For purposes of closing the channel, this future counts as a live receiver until
    /// it is dropped.
    pub struct RecvFut<T> {
        channel: core::Channel<T>,
        token: Option<WaiterToken>,
        done: bool,
    }

    impl<T> Unpin for RecvFut<T> {}

    impl<T> RecvFut<T> {
        pub(super) fn new(channel: core::Channel<T>) -> Self {
            RecvFut {
                channel,
                token: None,
                done: false,
            }
        }

        /// Abort the receive operation, if it has not resolved yet
        ///
        /// Returns true if and only if this future had not yet resolved or cancelled.
        /// Polling the future afterwards returns `Poll::Pending` forever.
        pub fn cancel(&mut self) -> bool {
            if self.done {
                return false;
            }
            if let Some(token) = self.token.take() {
                self.channel.cancel_recv(token);
            }
            self.done = true;
            true
        }

        /// Whether this future has already resolved or cancelled
        pub fn is_terminated(&self) -> bool {
            self.done
        }
    }

    impl<T> Future for RecvFut<T> {
        type Output = Option<T>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
            let this = self.get_mut();
            // for implementation of FusedFuture
            if this.done {
                return Poll::Pending;
            }
            let polled = this.channel.poll_pop(&mut this.token, cx);
            if polled.is_ready() {
                this.done = true;
            }
            polled
        }
    }

    #[cfg(feature = "futures")]
    impl<T> futures::future::FusedFuture for RecvFut<T> {
        fn is_terminated(&self) -> bool {
            Self::is_terminated(self)
        }
    }

    impl<T> Drop for RecvFut<T> {
        fn drop(&mut self) {
            if let Some(token) = self.token.take() {
                self.channel.cancel_recv(token);
            }
            drop_receiver(&self.channel);
        }
    }

    /// Stream of values received from a [`Receiver`]
    ///
    /// Yields buffered values newest-first. Terminates permanently once all senders are
    /// dropped and the buffer is drained: after yielding `None` once, the stream never
    /// yields again.
    #[cfg(feature = "futures")]
    pub struct RecvStream<T> {
        pub(super) receiver: Receiver<T>,
        pub(super) fut: Option<RecvFut<T>>,
        pub(super) done: bool,
    }

    #[cfg(feature = "futures")]
    impl<T> Unpin for RecvStream<T> {}

    #[cfg(feature = "futures")]
    impl<T> RecvStream<T> {
        /// Recover the receiver handle, abandoning any receive in progress
        pub fn into_receiver(self) -> Receiver<T> {
            self.receiver
        }
    }

    #[cfg(feature = "futures")]
    impl<T> futures::stream::Stream for RecvStream<T> {
        type Item = T;

        fn poll_next(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<T>> {
            let this = self.get_mut();
            if this.done {
                return Poll::Ready(None);
            }
            let fut = this.fut.get_or_insert_with(|| this.receiver.recv());
            match Pin::new(fut).poll(cx) {
                Poll::Ready(item) => {
                    this.fut = None;
                    if item.is_none() {
                        this.done = true;
                    }
                    Poll::Ready(item)
                }
                Poll::Pending => Poll::Pending,
            }
        }
    }

    #[cfg(feature = "futures")]
    impl<T> futures::stream::FusedStream for RecvStream<T> {
        fn is_terminated(&self) -> bool {
            self.done
        }
    }
}


// ==== tests ====
