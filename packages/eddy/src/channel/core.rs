// synchronized core of the channel. the exposed API is a convenience wrapper around this.
//
// every operation takes the mutex at most once and never holds it across a suspension
// point: an operation that must wait registers itself in a waiter queue and releases the
// lock before returning Pending. no waker is invoked while the lock is held; operations
// collect the wakers they need to fire and invoke them after the guard is dropped.

use super::{
    error::{SendError, TryRecvError, TrySendError},
    stack::BoundedStack,
    waiters::{WaiterQueue, WaiterToken},
};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering::Relaxed},
        Arc,
        Mutex,
    },
    task::{Context, Poll},
};

// handle to a channel.
pub(crate) struct Channel<T>(Arc<Shared<T>>);

// channel shared state.
struct Shared<T> {
    // mutex around lockable state.
    lockable: Mutex<Lockable<T>>,

    // live sender count, including unresolved send futures.
    send_count: AtomicU64,
    // live receiver count, including unresolved recv futures.
    recv_count: AtomicU64,
}

// channel lockable state.
struct Lockable<T> {
    // storage for buffered elements. push and pop share an end, so the channel is LIFO.
    elems: BoundedStack<T>,
    // waiter queue for send futures blocked on a full buffer.
    send_waiters: WaiterQueue,
    // waiter queue for recv futures blocked on an empty buffer.
    recv_waiters: WaiterQueue,
}

impl<T> Channel<T> {
    // construct empty channel with send and recv counts of 1.
    pub(crate) fn new(capacity: usize) -> Self {
        Channel(Arc::new(Shared {
            lockable: Mutex::new(Lockable {
                elems: BoundedStack::new(capacity),
                send_waiters: WaiterQueue::new(),
                recv_waiters: WaiterQueue::new(),
            }),
            send_count: AtomicU64::new(1),
            recv_count: AtomicU64::new(1),
        }))
    }

    pub(crate) fn send_count(&self) -> &AtomicU64 {
        &self.0.send_count
    }

    pub(crate) fn recv_count(&self) -> &AtomicU64 {
        &self.0.recv_count
    }

    pub(crate) fn capacity(&self) -> usize {
        self.0.lockable.lock().unwrap().elems.capacity()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.lockable.lock().unwrap().elems.len()
    }

    // non-suspending push.
    pub(crate) fn try_push(&self, elem: T) -> Result<(), TrySendError<T>> {
        let waker;
        {
            let mut lock = self.0.lockable.lock().unwrap();
            if self.0.recv_count.load(Relaxed) == 0 {
                return Err(TrySendError::Closed(elem));
            }
            if lock.elems.is_full() {
                return Err(TrySendError::Full(elem));
            }
            lock.elems.push(elem);
            waker = lock.recv_waiters.wake_one();
        }
        if let Some(waker) = waker {
            waker.wake();
        }
        Ok(())
    }

    // non-suspending pop of the most recently pushed element.
    pub(crate) fn try_pop(&self) -> Result<T, TryRecvError> {
        let elem;
        let waker;
        {
            let mut lock = self.0.lockable.lock().unwrap();
            match lock.elems.pop() {
                Some(popped) => {
                    elem = popped;
                    waker = lock.send_waiters.wake_one();
                }
                None => {
                    return Err(if self.0.send_count.load(Relaxed) == 0 {
                        TryRecvError::Closed
                    } else {
                        TryRecvError::Empty
                    });
                }
            }
        }
        if let Some(waker) = waker {
            waker.wake();
        }
        Ok(elem)
    }

    // suspending push path, driven by a send future. `elem` is taken once the operation
    // completes, `token` tracks the future's waiter registration.
    //
    // panics if polled again after completing.
    pub(crate) fn poll_push(
        &self,
        elem: &mut Option<T>,
        token: &mut Option<WaiterToken>,
        cx: &mut Context,
    ) -> Poll<Result<(), SendError<T>>> {
        let waker;
        {
            let mut lock = self.0.lockable.lock().unwrap();

            if self.0.recv_count.load(Relaxed) == 0 {
                // our waiter entry, if any, was drained when the last receiver dropped
                *token = None;
                let value = elem.take().expect("send future polled after completion");
                return Poll::Ready(Err(SendError { value }));
            }

            if lock.elems.is_full() {
                match *token {
                    Some(token) if lock.send_waiters.rearm(token, cx.waker()) => {}
                    _ => *token = Some(lock.send_waiters.register(cx.waker())),
                }
                return Poll::Pending;
            }

            lock.elems.push(elem.take().expect("send future polled after completion"));
            if let Some(token) = token.take() {
                lock.send_waiters.remove(token);
            }
            waker = lock.recv_waiters.wake_one();
        }
        if let Some(waker) = waker {
            waker.wake();
        }
        Poll::Ready(Ok(()))
    }

    // suspending pop path, driven by a recv future. resolves None exactly when the buffer
    // is empty and no senders remain.
    pub(crate) fn poll_pop(
        &self,
        token: &mut Option<WaiterToken>,
        cx: &mut Context,
    ) -> Poll<Option<T>> {
        let elem;
        let waker;
        {
            let mut lock = self.0.lockable.lock().unwrap();

            match lock.elems.pop() {
                Some(popped) => {
                    elem = popped;
                    if let Some(token) = token.take() {
                        lock.recv_waiters.remove(token);
                    }
                    waker = lock.send_waiters.wake_one();
                }
                None => {
                    if self.0.send_count.load(Relaxed) == 0 {
                        *token = None;
                        return Poll::Ready(None);
                    }
                    match *token {
                        Some(token) if lock.recv_waiters.rearm(token, cx.waker()) => {}
                        _ => *token = Some(lock.recv_waiters.register(cx.waker())),
                    }
                    return Poll::Pending;
                }
            }
        }
        if let Some(waker) = waker {
            waker.wake();
        }
        Poll::Ready(Some(elem))
    }

    // abandon a registered send operation. if a wakeup had been spent on it and there is
    // still space, the wakeup is passed to the next waiting sender.
    pub(crate) fn cancel_send(&self, token: WaiterToken) {
        let waker;
        {
            let mut lock = self.0.lockable.lock().unwrap();
            let spent = matches!(lock.send_waiters.remove(token), Some(None));
            waker = if spent && !lock.elems.is_full() {
                lock.send_waiters.wake_one()
            } else {
                None
            };
        }
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    // abandon a registered recv operation. if a wakeup had been spent on it and a value
    // is still buffered, the wakeup is passed to the next waiting receiver.
    pub(crate) fn cancel_recv(&self, token: WaiterToken) {
        let waker;
        {
            let mut lock = self.0.lockable.lock().unwrap();
            let spent = matches!(lock.recv_waiters.remove(token), Some(None));
            waker = if spent && !lock.elems.is_empty() {
                lock.recv_waiters.wake_one()
            } else {
                None
            };
        }
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    // called after the send count reaches zero. receivers drain whatever is buffered and
    // then observe end-of-stream.
    pub(crate) fn close_send_side(&self) {
        let wakers = self.0.lockable.lock().unwrap().recv_waiters.wake_all();
        for waker in wakers {
            waker.wake();
        }
    }

    // called after the recv count reaches zero. every pending and future send fails and
    // hands its element back.
    pub(crate) fn close_recv_side(&self) {
        let wakers = self.0.lockable.lock().unwrap().send_waiters.wake_all();
        for waker in wakers {
            waker.wake();
        }
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel(Arc::clone(&self.0))
    }
}
