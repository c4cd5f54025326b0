// blocking layer for channel futures.
//
// design based on the pollster crate: poll the future on the calling thread, parking on a
// mutex + condvar signal between polls. the waker hands out an Arc of the signal, so a
// waker still registered in the channel when a timed-out future is dropped stays valid.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Condvar, Mutex},
    task::{Context, Poll, Wake, Waker},
    time::Instant,
};

// deadline for blocking on a future.
pub(crate) enum Timeout {
    // never time out.
    Never,
    // time out at the given deadline.
    At(Instant),
}

// poll the future on the calling thread until it resolves or the deadline passes. on
// timeout the future is handed back so the caller can cancel it and recover its state.
pub(crate) fn block_on<F>(mut fut: F, timeout: Timeout) -> Result<F::Output, F>
where
    F: Future + Unpin,
{
    let signal = Arc::new(Signal {
        state: Mutex::new(State::Empty),
        cond: Condvar::new(),
    });
    let waker = Waker::from(Arc::clone(&signal));
    let mut cx = Context::from_waker(&waker);

    loop {
        if let Poll::Ready(output) = Pin::new(&mut fut).poll(&mut cx) {
            return Ok(output);
        }
        if !signal.wait(&timeout) {
            return Err(fut);
        }
    }
}

// synchronization signal state
enum State {
    Empty,
    Waiting,
    Notified,
}

// synchronization signal
struct Signal {
    state: Mutex<State>,
    cond: Condvar,
}

impl Signal {
    // block until notified or the deadline passes. returns false on timeout.
    fn wait(&self, timeout: &Timeout) -> bool {
        let mut lock = self.state.lock().unwrap();

        // if a notification is already present, consume it without blocking.
        if let State::Notified = *lock {
            *lock = State::Empty;
            return true;
        }

        debug_assert!(matches!(*lock, State::Empty));
        *lock = State::Waiting;
        match timeout {
            &Timeout::Never => {
                while let State::Waiting = *lock {
                    lock = self.cond.wait(lock).unwrap();
                }
            }
            &Timeout::At(deadline) => {
                while let State::Waiting = *lock {
                    let Some(remaining) = deadline.checked_duration_since(Instant::now())
                        else {
                            *lock = State::Empty;
                            return false;
                        };
                    let (guard, result) = self.cond.wait_timeout(lock, remaining).unwrap();
                    lock = guard;
                    if result.timed_out() {
                        if let State::Waiting = *lock {
                            *lock = State::Empty;
                            return false;
                        }
                    }
                }
            }
        }
        *lock = State::Empty;
        true
    }
}

impl Wake for Signal {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        let mut lock = self.state.lock().unwrap();
        match *lock {
            State::Notified => (),
            State::Empty => {
                *lock = State::Notified;
            }
            State::Waiting => {
                *lock = State::Empty;
                self.cond.notify_one();
            }
        }
    }
}
