// waiter registry part of a channel.
//
// each suspended send or recv operation registers itself here while it waits for a state
// change. entries are kept in the order operations first went to sleep. an entry whose
// waker has been taken (a wakeup was "spent" on it) stays registered until its operation
// completes or cancels, which lets the channel pass a spent wakeup on to the next waiter
// when the woken operation is cancelled instead of retried.

use smallvec::SmallVec;
use std::{
    collections::VecDeque,
    task::Waker,
};

/// Identifier for a registered waiter, held by the waiting future
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct WaiterToken(u64);

struct Waiter {
    token: WaiterToken,
    // cleared when a wakeup is spent on this waiter, re-set when its operation re-polls.
    waker: Option<Waker>,
}

#[derive(Default)]
pub(crate) struct WaiterQueue {
    waiters: VecDeque<Waiter>,
    next_token: u64,
}

impl WaiterQueue {
    // construct empty queue.
    pub(crate) fn new() -> Self {
        WaiterQueue::default()
    }

    // register a new waiter at the back of the queue.
    pub(crate) fn register(&mut self, waker: &Waker) -> WaiterToken {
        let token = WaiterToken(self.next_token);
        self.next_token += 1;
        self.waiters.push_back(Waiter { token, waker: Some(waker.clone()) });
        token
    }

    // re-arm an existing waiter with a fresh waker. returns false if the waiter is no
    // longer registered.
    pub(crate) fn rearm(&mut self, token: WaiterToken, waker: &Waker) -> bool {
        if let Some(waiter) = self.waiters.iter_mut().find(|waiter| waiter.token == token) {
            waiter.waker = Some(waker.clone());
            true
        } else {
            false
        }
    }

    // unregister a waiter.
    //
    // - outer None: the token is no longer registered (already removed, or drained by
    //   wake_all).
    // - inner None: a wakeup had been spent on the waiter and it never re-polled. the
    //   caller should consider passing the wakeup on.
    pub(crate) fn remove(&mut self, token: WaiterToken) -> Option<Option<Waker>> {
        let idx = self.waiters.iter().position(|waiter| waiter.token == token)?;
        self.waiters.remove(idx).map(|waiter| waiter.waker)
    }

    // take the waker of the first waiter that still has one. the waiter stays registered
    // until its operation completes or cancels.
    //
    // the returned waker must be woken only after the channel lock is released.
    pub(crate) fn wake_one(&mut self) -> Option<Waker> {
        self.waiters.iter_mut().find_map(|waiter| waiter.waker.take())
    }

    // unregister every waiter, returning the pending wakers so the caller can wake them
    // all after releasing the channel lock.
    pub(crate) fn wake_all(&mut self) -> SmallVec<[Waker; 8]> {
        self.waiters.drain(..).filter_map(|waiter| waiter.waker).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use std::task::Wake;

    struct CountingWake(AtomicUsize);

    impl Wake for CountingWake {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_waker() -> (Arc<CountingWake>, Waker) {
        let count = Arc::new(CountingWake(AtomicUsize::new(0)));
        let waker = Waker::from(Arc::clone(&count));
        (count, waker)
    }

    #[test]
    fn wake_one_skips_spent_waiters() {
        let mut queue = WaiterQueue::new();
        let (count_1, waker_1) = counting_waker();
        let (count_2, waker_2) = counting_waker();
        queue.register(&waker_1);
        queue.register(&waker_2);

        queue.wake_one().unwrap().wake();
        assert_eq!(count_1.0.load(Ordering::SeqCst), 1);
        assert_eq!(count_2.0.load(Ordering::SeqCst), 0);

        queue.wake_one().unwrap().wake();
        assert_eq!(count_1.0.load(Ordering::SeqCst), 1);
        assert_eq!(count_2.0.load(Ordering::SeqCst), 1);

        assert!(queue.wake_one().is_none());
        assert_eq!(queue.waiters.len(), 2);
    }

    #[test]
    fn rearm_restores_a_spent_waiter() {
        let mut queue = WaiterQueue::new();
        let (count, waker) = counting_waker();
        let token = queue.register(&waker);

        queue.wake_one().unwrap().wake();
        assert!(queue.wake_one().is_none());

        assert!(queue.rearm(token, &waker));
        queue.wake_one().unwrap().wake();
        assert_eq!(count.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn remove_reports_spent_wakeups() {
        let mut queue = WaiterQueue::new();
        let (_, waker) = counting_waker();
        let spent = queue.register(&waker);
        let fresh = queue.register(&waker);

        queue.wake_one();
        assert!(matches!(queue.remove(spent), Some(None)));
        assert!(matches!(queue.remove(fresh), Some(Some(_))));
        assert!(matches!(queue.remove(fresh), None));
        assert!(!queue.rearm(fresh, &waker));
        assert_eq!(queue.waiters.len(), 0);
    }

    #[test]
    fn wake_all_drains_the_queue() {
        let mut queue = WaiterQueue::new();
        let (count_1, waker_1) = counting_waker();
        let (count_2, waker_2) = counting_waker();
        let (count_3, waker_3) = counting_waker();
        queue.register(&waker_1);
        queue.register(&waker_2);
        queue.register(&waker_3);

        // first waiter already has its wakeup spent
        queue.wake_one().unwrap().wake();

        let wakers = queue.wake_all();
        assert_eq!(wakers.len(), 2);
        for waker in wakers {
            waker.wake();
        }
        assert_eq!(queue.waiters.len(), 0);
        assert_eq!(count_1.0.load(Ordering::SeqCst), 1);
        assert_eq!(count_2.0.load(Ordering::SeqCst), 1);
        assert_eq!(count_3.0.load(Ordering::SeqCst), 1);
    }
}
