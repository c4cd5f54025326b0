// implementation of the eddy channel.
//
// the basic architecture is as such:
//
// channel handles wrap around Arc<Mutex<shared state>>
//                                         |
//          /------------------------------/
//          v
//       shared state
//          |
//          |------ it contains a stack::BoundedStack<T>, a fixed-capacity, not-itself-
//          |       concurrent data structure used to hold the buffered elements. push and
//          |       pop act on the same end, which is what makes the channel LIFO.
//          |
//          |------ it contains a "send waiter queue":
//          |
//          |       a registry of pending send futures, in the order they first went to
//          |       sleep. each entry holds a token identifying the future and a slot for
//          |       its latest Waker. a pop wakes the first entry that still has a waker;
//          |       the woken future re-locks and re-checks state when it runs. entries are
//          |       removed when their future completes or is dropped, and a removed entry
//          |       that had already been woken passes the wakeup on, so a cancelled
//          |       operation never strands a free slot.
//          |
//          \------ it contains a "recv waiter queue", which is the same idea for recv
//                  futures.
//
// sender and receiver handle counts are atomics living outside the mutex, so cloning and
// dropping handles stays lock-free until a side actually closes. when a count hits zero
// the closing handle takes the mutex and drains the complementary waiter queue, waking
// everything in it; those futures then observe the closed state and resolve. wakers are
// never invoked while the mutex is held.
//
// blocking versions of operations are built as a layer on top of the futures in the
// polling module.
//
// the organization of these modules is as such:
//
//      These are used like
//      library utilities:
//    /--------------------\
//
//      stack<---------------core: fully synchronized inner layer. safe but panicky about
//                   |       ^     preconditions, and inconvenient to use directly.
//      waiters<-----/       |
//                           |
//      polling<-------------api: wrapper around core that adapts it into an API that is
//                                convenient and defensive. The crate re-exports this API
//                                publically.
//
// there is also the error module, which contains the relevant error types, which is also
// re-exported publically.

pub(crate) mod error;
pub(crate) mod api;

mod stack;
mod waiters;
mod polling;
mod core;
