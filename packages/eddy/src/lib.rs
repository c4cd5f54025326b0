//! Bounded, stack-ordered (last-in-first-out) async channel.
//!
//! Created by calling [`channel`], which returns a linked [`Sender`]/[`Receiver`] pair.
//! Receivers always take the most recently sent value still buffered. Each side closes
//! when its last handle is dropped; there is no explicit close call.

#[macro_use]
extern crate tracing;

mod channel;

pub use crate::channel::api::*;

/// Error types
pub mod error {
    pub use crate::channel::error::*;
}

/// Future types
pub mod future {
    pub use crate::channel::api::future::*;
}
