//! Actions and the stream that broadcasts them to watchers.
//!
//! - [`Action`] typed tag plus optional payload
//! - [`ActionStream`] broadcast channel shared by all watchers (read-only for them)

mod action;
mod stream;

pub use action::Action;
pub use stream::ActionStream;
