//! Typed pub/sub event bus: queued single-consumer delivery, handler
//! exception isolation, and a bounded debug history ring.

pub mod bus;
pub mod event;

pub use bus::{EventBus, Handler};
pub use event::{Event, EventKind};
