//! Client-side mirror of a trip's seat map.
//!
//! [`ClientView`] is derived only from server messages; [`SyncAgent`] wraps it
//! with the connection lifecycle and the advisory session countdown.

pub mod agent;
pub mod countdown;
pub mod view;

pub use agent::{SyncAgent, SyncState};
pub use countdown::Countdown;
pub use view::{reconcile, ClientView, SeatView};
