//! Per-trip seat coordination: the ledger, the lock manager, booking
//! finalization and the trip event channel.
//!
//! Every mutation of a trip's seats happens while holding that trip's
//! critical section (see [`channel::TripChannel::enter`]); events are
//! published from inside it, so subscribers see mutations in commit order.

pub mod channel;
pub mod finalizer;
pub mod ledger;
pub mod locks;
pub mod registry;
pub mod settings;

pub use channel::{Subscription, TripChannel};
pub use finalizer::BookingFinalizer;
pub use ledger::{LedgerError, SeatLedger};
pub use locks::{LockGrant, LockManager, UnlockOutcome};
pub use registry::{SeatRegistry, SeatSnapshot};
pub use settings::SeatSettings;

#[cfg(test)]
pub(crate) mod test_support;
