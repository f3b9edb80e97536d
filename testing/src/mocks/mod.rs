//! In-memory implementations of the boxoffice store traits.
//!
//! These are encapsulated instances: each store owns its state, handed in or
//! built by its constructor. Clones share state, so a test can keep a handle
//! for assertions while the workflow holds another.
//!
//! | Trait | Implementation |
//! |-------|----------------|
//! | `InventoryStore` + `EventRepository` | [`InMemoryInventoryStore`] |
//! | `OrderLedger` | [`InMemoryOrderLedger`] |
//! | `Clock` | [`FixedClock`], [`SteppingClock`] |

mod clock;
mod inventory;
mod ledger;

pub use clock::{FixedClock, SteppingClock, test_clock};
pub use inventory::InMemoryInventoryStore;
pub use ledger::InMemoryOrderLedger;
