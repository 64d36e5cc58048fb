pub mod booking;
pub mod cancellation;
pub mod reviews;
pub mod settlement;
pub mod slots;

pub use booking::ReservationEngine;
pub use cancellation::{CancellationEngine, CancellationOutcome};
pub use reviews::Reviews;
pub use settlement::SettlementEngine;
pub use slots::SlotGenerator;
