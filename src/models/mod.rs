pub mod consultation;
pub mod review;
pub mod time_slot;
pub mod user;

pub use consultation::{Consultation, ConsultationStatus, ConsultationType, PaymentStatus};
pub use review::Review;
pub use time_slot::{SlotStatus, TimeSlot};
pub use user::{Actor, Role, User};
