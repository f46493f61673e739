pub mod activity;
pub mod payment;
pub mod session;
pub mod slot;
pub mod ticket;
pub mod user;
pub mod violation;

pub use activity::{ActivityLevel, ParkActivity};
pub use payment::Payment;
pub use session::Session;
pub use slot::Slot;
pub use ticket::{Ticket, TicketStatus};
pub use user::User;
pub use violation::Violation;
