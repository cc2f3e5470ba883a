pub mod event;
pub mod response;
pub mod rsvp;
pub mod user;

pub use event::*;
pub use response::*;
pub use rsvp::*;
pub use user::*;
