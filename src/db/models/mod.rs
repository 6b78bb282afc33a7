mod appointment;
mod availability;
mod user;

pub use appointment::*;
pub use availability::*;
pub use user::*;
