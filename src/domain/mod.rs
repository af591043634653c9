pub mod user;
pub mod appointment;
pub mod appointment_type;
pub mod payment;
pub mod content;
pub mod schedule;
pub mod error_log;

pub use user::*;
pub use appointment::*;
pub use appointment_type::*;
pub use payment::*;
pub use content::*;
pub use schedule::*;
pub use error_log::*;
