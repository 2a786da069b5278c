pub mod appointments;
pub mod response;
pub mod slots;
pub mod users;
