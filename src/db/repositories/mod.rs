mod appointment_repository;
mod availability_repository;
mod user_repository;

pub use appointment_repository::AppointmentRepository;
pub use availability_repository::AvailabilityRepository;
pub use user_repository::UserRepository;
