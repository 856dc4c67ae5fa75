pub mod enquiry_repository;
pub mod event_repository;
pub mod resume_repository;
pub mod subscriber_repository;

pub use enquiry_repository::EnquiryRepository;
pub use event_repository::{EventRepository, EventStore};
pub use resume_repository::{ResumeFilter, ResumeRepository};
pub use subscriber_repository::{SubscriberFilter, SubscriberRepository};
