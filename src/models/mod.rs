pub mod enquiry;
pub mod event;
pub mod resume;
pub mod subscriber;

pub use enquiry::Enquiry;
pub use event::{Event, EventStatus, RequestedStatus};
pub use resume::Resume;
pub use subscriber::Subscriber;
