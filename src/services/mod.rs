pub mod clock;
pub mod email;
pub mod event_service;
pub mod file_storage;
pub mod paging;

pub use clock::{Clock, SystemClock};
pub use email::{EmailSender, EmailTemplate, HttpEmailSender, LogEmailSender};
pub use event_service::{EventPage, EventService};
pub use file_storage::{FileStorage, FileUpload, LocalFileStorage, UploadPolicy};
pub use paging::{Page, Paging};
