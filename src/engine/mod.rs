pub mod lifecycle;

pub use lifecycle::derive_status;
