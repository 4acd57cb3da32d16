//! Background tasks tied to the server's lifetime.

mod scheduler;

pub use scheduler::PublishRunner;
