pub mod attachment;
pub mod error;
pub mod message;
pub mod message_operations;
pub mod participant;
pub mod room;
pub mod user;

#[cfg(test)]
mod message_operations_tests;

pub use attachment::AttachmentRepository;
pub use error::RepositoryError;
pub use message::{MessagePage, MessageRepository};
pub use message_operations::MessageOperations;
pub use participant::ParticipantRepository;
pub use room::RoomRepository;
pub use user::UserRepository;
