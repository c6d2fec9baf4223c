pub mod client;
pub mod error;
pub mod events;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{GreenApiClient, MessagingApi};
pub use error::ApiError;
pub use events::Notification;
pub use models::{Credentials, Message};
