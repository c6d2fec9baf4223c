pub mod api;
pub mod app;
pub mod chat;
pub mod login;
pub mod poll;
pub mod router;
pub mod storage;
pub mod utils;

#[cfg(feature = "gui")]
pub mod ui;
