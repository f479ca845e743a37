// AiMan Engine — the working modules behind the chat client.
// Control flow: auth gate → (login | verification → registration) →
// chat turn controller reads/writes the conversation store through the
// storage adapter.

pub mod app;
pub mod auth;
pub mod chat;
pub mod completion;
pub mod config;
pub mod mailer;
pub mod storage;
pub mod store;
pub mod verification;
