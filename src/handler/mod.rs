pub mod auth;
pub mod chat;
pub mod jobs;
pub mod market;
pub mod notifications;
pub mod users;
pub mod webhooks;
