pub mod command;
pub mod connections;
pub mod events;
pub mod messages;
pub mod notifications;
pub mod tools;
pub mod webhooks;
pub mod ws;
