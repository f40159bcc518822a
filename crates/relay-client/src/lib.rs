//! `relay-client`: the browser-side half of relay, as a Rust library.
//!
//! Two pieces, usable together or alone:
//!
//! ```text
//! ChatSession        ← optimistic sends against /api/messages and /api/command
//!     │                 temporaries reconciled on refresh
//!     ▼
//! MessageCache       (relay-core)
//!
//! ConnectionManager  ← /ws socket task: ping every interval, reconnect with
//!     │                 exponential backoff, give up after max attempts
//!     ▼
//! EventBus           (relay-core) connection_status + <service>_message events
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use relay_client::{ChatSession, ConnectionManager, RealtimeSettings};
//! use relay_core::bus::{EventBus, EventKind};
//!
//! let bus = EventBus::new();
//! let _sub = bus.subscribe(EventKind::InboundMessage, |e| println!("{}: {}", e.source, e.payload));
//! let realtime = ConnectionManager::new("ws://localhost:3141/ws", bus, RealtimeSettings::default());
//! realtime.connect();
//!
//! let chat = ChatSession::new("http://localhost:3141");
//! let reply = chat.send_command("/shopify today_sales").await?;
//! println!("{}", reply.display_text());
//! ```

pub mod backoff;
pub mod chat;
pub mod connection;
pub mod error;
pub mod heartbeat;

pub use backoff::ReconnectPolicy;
pub use chat::ChatSession;
pub use connection::{ConnectionManager, RealtimeSettings};
pub use error::ClientError;

pub type Result<T> = std::result::Result<T, ClientError>;
