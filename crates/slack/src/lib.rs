//! Slack integration for sirbot
//!
//! - **Events** (`events`) - Socket Mode envelopes and the message adapter
//! - **Socket Mode** (`socket`) - envelope pump with reconnection logic
//! - **Web API** (`api`) - `chat.postMessage`, `reactions.add`, `users.info`
//! - **Messages** (`message`) - reply drafts and legacy attachments
//! - **Handlers** (`handlers`) - the chat commands and background jobs
//!
//! # Architecture
//!
//! ```text
//! Socket Mode → parse_event → Dispatcher → Rules → Handlers → ChatApi
//!                                              ↓
//!                                QuoteApi / LinkChecker / Archive
//! ```

pub mod api;
pub mod context;
pub mod events;
pub mod handlers;
pub mod links;
pub mod message;
pub mod socket;

pub use api::{ChatApi, InMemoryChatApi, SlackWebClient};
pub use context::{Archive, BotContext, BotSettings};
pub use events::{parse_event, SlackEnvelope, SlackEvent};
pub use handlers::register_all;
pub use links::{HttpLinkChecker, LinkChecker, StaticLinkChecker};
pub use message::ResponseDraft;
pub use socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner, SocketTransport};
