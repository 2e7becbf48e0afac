//! # atlas-chat
//!
//! Session state for the NUCLEUS orchestrator chat.
//!
//! - [`ChatSession`] - append-only transcript with a pending flag
//! - [`ChatMessage`] - one transcript line
//! - [`ChatError`] - reasons a submission was ignored
//!
//! ## Example
//!
//! ```no_run
//! use atlas_api::ApiClient;
//! use atlas_chat::ChatSession;
//! use atlas_config::AtlasConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ApiClient::from_config(&AtlasConfig::default())?;
//! let mut session = ChatSession::new();
//!
//! let reply = session.send(&client, "How many subjects are processing?").await?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod message;
pub mod session;

pub use error::{ChatError, Result};
pub use message::{ChatEntry, ChatMessage, ChatRole, Delivery};
pub use session::{ChatSession, ERROR_REPLY, GREETING};
