//! # Spur Chat
//!
//! Chat front-end core for Spur workflows. A [`RunPoller`] turns each chat
//! message into a workflow run, polls the run until it finishes and resolves
//! the workflow's output node into an assistant reply. Every failure still
//! resolves to a displayable message, so callers never handle errors from
//! [`RunPoller::execute`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use spur_chat::{PollerConfig, RunPoller};
//! use spur_sdk::SpurClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SpurClient::new()?;
//!     let poller = RunPoller::new(Arc::new(client), PollerConfig::default())?
//!         .with_workflow_id("S1");
//!
//!     let outcome = poller.execute("What's the weather like?").await;
//!     if let Some(reply) = outcome.message() {
//!         println!("{}: {}", reply.role, reply.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod outcome;
pub mod poller;
pub mod resolution;
pub mod session;
pub mod timers;

pub use config::PollerConfig;
pub use error::ChatError;
pub use outcome::ChatOutcome;
pub use poller::{PollerPhase, PollerSnapshot, RunPoller};
pub use resolution::resolve_terminal_status;
pub use session::{generate_session_id, get_or_create_session_id, Conversation, SessionManager};
pub use timers::TimerSet;
