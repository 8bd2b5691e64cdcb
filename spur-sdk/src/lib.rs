//! # Spur SDK
//!
//! Client for a Spur workflow execution backend: start a workflow run, then
//! query its status until it reaches a terminal state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use spur_sdk::spur::SpurClient;
//! use spur_types::{ChatInputs, RunMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SpurClient::new()?.with_base_url("http://localhost:6080/api");
//!     let run = client
//!         .run_builder("S1")
//!         .chat_inputs(ChatInputs::new("Hello!", "chat_session_1_abc"))
//!         .run_mode(RunMode::Interactive)
//!         .send()
//!         .await?;
//!
//!     let status = client.fetch_run_status(&run.id).await?;
//!     println!("Run {} is {}", run.id, status.status);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod spur;

pub use client::ExecutionService;
pub use error::SdkError;
pub use spur::SpurClient;
