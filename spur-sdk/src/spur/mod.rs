pub mod builder;
pub mod client;

pub use builder::RunBuilder;
pub use client::SpurClient;
