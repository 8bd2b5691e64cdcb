//! Wire and data model shared by the spurchat crates.
//!
//! The run types mirror the JSON served by a Spur workflow backend; the chat
//! types are what the presentation layer renders and are exported to
//! TypeScript through [`generate_typescript_definitions`].

pub mod chat;
pub mod run;
pub mod typescript_gen;

pub use typescript_gen::{generate_typescript_definitions, write_typescript_bindings};

pub use chat::{ChatInputs, ChatMessage, Role, CHAT_INPUT_NODE};
pub use run::{
    NodeOutputs, RunInputs, RunMode, RunState, RunStatusResponse, StartRunRequest,
    StartRunResponse, Task, TaskState, WorkflowDefinition, WorkflowLink, WorkflowNode,
    WorkflowVersion, OUTPUT_NODE_TYPE,
};
