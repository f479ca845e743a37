// AiMan Core — engine library for the AiMan chat client.
// Authenticates a user, exchanges messages with a hosted completion
// endpoint, and persists conversation history locally. The rendering
// layer is a pure consumer of the state exposed here.

pub mod atoms;
pub mod engine;

pub use atoms::error::{AuthError, CompletionError, CoreError, CoreResult, VerificationError};
pub use atoms::types::*;
