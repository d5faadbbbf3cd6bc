//! Chat Exchange
//!
//! The conversation lives on the backend; this module keeps a client-side
//! view of it and runs the send-and-poll protocol.
//!
//! ## Modules
//!
//! - `exchange`: `ChatSession` with send, poll, refresh and watch
//! - `state`: view state, exchange phases and poll tuning

pub mod exchange;
pub mod state;

pub use exchange::{ChatSession, PendingReply, reply_arrived};
pub use state::{ChatView, ExchangePhase, PollConfig, PollOutcome, SharedView};
