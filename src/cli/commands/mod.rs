pub mod chat;
pub mod config;
pub mod context;
pub mod history;
pub mod overrides;
pub mod search;
pub mod serve;
pub mod sessions;
pub mod status;
