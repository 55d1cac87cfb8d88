pub mod api;
pub mod auth;
pub mod claims;
pub mod cli;
pub mod core;
pub mod directory;
pub mod notify;
