pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod conversation;
pub mod db;
pub mod identity;
pub mod llm;
pub mod stream;
