pub mod config;
pub mod dialogue;
pub mod llm;
pub mod prompts;
pub mod retrieve;
pub mod search;
pub mod server;
pub mod tools;
pub mod trust;
pub mod types;
