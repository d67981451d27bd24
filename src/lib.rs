pub mod config;
pub mod errors;
pub mod handler;
pub mod report;
pub mod security;
pub mod server;
pub mod solver;
pub mod telegram;
