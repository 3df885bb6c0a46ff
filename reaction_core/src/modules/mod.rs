pub mod cache;
pub mod config;
pub mod control;
pub mod engine;
pub mod events;
pub mod feed;
pub mod gesture;
pub mod listeners;
pub mod remote;
pub mod session;
