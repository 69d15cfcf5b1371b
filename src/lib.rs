pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod posts;
pub mod state;
pub mod storage;
pub mod uploads;
