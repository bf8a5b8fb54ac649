pub mod api;
pub mod config;
pub mod contact;
pub mod content;
pub mod db;
pub mod fallback;
pub mod model;
pub mod outbox;
pub mod query;
pub mod render;
pub mod session;
pub mod views;
