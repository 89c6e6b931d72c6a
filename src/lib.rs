pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod state;

pub use app::{app, build_state, serve};
pub use state::AppState;
