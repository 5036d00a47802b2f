//! ticketgate server library
//!
//! Exposes the router, settings and application state so the HTTP flows
//! can be exercised end to end from integration tests.

pub mod api;
pub mod app_state;
pub mod http;
pub mod init_telemetry;
pub mod services;
pub mod settings;
pub mod stop_flag;

pub use app_state::AppState;
