//! HTTP front end of the tagbridge RFID bridge.
//!
//! Exposes the ILS bridge endpoints and reader discovery over axum. The
//! binary in `main.rs` only parses arguments, loads the configuration,
//! sets up logging, and serves [`routes::build_router`].
//!
//! # Endpoints
//!
//! - `GET /api/alma/getItems?reader_ip=..` - items on a reader (XML)
//! - `POST /api/alma/setSecurity` - set the security bit of one item (XML)
//! - `POST /api/alma/itemUpdate` - declare the desired state of one item (XML)
//! - `GET /api/readers` - readers discovered per middleware (JSON)

pub mod config;
pub mod handlers;
pub mod routes;
pub mod state;

pub use state::AppState;
