//! Integration tests with mock HTTP server

mod chat;
mod error_handling;
mod mock_server;
mod streaming;
