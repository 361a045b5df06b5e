//! Tripmart API library.
//!
//! JSON REST backend for the Tripmart tourism marketplace: sellers list
//! products, tourists buy and review them, tour guides publish itineraries.
//! The binary in `main.rs` wires these modules into a server; the library
//! form lets the router be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
