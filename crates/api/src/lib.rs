//! Hostdeck API library.
//!
//! This crate provides the API functionality as a library, allowing it to be
//! tested and reused. The `hostdeck-api` binary only loads configuration and
//! serves [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod registrar;
pub mod routes;
pub mod services;
pub mod state;
