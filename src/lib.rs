//! Library crate for the fruit quiz backend: game core, storage, HTTP routes and client.

#[cfg(feature = "http-client")]
pub mod client;
pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
