//! HTTP handlers

pub mod admin;
pub mod empresas;
pub mod ping;
pub mod stats;

pub use ping::ping;
