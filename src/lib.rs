//! # yocr-client
//!
//! Client-side support layer for the YOCR upload dashboard.
//!
//! This crate contains the environment-driven URL resolver, the command
//! helper for the uploads WebSocket channel, the toast notification store,
//! and the persisted light/dark theme controller. Host primitives (socket
//! transport, key/value storage, color-scheme query, document root) sit
//! behind small capability types so every piece runs outside a browser.

pub mod brand;
pub mod config;
pub mod notifications;
pub mod theme;
pub mod uploads;
