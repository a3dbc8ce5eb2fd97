//! Newsdesk - admin backend for news and announcement posts
//!
//! This library provides the post storage, business rules and HTTP API of
//! the admin panel, plus the client-side pieces the panel is built from:
//! the paginated list state, the two-step submission wizard and an HTTP
//! client for the API.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod query;
pub mod services;
pub mod wizard;
