//! Profile service: HTTP CRUD for user profiles backed by an external auth
//! provider, a document store and object storage.

pub mod config;
pub mod core;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod startup;
