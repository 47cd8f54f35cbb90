//! Course catalog - a lightweight course management service
//!
//! This library provides the core functionality for the course catalog:
//! persistence of courses, modules, lessons and group access links, ordered
//! position assignment, domain services and the RPC-style HTTP API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
