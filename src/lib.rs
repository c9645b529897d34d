//! Tradesync Library
//!
//! Local-first synchronization engine for trade journals: reconciles trade
//! records held in a local SQLite store with an authoritative remote backend.

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
