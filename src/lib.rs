//! Session Monitor - Live observer for a single compute session.
//!
//! This crate subscribes to a filtered event feed, folds session events
//! into a running summary, and releases its subscription once the session
//! reaches a terminal status.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
