//! Dodel - a small ranked social feed.
//!
//! This crate provides both a CLI application and a library for storing
//! posts and votes, ranking a feed, and persisting state as JSON snapshots.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod domain;
pub mod error;
pub mod id_generation;
pub mod storage;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

// Application context and output formatting
pub mod app;
pub mod output;
