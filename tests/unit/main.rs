//! Unit tests for sideload CLI
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod helpers;
mod install_service;
