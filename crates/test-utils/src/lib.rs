// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for sql-structure
//!
//! This crate provides common testing components including:
//! - Sample SQL statements covering the constructs the analyzer models
//! - Query tree assertions with readable failure messages

pub mod assertions;
pub mod fixtures;

// Re-exports for convenience
pub use assertions::TreeAssertions;
pub use fixtures::SqlFixtures;
