// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Pairwise evaluation core: compares two candidate responses to a user
//! question by asking an LLM provider, and stores the provider's answer.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, provider adapters, store access and HTTP surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
