// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pairwise CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Command handlers, HTTP service bootstrap and in-process evaluation

pub mod commands;
pub mod daemon;
pub mod embedded;
