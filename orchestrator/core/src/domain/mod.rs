// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Provides the domain model of the pairwise evaluator.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Value objects, errors and ports shared by all layers

pub mod evaluation;
pub mod llm;
pub mod model_config;
pub mod prompt_template;
pub mod provider;
pub mod repository;
pub mod service_config;
