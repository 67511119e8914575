// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the pairwise CLI

pub mod config;
pub mod evaluate;
pub mod status;

pub use self::config::ConfigCommand;
pub use self::evaluate::EvaluateArgs;
