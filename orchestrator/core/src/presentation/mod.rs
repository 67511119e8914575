// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`pairwise-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. No business logic lives here; evaluation work is delegated to
//! `crate::application`.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | `POST /ai` evaluation endpoint and `GET /health` |

pub mod api;
