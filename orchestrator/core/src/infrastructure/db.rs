// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Connection Pool
//!
//! Wraps `sqlx::postgres::PgPool` in a thin `Database` newtype that is
//! injected into the PostgreSQL evaluation store.
//!
//! The pool is created lazily: no connection is opened until the first
//! evaluation begins a session, so the daemon starts even when the database
//! is briefly unavailable and each request reports its own store error.

use crate::domain::service_config::{CredentialSource, DatabaseConfig};
use anyhow::{anyhow, Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let options = Self::connect_options(config)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
        let mut options = match &config.url {
            Some(url) => url
                .parse::<PgConnectOptions>()
                .context("Invalid database url")?,
            None => {
                let host = config
                    .host
                    .as_deref()
                    .ok_or_else(|| anyhow!("database.host or database.url is required"))?;
                let mut options = PgConnectOptions::new().host(host);
                if let Some(port) = config.port {
                    options = options.port(port);
                }
                if let Some(user) = &config.user {
                    options = options.username(user);
                }
                if let Some(password) = &config.password {
                    let password = CredentialSource::parse(password)
                        .resolve()
                        .map_err(|e| anyhow!("database.password: {}", e))?;
                    options = options.password(&password);
                }
                if let Some(database) = &config.database {
                    options = options.database(database);
                }
                options
            }
        };

        if let Some(schema) = &config.schema {
            options = options.options([("search_path", schema.as_str())]);
        }

        Ok(options.application_name("pairwise-orchestrator"))
    }
}
