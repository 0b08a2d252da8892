// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod auth;
mod database;
mod engine;
mod http;
mod logging;

pub use auth::{AuthConfig, AuthConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer, RECOGNIZED_DB_TYPES};
pub use engine::{EngineConfig, EngineConfigLayer, Mode};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
