// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layers.

use serde::Deserialize;

use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, EngineConfigLayer, HttpConfigLayer, LoggingConfigLayer,
};

/// One source's partial view of the configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub auth: Option<AuthConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub engine: Option<EngineConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge a higher-precedence layer into this one.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.auth, other.auth, AuthConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.engine, other.engine, EngineConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl Fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(base), Some(other)) => merge(base, other),
		(None, Some(other)) => *base = Some(other),
		_ => {}
	}
}
