//! Build-time configuration of the explorer.

use serde::Deserialize;

/// Key under which the chosen graph style is persisted.
pub const GRAPH_STYLE_KEY: &str = "graphStyle";

const DEFAULT_API_URL: &str = "http://localhost:8444/api";

/// Which deployment this bundle was built for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentVariant {
	/// The main public graph.
	#[default]
	Default,
	/// The Chile deployment, rendered with a tighter sphere.
	Chile,
}

impl DeploymentVariant {
	fn parse(raw: &str) -> Self {
		match raw.trim().to_ascii_lowercase().as_str() {
			"chile" | "cl" => Self::Chile,
			_ => Self::Default,
		}
	}
}

/// Settings the store and network layer are created with.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
	/// Deployment variant, selects the default graph radius.
	pub variant: DeploymentVariant,
	/// Base URL of the graph API, without trailing slash.
	pub api_url: String,
	/// Preference key the graph style is read from.
	pub preference_key: String,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			variant: DeploymentVariant::Default,
			api_url: DEFAULT_API_URL.to_owned(),
			preference_key: GRAPH_STYLE_KEY.to_owned(),
		}
	}
}

impl StoreConfig {
	/// Read `GRAPH_VARIANT` and `GRAPH_API_URL` from the build environment.
	///
	/// A CSR bundle has no process environment, so both are baked in at
	/// compile time.
	pub fn from_build_env() -> Self {
		let mut config = Self::default();
		if let Some(variant) = option_env!("GRAPH_VARIANT") {
			config.variant = DeploymentVariant::parse(variant);
		}
		if let Some(url) = option_env!("GRAPH_API_URL") {
			config.api_url = url.trim_end_matches('/').to_owned();
		}
		config
	}

	/// Parse an embedded JSON config; missing fields fall back to defaults.
	pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
		let mut config: Self = serde_json::from_str(raw)?;
		config.api_url = config.api_url.trim_end_matches('/').to_owned();
		Ok(config)
	}

	/// Radius the graph is laid out on before the first load measures it.
	pub fn default_graph_radius(&self) -> f64 {
		match self.variant {
			DeploymentVariant::Chile => 1600.0,
			DeploymentVariant::Default => 3056.0,
		}
	}
}
