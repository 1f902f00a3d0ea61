//! Graph payload types shared by the store, the network layer and the canvas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Node category as reported by the graph API (`"person"`, `"episode"`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeType(pub String);

impl NodeType {
	/// Borrow the raw type name.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for NodeType {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}

impl fmt::Display for NodeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A node as delivered by the API, plus the fields the client derives for it.
///
/// Nodes may be addressed by `ref_id` (graph identity) or by `id` (legacy
/// identity); either may be missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeExtended {
	pub ref_id: Option<String>,
	pub id: Option<String>,
	pub name: Option<String>,
	pub label: Option<String>,
	pub node_type: Option<NodeType>,
	pub image_url: Option<String>,
	pub weight: Option<f64>,
	/// `ref_id`s of nodes this node points at.
	pub children: Vec<String>,
}

impl NodeExtended {
	/// Text shown next to the node, preferring `name` over `label`.
	pub fn display_name(&self) -> Option<&str> {
		self.name.as_deref().or(self.label.as_deref())
	}

	/// Stable key for the node, `ref_id` first, `id` as fallback.
	pub fn key(&self) -> Option<&str> {
		self.ref_id.as_deref().or(self.id.as_deref())
	}
}

/// Directed edge between two node keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
	/// Key of the node the edge starts at.
	pub source: String,
	/// Key of the node the edge points to.
	pub target: String,
	/// Relationship name, e.g. `MENTIONS`.
	#[serde(default)]
	pub edge_type: Option<String>,
}

/// A node/link pair describing the visualized network.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	/// Nodes in draw order.
	#[serde(default)]
	pub nodes: Vec<NodeExtended>,
	/// Edges; the API may call them `edges`.
	#[serde(default, alias = "edges")]
	pub links: Vec<GraphLink>,
}

impl GraphData {
	/// True when there is nothing to draw.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

/// Rendering mode of the graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphStyle {
	/// Nodes laid out on a sphere.
	#[default]
	Sphere,
	/// Free force-directed layout.
	Force,
	/// Layers split by node type.
	Split,
	/// Nodes pinned to a globe.
	Earth,
}

impl GraphStyle {
	/// Every style, in menu order.
	pub const ALL: [GraphStyle; 4] = [Self::Sphere, Self::Force, Self::Split, Self::Earth];

	/// Wire and storage name.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Sphere => "sphere",
			Self::Force => "force",
			Self::Split => "split",
			Self::Earth => "earth",
		}
	}
}

impl fmt::Display for GraphStyle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Returned when a stored or user supplied style name is not one of [`GraphStyle::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown graph style: {0}")]
pub struct UnknownGraphStyle(pub String);

impl FromStr for GraphStyle {
	type Err = UnknownGraphStyle;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|style| style.as_str() == s)
			.ok_or_else(|| UnknownGraphStyle(s.to_owned()))
	}
}

/// A content source (feed, channel, account) the graph is built from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
	/// Graph identity of the source, once ingested.
	pub ref_id: Option<String>,
	/// Handle or URL.
	pub source: String,
	/// Kind of source, e.g. `twitter_handle`.
	pub source_type: String,
}

/// A trending search topic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trending {
	/// The search term.
	pub topic: String,
	/// How often it was searched.
	pub count: u64,
}

/// Aggregate counts for the loaded graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
	/// All nodes.
	pub num_nodes: u64,
	/// Episode nodes.
	pub num_episodes: u64,
	/// Person nodes.
	pub num_people: u64,
	/// Topic nodes.
	pub num_topics: u64,
	/// Document nodes.
	pub num_documents: u64,
}

/// Optional query parameters forwarded to the graph API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchParams {
	/// Search term; when present the search is recorded after the fetch.
	pub word: Option<String>,
	/// Ask the API to bypass its cache.
	pub skip_cache: Option<String>,
	/// Restrict the query to free content.
	pub free: Option<String>,
	/// Restrict results to one media type.
	pub media_type: Option<String>,
}

impl FetchParams {
	/// Parameters for a search on `word`.
	pub fn search(word: impl Into<String>) -> Self {
		Self {
			word: Some(word.into()),
			..Self::default()
		}
	}

	/// The search word, ignoring empty strings.
	pub fn word(&self) -> Option<&str> {
		self.word.as_deref().filter(|w| !w.is_empty())
	}
}
