//! HTTP implementations of the store's fetch and search-recording collaborators.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::config::StoreConfig;
use crate::error::{FetchError, FetchResult};
use crate::store::{GraphDataFetcher, SearchTermRecorder};
use crate::types::{FetchParams, GraphData, GraphStyle};

const GRAPH_PATH: &str = "/prediction/graph/search";
const RECORD_PATH: &str = "/search/record";

/// Body of a graph search response.
#[derive(Debug, Default, Deserialize)]
struct GraphResponse {
	#[serde(flatten)]
	graph: GraphData,
	/// Remaining paid-query budget, when the API tracks one.
	#[serde(default)]
	budget: Option<f64>,
}

fn query_pairs(style: GraphStyle, params: &FetchParams) -> Vec<(&'static str, String)> {
	let mut pairs = vec![("graph_style", style.as_str().to_owned())];
	let optional = [
		("word", &params.word),
		("skip_cache", &params.skip_cache),
		("free", &params.free),
		("media_type", &params.media_type),
	];
	pairs.extend(
		optional
			.into_iter()
			.filter_map(|(key, value)| value.clone().map(|v| (key, v))),
	);
	pairs
}

fn decode(body: &str) -> FetchResult<(GraphData, Option<f64>)> {
	let response: GraphResponse = serde_json::from_str(body)?;
	Ok((response.graph, response.budget))
}

/// Fetches graphs from the explorer API.
pub struct HttpGraphFetcher {
	client: reqwest::Client,
	url: String,
}

impl HttpGraphFetcher {
	/// Fetcher for the graph search endpoint under `config.api_url`.
	pub fn new(config: &StoreConfig) -> Self {
		Self {
			client: reqwest::Client::new(),
			url: format!("{}{GRAPH_PATH}", config.api_url),
		}
	}
}

#[async_trait(?Send)]
impl GraphDataFetcher for HttpGraphFetcher {
	async fn fetch(
		&self,
		style: GraphStyle,
		progress: &dyn Fn(Option<f64>),
		params: &FetchParams,
	) -> FetchResult<GraphData> {
		progress(None);
		let response = self
			.client
			.get(&self.url)
			.query(&query_pairs(style, params))
			.send()
			.await?;
		let status = response.status();
		if !status.is_success() {
			return Err(FetchError::Status {
				status: status.as_u16(),
				url: self.url.clone(),
			});
		}
		let body = response.text().await?;
		let (graph, budget) = decode(&body)?;
		debug!("graph response: {} bytes, budget {budget:?}", body.len());
		progress(budget);
		Ok(graph)
	}
}

/// Tells the API that the last search should be kept in the user's history.
pub struct HttpSearchRecorder {
	client: reqwest::Client,
	url: String,
}

impl HttpSearchRecorder {
	/// Recorder for the search history endpoint under `config.api_url`.
	pub fn new(config: &StoreConfig) -> Self {
		Self {
			client: reqwest::Client::new(),
			url: format!("{}{RECORD_PATH}", config.api_url),
		}
	}
}

#[async_trait(?Send)]
impl SearchTermRecorder for HttpSearchRecorder {
	async fn record(&self) -> FetchResult<()> {
		let response = self.client.post(&self.url).send().await?;
		let status = response.status();
		if status.is_success() {
			Ok(())
		} else {
			Err(FetchError::Status {
				status: status.as_u16(),
				url: self.url.clone(),
			})
		}
	}
}
