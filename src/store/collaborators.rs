use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::{FetchParams, GraphData, GraphStyle, NodeExtended};

/// Loads graph data for a given rendering style.
#[async_trait(?Send)]
pub trait GraphDataFetcher {
	/// Fetch the graph.
	///
	/// `progress` receives the remaining query budget any number of times;
	/// `None` clears it.
	async fn fetch(
		&self,
		style: GraphStyle,
		progress: &dyn Fn(Option<f64>),
		params: &FetchParams,
	) -> FetchResult<GraphData>;
}

/// Persists the search that was just run.
#[async_trait(?Send)]
pub trait SearchTermRecorder {
	/// Record the search.
	async fn record(&self) -> FetchResult<()>;
}

/// Decides whether `candidate` is related to `selected`.
pub trait RelativePredicate {
	/// True when `candidate` belongs with `selected`.
	fn is_relative(&self, candidate: &NodeExtended, selected: &NodeExtended) -> bool;
}

impl<F> RelativePredicate for F
where
	F: Fn(&NodeExtended, &NodeExtended) -> bool,
{
	fn is_relative(&self, candidate: &NodeExtended, selected: &NodeExtended) -> bool {
		self(candidate, selected)
	}
}

/// Two nodes are relatives when either lists the other's `ref_id` as a child.
pub fn nodes_are_relatives(candidate: &NodeExtended, selected: &NodeExtended) -> bool {
	let lists = |parent: &NodeExtended, child: &NodeExtended| {
		child
			.ref_id
			.as_deref()
			.is_some_and(|id| parent.children.iter().any(|c| c == id))
	};
	lists(selected, candidate) || lists(candidate, selected)
}

/// Recorder for builds that do not track searches.
pub struct NoopRecorder;

#[async_trait(?Send)]
impl SearchTermRecorder for NoopRecorder {
	async fn record(&self) -> FetchResult<()> {
		Ok(())
	}
}
