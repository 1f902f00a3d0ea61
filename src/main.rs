//! Browser entry point for the graph explorer.

use graph_explorer::{App, init_logging};
use leptos::mount::mount_to_body;

fn main() {
	init_logging();
	mount_to_body(App)
}
