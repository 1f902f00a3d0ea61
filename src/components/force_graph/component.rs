use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::ForceGraphState;
use crate::components::{StoreHandle, use_store_selector};
use crate::store::selectors;
use crate::types::NodeExtended;

/// Pointer travel, in pixels, below which a press counts as a click.
const CLICK_SLOP: f64 = 3.0;

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Force-directed view of the store's filtered graph.
///
/// Hovering and clicking nodes feed back into the store; the store's
/// selection and relative ids are drawn as rings.
#[component]
pub fn GraphCanvas(
	store: StoreHandle,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let graph = use_store_selector(store, selectors::filtered_graph);
	let selection = use_store_selector(store, |s| {
		(
			s.selected_node.as_ref().and_then(|n| n.ref_id.clone()),
			s.selected_node_relative_ids.clone(),
		)
	});
	let focus_requested = use_store_selector(store, |s| s.camera_focus_trigger);
	let scroll_disabled = use_store_selector(store, |s| s.scroll_events_disabled);

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::error!("canvas has no 2d context");
			return;
		};

		let mut initial = ForceGraphState::new(&graph.get_untracked(), w, h);
		let (selected, relatives) = selection.get_untracked();
		initial.set_selection(selected, &relatives);
		*state_init.borrow_mut() = Some(initial);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.animation_running {
					s.tick(0.016);
				}
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(window)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_data = state.clone();
	Effect::new(move |_| {
		let data = graph.get();
		if let Some(ref mut s) = *state_data.borrow_mut() {
			s.load(&data);
		}
	});

	let state_selection = state.clone();
	Effect::new(move |_| {
		let (selected, relatives) = selection.get();
		if let Some(ref mut s) = *state_selection.borrow_mut() {
			s.set_selection(selected, &relatives);
		}
	});

	let state_focus = state.clone();
	Effect::new(move |_| {
		if !focus_requested.get() {
			return;
		}
		if let Some(ref mut s) = *state_focus.borrow_mut() {
			s.focus_selected();
		}
		store.with_value(|st| st.set_camera_focus_trigger(false));
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};

		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.moved = false;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.moved = false;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};

		let mut hover_change: Option<Option<NodeExtended>> = None;
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if !s.drag.active {
				let hovered = s.node_at_position(x, y);
				if s.set_hover(hovered) {
					hover_change = Some(hovered.and_then(|idx| s.node(idx)));
				}
			}

			if s.drag.active {
				if let Some(idx) = s.drag.node_idx {
					let (px, py) = (x - s.drag.start_x, y - s.drag.start_y);
					s.drag.moved |= px.hypot(py) > CLICK_SLOP;
					let (dx, dy) = (px / s.transform.k, py / s.transform.k);
					let (nx, ny) = (
						s.drag.node_start_x + dx as f32,
						s.drag.node_start_y + dy as f32,
					);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
			} else if s.pan.active {
				let (px, py) = (x - s.pan.start_x, y - s.pan.start_y);
				s.pan.moved |= px.hypot(py) > CLICK_SLOP;
				s.transform.x = s.pan.transform_start_x + px;
				s.transform.y = s.pan.transform_start_y + py;
			}
		}

		if let Some(node) = hover_change {
			store.with_value(|st| st.set_hovered_node(node));
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let mut clicked = None;
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			if s.drag.active {
				if let Some(idx) = s.drag.node_idx {
					if s.drag.moved {
						s.graph.visit_nodes_mut(|node| {
							if node.index() == idx {
								node.data.is_anchor = true;
							}
						});
					} else {
						clicked = s.node(idx);
					}
				}
			}
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}

		if let Some(node) = clicked {
			store.with_value(|st| st.set_selected_node(Some(node)));
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let mut left_node = false;
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			left_node = s.set_hover(None);
		}
		if left_node {
			store.with_value(|st| st.set_hovered_node(None));
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		if scroll_disabled.get_untracked() {
			return;
		}
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};

		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
