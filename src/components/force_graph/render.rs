use std::f64::consts::TAU;

use force_graph::DefaultNodeIdx;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{ForceGraphState, NODE_RADIUS};

const BACKGROUND: &str = "#1a1a2e";
const EDGE_RGB: &str = "100, 180, 255";
const SELECTED_RING: &str = "rgba(255, 214, 10, 0.95)";
const RELATIVE_RING: &str = "rgba(255, 214, 10, 0.45)";
const DASH: f64 = 8.0;
const GAP: f64 = 4.0;
const ARROW: f64 = 8.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// How prominently a node is drawn while a hover highlight fades in or out.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Emphasis {
	Plain,
	Dimmed,
	Neighbor,
	Hovered,
}

impl Emphasis {
	fn of(state: &ForceGraphState, idx: DefaultNodeIdx) -> Self {
		if !state.has_active_highlight() {
			Self::Plain
		} else if state.is_hovered(idx) {
			Self::Hovered
		} else if state.is_highlighted(idx) {
			Self::Neighbor
		} else {
			Self::Dimmed
		}
	}

	/// Radius and glow radius at highlight progress `t`.
	fn radii(self, t: f64) -> (f64, Option<f64>) {
		match self {
			Self::Plain => (NODE_RADIUS, None),
			Self::Dimmed => (NODE_RADIUS * (1.0 - 0.15 * t), None),
			Self::Neighbor => (NODE_RADIUS * (1.0 + 0.2 * t), Some(NODE_RADIUS * (1.4 + 0.6 * t))),
			Self::Hovered => (NODE_RADIUS * (1.0 + 0.35 * t), Some(NODE_RADIUS * (1.8 + 1.2 * t))),
		}
	}
}

/// Per-frame values shared by every draw call.
struct Frame<'a> {
	ctx: &'a CanvasRenderingContext2d,
	k: f64,
	t: f64,
}

impl Frame<'_> {
	fn disc(&self, x: f64, y: f64, radius: f64, fill: &str) {
		self.ctx.begin_path();
		let _ = self.ctx.arc(x, y, radius, 0.0, TAU);
		self.ctx.set_fill_style_str(fill);
		self.ctx.fill();
	}

	fn ring(&self, x: f64, y: f64, radius: f64, stroke: &str, width: f64) {
		self.ctx.begin_path();
		let _ = self.ctx.arc(x, y, radius, 0.0, TAU);
		self.ctx.set_stroke_style_str(stroke);
		self.ctx.set_line_width(width / self.k);
		self.ctx.stroke();
	}

	fn glow(&self, x: f64, y: f64, inner: f64, outer: f64, alpha: f64) {
		let Ok(gradient) = self.ctx.create_radial_gradient(x, y, inner, x, y, outer) else {
			return;
		};
		let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {alpha})"));
		let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
		let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
		self.ctx.begin_path();
		let _ = self.ctx.arc(x, y, outer, 0.0, TAU);
		#[allow(deprecated)]
		self.ctx.set_fill_style(&gradient);
		self.ctx.fill();
	}

	fn label(&self, text: &str, x: f64, y: f64, radius: f64, fill: &str) {
		self.ctx.set_fill_style_str(fill);
		self.ctx.set_font(&format!("{}px sans-serif", 10.0 / self.k.max(0.5)));
		let _ = self.ctx.fill_text(text, x + radius + 3.0, y + 3.0);
	}

	fn dashed(&self, on: bool, offset: f64) {
		let pattern = if on {
			js_sys::Array::of2(&JsValue::from_f64(DASH / self.k), &JsValue::from_f64(GAP / self.k))
		} else {
			js_sys::Array::new()
		};
		let _ = self.ctx.set_line_dash(&pattern);
		self.ctx.set_line_dash_offset(offset);
	}

	/// Filled arrowhead with its tip at `(x, y)` pointing along `(ux, uy)`.
	fn arrow(&self, x: f64, y: f64, ux: f64, uy: f64, fill: &str) {
		let size = ARROW / self.k;
		let (back_x, back_y) = (x - ux * size, y - uy * size);
		let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
		self.ctx.set_fill_style_str(fill);
		self.ctx.begin_path();
		self.ctx.move_to(x, y);
		self.ctx.line_to(back_x + px, back_y + py);
		self.ctx.line_to(back_x - px, back_y - py);
		self.ctx.close_path();
		self.ctx.fill();
	}
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	let frame = Frame {
		ctx,
		k: state.transform.k,
		t: ease_out_cubic(state.hover.highlight_t),
	};
	draw_edges(state, &frame);
	// dimmed nodes first so highlighted ones sit on top
	draw_nodes(state, &frame, |e| e == Emphasis::Plain || e == Emphasis::Dimmed);
	draw_nodes(state, &frame, |e| e == Emphasis::Neighbor || e == Emphasis::Hovered);
	draw_selection(state, &frame);
	ctx.restore();
}

fn draw_edges(state: &ForceGraphState, frame: &Frame) {
	let Frame { ctx, k, t } = *frame;
	let flow = -(state.flow_time * 30.0) % ((DASH + GAP) / k);

	state.graph.visit_edges(|n1, n2, _| {
		let (x1, y1, x2, y2) = (n1.x() as f64, n1.y() as f64, n2.x() as f64, n2.y() as f64);
		let dist = (x2 - x1).hypot(y2 - y1);
		if dist < 0.001 {
			return;
		}
		let (ux, uy) = ((x2 - x1) / dist, (y2 - y1) / dist);

		let emphasized = (state.is_highlighted(n1.index()) && state.is_highlighted(n2.index()))
			|| state.is_selected(n1.index())
			|| state.is_selected(n2.index());
		// t=0: every edge at 0.6; t=1: emphasized 0.9, the rest 0.15
		let (sign, line_shift, head_shift) = if emphasized {
			(1.0, 0.3, 0.1)
		} else {
			(-1.0, 0.45, 0.45)
		};
		let line_alpha = 0.6 + sign * line_shift * t;
		let head_alpha = 0.8 + sign * head_shift * t;

		frame.dashed(true, flow);
		ctx.set_stroke_style_str(&format!("rgba({EDGE_RGB}, {line_alpha})"));
		ctx.set_line_width(1.5 / k * (1.0 + sign * 0.3 * t));
		ctx.begin_path();
		ctx.move_to(x1 + ux * NODE_RADIUS, y1 + uy * NODE_RADIUS);
		let stop = NODE_RADIUS + ARROW / k;
		ctx.line_to(x2 - ux * stop, y2 - uy * stop);
		ctx.stroke();

		frame.dashed(false, 0.0);
		frame.arrow(
			x2 - ux * NODE_RADIUS,
			y2 - uy * NODE_RADIUS,
			ux,
			uy,
			&format!("rgba({EDGE_RGB}, {head_alpha})"),
		);
	});
	frame.dashed(false, 0.0);
}

fn draw_nodes(state: &ForceGraphState, frame: &Frame, pass: impl Fn(Emphasis) -> bool) {
	let Frame { ctx, k, t } = *frame;

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		let emphasis = Emphasis::of(state, idx);
		if !pass(emphasis) {
			return;
		}
		let (x, y) = (node.x() as f64, node.y() as f64);
		let info = &node.data.user_data;
		let (radius, glow) = emphasis.radii(t);

		if let Some(outer) = glow.filter(|_| t > 0.01) {
			let alpha = if emphasis == Emphasis::Hovered { 0.35 } else { 0.2 };
			frame.glow(x, y, radius * 0.3, outer, alpha * t);
		}

		let alpha = if emphasis == Emphasis::Dimmed { 1.0 - 0.7 * t } else { 1.0 };
		ctx.set_global_alpha(alpha);
		frame.disc(x, y, radius, info.color);
		ctx.set_global_alpha(1.0);

		if emphasis == Emphasis::Hovered && t > 0.01 {
			frame.ring(x, y, radius + 2.0 / k, &format!("rgba(255, 255, 255, {})", 0.7 * t), 1.5);
		}

		let Some(label) = &info.label else {
			return;
		};
		match emphasis {
			Emphasis::Neighbor | Emphasis::Hovered => frame.label(label, x, y, radius, "white"),
			// zoomed-out labels only for relatives of the selection
			_ if k > 0.8 || state.is_relative(idx) => {
				frame.label(label, x, y, radius, &format!("rgba(255, 255, 255, {})", alpha * 0.8))
			}
			_ => {}
		}
	});
}

/// Rings around the selected node and its relatives, drawn over everything else.
fn draw_selection(state: &ForceGraphState, frame: &Frame) {
	if state.selection.selected.is_none() && state.selection.relatives.is_empty() {
		return;
	}
	let radius = NODE_RADIUS + 3.0 / frame.k;

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		let (x, y) = (node.x() as f64, node.y() as f64);
		if state.is_selected(idx) {
			frame.ring(x, y, radius, SELECTED_RING, 2.5);
			if let Some(label) = &node.data.user_data.label {
				frame.label(label, x, y, radius, SELECTED_RING);
			}
		} else if state.is_relative(idx) {
			frame.ring(x, y, radius, RELATIVE_RING, 1.5);
		}
	});
}
