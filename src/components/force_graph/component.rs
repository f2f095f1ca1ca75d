//! Leptos component wrapping the mind-map canvas.
//!
//! The component creates an HTML canvas element and wires up mouse, wheel and
//! touch handlers for node dragging, hovering, selection, panning and zooming.
//! Frames are driven by an [`AnimationFrameScheduler`]: the loop runs while the
//! layout is settling and parks once it is idle, and input handlers resume it
//! when they need a redraw.
//!
//! Whenever `data` changes the previous loop is stopped before the new state
//! is built. On unmount the loop parks for good and the window resize
//! listener is removed.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{error, info};
use wasm_bindgen::JsCast;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, TouchList, WheelEvent,
	Window,
};

use super::config::GraphConfig;
use super::error::{GraphError, GraphResult};
use super::model::{GraphStats, NodeDetails};
use super::render;
use super::scheduler::{AnimationFrameScheduler, FrameScheduler};
use super::state::ForceGraphState;
use super::types::GraphData;

/// Graph state plus the surface it draws to.
struct GraphContext {
	state: ForceGraphState,
	ctx: CanvasRenderingContext2d,
}

type ContextSlot = Rc<RefCell<Option<GraphContext>>>;
type SchedulerSlot = Rc<RefCell<Option<AnimationFrameScheduler>>>;

fn viewport_size(window: &Window) -> Option<(f64, f64)> {
	let w = window.inner_width().ok()?.as_f64()?;
	let h = window.inner_height().ok()?.as_f64()?;
	Some((w, h))
}

fn surface(canvas: &HtmlCanvasElement) -> GraphResult<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")
		.map_err(|e| GraphError::SurfaceUnavailable(format!("{e:?}")))?
		.ok_or_else(|| GraphError::SurfaceUnavailable("2d context not supported".into()))?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| GraphError::SurfaceUnavailable("context is not a 2d context".into()))
}

fn random_seed() -> u64 {
	(js_sys::Math::random() * (1u64 << 53) as f64) as u64
}

/// Canvas-relative coordinates of a client-space point.
fn local_point(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	client_x: i32,
	client_y: i32,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some((client_x as f64 - rect.left(), client_y as f64 - rect.top()))
}

fn touch_point(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	touches: &TouchList,
	index: u32,
) -> Option<(f64, f64)> {
	let touch = touches.get(index)?;
	local_point(canvas_ref, touch.client_x(), touch.client_y())
}

fn resume(scheduler: &SchedulerSlot) {
	if let Some(s) = scheduler.borrow().as_ref() {
		s.resume();
	}
}

/// Build state for `data`, draw the first frame and start the loop.
/// Returns the size of the graph actually drawn.
fn mount(
	canvas: &HtmlCanvasElement,
	data: &GraphData,
	config: &GraphConfig,
	(w, h): (f64, f64),
	context: &ContextSlot,
	scheduler: &SchedulerSlot,
	disposed: &Arc<AtomicBool>,
) -> GraphResult<GraphStats> {
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);
	let ctx = surface(canvas)?;

	let mut state = ForceGraphState::new(data, w, h, config, random_seed());
	state.take_redraw();
	render::render(&state, &ctx);
	let animating = state.is_animating();
	let stats = state.model().stats();
	*context.borrow_mut() = Some(GraphContext { state, ctx });

	if !animating {
		info!("mindmap-graph: nothing to animate");
		return Ok(stats);
	}

	if scheduler.borrow().is_none() {
		*scheduler.borrow_mut() = Some(AnimationFrameScheduler::new()?);
	}
	let (context_tick, disposed_tick) = (context.clone(), disposed.clone());
	let tick = Box::new(move || {
		if disposed_tick.load(Ordering::Relaxed) {
			return false;
		}
		let Ok(mut guard) = context_tick.try_borrow_mut() else {
			return true;
		};
		let Some(c) = guard.as_mut() else {
			return false;
		};
		c.state.tick();
		if c.state.take_redraw() {
			render::render(&c.state, &c.ctx);
		}
		c.state.is_animating()
	});
	if let Some(s) = scheduler.borrow().as_ref() {
		s.start(tick);
	}
	Ok(stats)
}

/// Renders an interactive force-directed mind map on a canvas element.
///
/// Pass graph data via the reactive `data` signal. The component sizes itself
/// to its parent container by default; set `fullscreen = true` to fill the
/// viewport and resize automatically with the window. Explicit `width`/`height`
/// override automatic sizing.
///
/// `on_load` receives node and connection counts after each (re)load.
/// `on_select` receives the details of the clicked node, `None` when the
/// selection is cleared or a new graph replaces the old one. `on_error` is
/// called when the drawing surface cannot be set up.
#[component]
pub fn MindMapCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional)] config: GraphConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional)] on_load: Option<Callback<GraphStats>>,
	#[prop(optional)] on_select: Option<Callback<Option<NodeDetails>>>,
	#[prop(optional)] on_error: Option<Callback<String>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: ContextSlot = Rc::new(RefCell::new(None));
	let scheduler: SchedulerSlot = Rc::new(RefCell::new(None));
	let disposed = Arc::new(AtomicBool::new(false));

	let disposed_cleanup = disposed.clone();
	on_cleanup(move || disposed_cleanup.store(true, Ordering::Relaxed));

	let (context_init, scheduler_init, disposed_init) =
		(context.clone(), scheduler.clone(), disposed.clone());
	Effect::new(move |_| {
		let graph = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();

		if let Some(s) = scheduler_init.borrow().as_ref() {
			s.stop();
		}
		context_init.borrow_mut().take();
		if disposed_init.load(Ordering::Relaxed) {
			return;
		}

		let size = if fullscreen {
			web_sys::window().as_ref().and_then(viewport_size)
		} else {
			let parent = canvas.parent_element();
			Some((
				width.unwrap_or_else(|| {
					parent
						.as_ref()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					parent
						.as_ref()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			))
		};

		let result = size
			.ok_or(GraphError::WindowUnavailable)
			.and_then(|size| {
				mount(
					&canvas,
					&graph,
					&config,
					size,
					&context_init,
					&scheduler_init,
					&disposed_init,
				)
			});
		match result {
			Ok(stats) => {
				if let Some(cb) = on_load {
					cb.run(stats);
				}
			}
			Err(e) => {
				error!("mindmap-graph: {e}");
				if let Some(cb) = on_error {
					cb.run(e.to_string());
				}
			}
		}
		if let Some(cb) = on_select {
			cb.run(None);
		}
	});

	if fullscreen {
		let (context_resize, scheduler_resize) = (context.clone(), scheduler.clone());
		let handle = window_event_listener(leptos::ev::resize, move |_| {
			let Some((nw, nh)) = web_sys::window().as_ref().and_then(viewport_size) else {
				return;
			};
			let Some(canvas) = canvas_ref.get() else {
				return;
			};
			canvas.set_width(nw as u32);
			canvas.set_height(nh as u32);
			if let Some(c) = context_resize.borrow_mut().as_mut() {
				c.state.resize(nw, nh);
				c.state.take_redraw();
				render::render(&c.state, &c.ctx);
			}
			resume(&scheduler_resize);
		});
		on_cleanup(move || handle.remove());
	}

	let (context_md, scheduler_md) = (context.clone(), scheduler.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		if let Some(c) = context_md.borrow_mut().as_mut() {
			c.state.pointer_down(x, y);
		}
		resume(&scheduler_md);
	};

	let (context_mm, scheduler_mm) = (context.clone(), scheduler.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		let changed = context_mm
			.borrow_mut()
			.as_mut()
			.is_some_and(|c| c.state.pointer_move(x, y));
		if changed {
			resume(&scheduler_mm);
		}
	};

	let (context_mu, scheduler_mu) = (context.clone(), scheduler.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let point = local_point(canvas_ref, ev.client_x(), ev.client_y()).unwrap_or_default();
		let selection = context_mu.borrow_mut().as_mut().and_then(|c| {
			c.state
				.pointer_up(point.0, point.1)
				.then(|| c.state.selected_details())
		});
		resume(&scheduler_mu);
		if let (Some(details), Some(cb)) = (selection, on_select) {
			cb.run(details);
		}
	};

	let (context_ml, scheduler_ml) = (context.clone(), scheduler.clone());
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(c) = context_ml.borrow_mut().as_mut() {
			c.state.pointer_leave();
		}
		resume(&scheduler_ml);
	};

	let (context_wh, scheduler_wh) = (context.clone(), scheduler.clone());
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		let changed = context_wh
			.borrow_mut()
			.as_mut()
			.is_some_and(|c| c.state.wheel(x, y, ev.delta_y()));
		if changed {
			resume(&scheduler_wh);
		}
	};

	let (context_ts, scheduler_ts) = (context.clone(), scheduler.clone());
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let touches = ev.touches();
		if let Some(c) = context_ts.borrow_mut().as_mut() {
			match (
				touch_point(canvas_ref, &touches, 0),
				touch_point(canvas_ref, &touches, 1),
			) {
				(Some(a), Some(b)) => c.state.pinch_start(a, b),
				(Some((x, y)), None) => {
					c.state.pointer_down(x, y);
				}
				_ => {}
			}
		}
		resume(&scheduler_ts);
	};

	let (context_tm, scheduler_tm) = (context.clone(), scheduler.clone());
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let touches = ev.touches();
		let changed = context_tm.borrow_mut().as_mut().is_some_and(|c| {
			match (
				touch_point(canvas_ref, &touches, 0),
				touch_point(canvas_ref, &touches, 1),
			) {
				(Some(a), Some(b)) => c.state.pinch_move(a, b),
				(Some((x, y)), None) => c.state.pointer_move(x, y),
				_ => false,
			}
		});
		if changed {
			resume(&scheduler_tm);
		}
	};

	let (context_te, scheduler_te) = (context.clone(), scheduler.clone());
	let on_touchend = move |ev: TouchEvent| {
		let remaining = ev.touches().length();
		let released = touch_point(canvas_ref, &ev.changed_touches(), 0).unwrap_or_default();
		let selection = context_te.borrow_mut().as_mut().and_then(|c| {
			c.state.pinch_end();
			if remaining > 0 {
				return None;
			}
			c.state
				.pointer_up(released.0, released.1)
				.then(|| c.state.selected_details())
		});
		resume(&scheduler_te);
		if let (Some(details), Some(cb)) = (selection, on_select) {
			cb.run(details);
		}
	};

	let (context_tc, scheduler_tc) = (context.clone(), scheduler.clone());
	let on_touchcancel = move |_: TouchEvent| {
		if let Some(c) = context_tc.borrow_mut().as_mut() {
			c.state.pointer_leave();
		}
		resume(&scheduler_tc);
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="mindmap-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			on:touchcancel=on_touchcancel
			style="display: block; cursor: grab; touch-action: none;"
		/>
	}
}
