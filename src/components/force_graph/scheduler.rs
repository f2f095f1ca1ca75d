//! Per-frame scheduling of the simulation/render loop.
//!
//! The graph state never talks to `requestAnimationFrame` directly. A
//! [`FrameScheduler`] owns the tick closure and decides when to call it:
//! the tick returns `true` to ask for another frame and `false` to park the
//! loop until [`FrameScheduler::resume`] is called (e.g. by a pointer event).
//! [`FrameScheduler::stop`] drops the tick and cancels anything pending, which
//! is what a graph replacement or unmount must do before building a new loop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::Window;

use super::error::{GraphError, GraphResult};

/// One frame of work. Returns whether another frame is wanted.
pub type TickFn = Box<dyn FnMut() -> bool>;

pub trait FrameScheduler {
	/// Install `tick` and request the first frame, replacing any previous loop.
	fn start(&self, tick: TickFn);
	/// Request a frame for a parked loop. No-op when stopped or already scheduled.
	fn resume(&self);
	/// Drop the tick and cancel any pending frame.
	fn stop(&self);
	/// A frame is pending or executing.
	fn is_running(&self) -> bool;
}

/// Bookkeeping shared by the scheduler backends.
#[derive(Default)]
struct LoopSlot {
	tick: Option<TickFn>,
	/// Bumped by every start/stop so a frame can tell its loop was replaced.
	generation: u64,
	scheduled: bool,
	in_frame: bool,
	wake: bool,
}

impl LoopSlot {
	fn install(&mut self, tick: TickFn) {
		self.generation += 1;
		self.tick = Some(tick);
		self.wake = false;
	}

	fn clear(&mut self) {
		self.generation += 1;
		self.tick = None;
		self.scheduled = false;
		self.wake = false;
	}

	/// Returns true when the caller should request a frame.
	fn request(&mut self) -> bool {
		if self.in_frame {
			self.wake = true;
			return false;
		}
		if self.tick.is_none() || self.scheduled {
			return false;
		}
		self.scheduled = true;
		true
	}

	fn begin_frame(&mut self) -> Option<(TickFn, u64)> {
		self.scheduled = false;
		let tick = self.tick.take()?;
		self.in_frame = true;
		Some((tick, self.generation))
	}

	/// Put the tick back. Returns true when another frame should be requested.
	fn end_frame(&mut self, tick: TickFn, generation: u64, again: bool) -> bool {
		self.in_frame = false;
		if generation != self.generation {
			// Stopped or restarted from inside the tick. A restart left its
			// first frame request in `wake`.
			let again = std::mem::take(&mut self.wake) && self.tick.is_some();
			self.scheduled = again;
			return again;
		}
		self.tick = Some(tick);
		let again = again || std::mem::take(&mut self.wake);
		if again {
			self.scheduled = true;
		}
		again
	}

	fn is_running(&self) -> bool {
		self.scheduled || self.in_frame
	}
}

struct FrameLoop {
	slot: LoopSlot,
	frame: Option<Closure<dyn FnMut()>>,
	handle: Option<i32>,
}

/// Browser backend driven by `window.requestAnimationFrame`.
pub struct AnimationFrameScheduler {
	window: Window,
	inner: Rc<RefCell<FrameLoop>>,
}

impl AnimationFrameScheduler {
	pub fn new() -> GraphResult<Self> {
		let window = web_sys::window().ok_or(GraphError::WindowUnavailable)?;
		let inner = Rc::new(RefCell::new(FrameLoop {
			slot: LoopSlot::default(),
			frame: None,
			handle: None,
		}));

		let weak = Rc::downgrade(&inner);
		let frame_window = window.clone();
		let frame = Closure::new(move || run_frame(&weak, &frame_window));
		inner.borrow_mut().frame = Some(frame);

		Ok(Self { window, inner })
	}

	fn request(&self) {
		let mut inner = self.inner.borrow_mut();
		if inner.slot.request() {
			request_frame(&self.window, &mut inner);
		}
	}
}

fn run_frame(weak: &Weak<RefCell<FrameLoop>>, window: &Window) {
	let Some(inner) = weak.upgrade() else {
		return;
	};
	let begun = {
		let mut state = inner.borrow_mut();
		state.handle = None;
		state.slot.begin_frame()
	};
	let Some((mut tick, generation)) = begun else {
		return;
	};

	let again = tick();

	let mut state = inner.borrow_mut();
	if state.slot.end_frame(tick, generation, again) {
		request_frame(window, &mut state);
	}
}

fn request_frame(window: &Window, state: &mut FrameLoop) {
	let Some(frame) = state.frame.as_ref() else {
		return;
	};
	match window.request_animation_frame(frame.as_ref().unchecked_ref()) {
		Ok(handle) => state.handle = Some(handle),
		Err(e) => {
			warn!("mindmap-graph: requestAnimationFrame failed: {:?}", e);
			state.slot.scheduled = false;
		}
	}
}

impl FrameScheduler for AnimationFrameScheduler {
	fn start(&self, tick: TickFn) {
		self.stop();
		self.inner.borrow_mut().slot.install(tick);
		debug!("mindmap-graph: frame loop started");
		self.request();
	}

	fn resume(&self) {
		self.request();
	}

	fn stop(&self) {
		let mut inner = self.inner.borrow_mut();
		if let Some(handle) = inner.handle.take() {
			let _ = self.window.cancel_animation_frame(handle);
		}
		if inner.slot.tick.is_some() || inner.slot.in_frame {
			debug!("mindmap-graph: frame loop stopped");
		}
		inner.slot.clear();
	}

	fn is_running(&self) -> bool {
		self.inner.borrow().slot.is_running()
	}
}

impl Drop for AnimationFrameScheduler {
	fn drop(&mut self) {
		if let Ok(mut inner) = self.inner.try_borrow_mut()
			&& let Some(handle) = inner.handle.take()
		{
			let _ = self.window.cancel_animation_frame(handle);
		}
	}
}

/// Headless backend. Frames run only when the owner calls [`ManualScheduler::run_frame`].
#[derive(Default)]
pub struct ManualScheduler {
	slot: Rc<RefCell<LoopSlot>>,
}

impl ManualScheduler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Run one frame if one is pending. Returns whether a frame ran.
	pub fn run_frame(&self) -> bool {
		let Some((mut tick, generation)) = self.slot.borrow_mut().begin_frame() else {
			return false;
		};
		let again = tick();
		self.slot.borrow_mut().end_frame(tick, generation, again);
		true
	}

	/// Run frames until the loop parks or `limit` frames have run. Returns the count.
	pub fn run_until_idle(&self, limit: usize) -> usize {
		let mut frames = 0;
		while frames < limit && self.slot.borrow().scheduled {
			self.run_frame();
			frames += 1;
		}
		frames
	}
}

impl FrameScheduler for ManualScheduler {
	fn start(&self, tick: TickFn) {
		let mut slot = self.slot.borrow_mut();
		slot.clear();
		slot.install(tick);
		slot.request();
	}

	fn resume(&self) {
		self.slot.borrow_mut().request();
	}

	fn stop(&self) {
		self.slot.borrow_mut().clear();
	}

	fn is_running(&self) -> bool {
		self.slot.borrow().is_running()
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;

	fn counting(limit: usize) -> (Rc<Cell<usize>>, TickFn) {
		let count = Rc::new(Cell::new(0));
		let inner = count.clone();
		let tick = Box::new(move || {
			inner.set(inner.get() + 1);
			inner.get() < limit
		});
		(count, tick)
	}

	#[test]
	fn loop_parks_when_tick_returns_false() {
		let scheduler = ManualScheduler::new();
		let (count, tick) = counting(3);
		scheduler.start(tick);
		assert!(scheduler.is_running());
		assert_eq!(scheduler.run_until_idle(100), 3);
		assert_eq!(count.get(), 3);
		assert!(!scheduler.is_running());
		assert!(!scheduler.run_frame());
	}

	#[test]
	fn resume_runs_a_parked_loop() {
		let scheduler = ManualScheduler::new();
		let (count, tick) = counting(1);
		scheduler.start(tick);
		scheduler.run_until_idle(10);
		scheduler.resume();
		assert!(scheduler.is_running());
		assert!(scheduler.run_frame());
		assert_eq!(count.get(), 2);
	}

	#[test]
	fn stop_drops_the_tick() {
		let scheduler = ManualScheduler::new();
		let (count, tick) = counting(usize::MAX);
		scheduler.start(tick);
		scheduler.run_frame();
		scheduler.stop();
		assert!(!scheduler.is_running());
		scheduler.resume();
		assert!(!scheduler.run_frame());
		assert_eq!(count.get(), 1);
		assert_eq!(Rc::strong_count(&count), 1);
	}

	#[test]
	fn restart_replaces_the_previous_loop() {
		let scheduler = ManualScheduler::new();
		let (first, tick) = counting(usize::MAX);
		scheduler.start(tick);
		scheduler.run_frame();
		let (second, tick) = counting(usize::MAX);
		scheduler.start(tick);
		scheduler.run_frame();
		scheduler.run_frame();
		assert_eq!(first.get(), 1);
		assert_eq!(second.get(), 2);
	}

	#[test]
	fn stop_from_inside_a_tick_is_honored() {
		let scheduler = Rc::new(ManualScheduler::new());
		let weak = Rc::downgrade(&scheduler);
		let ran = Rc::new(Cell::new(0));
		let ran_inner = ran.clone();
		scheduler.start(Box::new(move || {
			ran_inner.set(ran_inner.get() + 1);
			if let Some(s) = weak.upgrade() {
				s.stop();
			}
			true
		}));
		assert!(scheduler.run_frame());
		assert!(!scheduler.is_running());
		assert!(!scheduler.run_frame());
		assert_eq!(ran.get(), 1);
	}

	#[test]
	fn restart_from_inside_a_tick_runs_the_new_loop() {
		let scheduler = Rc::new(ManualScheduler::new());
		let weak = Rc::downgrade(&scheduler);
		let (second, replacement) = counting(2);
		let mut replacement = Some(replacement);
		scheduler.start(Box::new(move || {
			if let (Some(s), Some(tick)) = (weak.upgrade(), replacement.take()) {
				s.start(tick);
			}
			true
		}));
		assert!(scheduler.run_frame());
		assert!(scheduler.is_running());
		assert_eq!(scheduler.run_until_idle(10), 2);
		assert_eq!(second.get(), 2);
		assert!(!scheduler.is_running());
	}
}
