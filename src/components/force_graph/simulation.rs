//! Force-directed layout engine.
//!
//! A velocity-Verlet integrator in the style of d3-force. Every tick applies,
//! in order, a spring force along links, many-body repulsion (Barnes-Hut), a
//! positional centering shift and a circle collision pass, then integrates
//! velocities with decay. The whole step is scaled by `alpha`, which decays
//! geometrically toward `alpha_target` and is bumped back up when a node is
//! pinned.
//!
//! The simulation owns its node array. Callers only get read access to
//! positions plus the narrow [`Simulation::pin`] / [`Simulation::move_pin`] /
//! [`Simulation::unpin`] / [`Simulation::reheat`] entry points.

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use super::config::bounded;
use super::quadtree::{ChargeField, QuadTree, jiggle};

/// Tunable physics constants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
	/// Rest length of every link.
	pub link_distance: f64,
	/// Spring stiffness of every link.
	pub link_strength: f64,
	/// Many-body strength per node. Negative repels.
	pub charge_strength: f64,
	/// Barnes-Hut opening angle. Larger is faster and less accurate.
	pub charge_theta: f64,
	/// Distances below this are softened in the charge force.
	pub charge_distance_min: f64,
	/// Fraction of the centroid offset removed per tick.
	pub center_strength: f64,
	/// Extra clearance added to each node radius for collision.
	pub collision_padding: f64,
	pub collision_strength: f64,
	pub collision_iterations: usize,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Below this alpha (and with nothing pinned) the simulation stops.
	pub alpha_min: f64,
	pub alpha_decay: f64,
	/// Alpha target while a node is pinned.
	pub alpha_reheat: f64,
	/// Width of the square around the center used for initial placement.
	pub initial_jitter: f64,
}

impl Default for SimulationParameters {
	fn default() -> Self {
		let alpha_min = 0.001;
		Self {
			link_distance: 100.0,
			link_strength: 0.5,
			charge_strength: -300.0,
			charge_theta: 0.9,
			charge_distance_min: 1.0,
			center_strength: 0.1,
			collision_padding: 5.0,
			collision_strength: 1.0,
			collision_iterations: 1,
			velocity_decay: 0.4,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			alpha_reheat: 0.3,
			initial_jitter: 100.0,
		}
	}
}

/// Most collision passes allowed per tick.
const MAX_COLLISION_ITERATIONS: usize = 10;

impl SimulationParameters {
	/// Pull every field into a range the solver stays stable in.
	pub fn sanitized(self) -> Self {
		let d = Self::default();
		let collision_iterations = self.collision_iterations.min(MAX_COLLISION_ITERATIONS);
		if collision_iterations != self.collision_iterations {
			warn!(
				"mindmap-graph: config simulation.collision_iterations = {} out of range, using {}",
				self.collision_iterations, collision_iterations
			);
		}
		let alpha_min = bounded("simulation.alpha_min", self.alpha_min, 1e-6, 0.5, d.alpha_min);
		Self {
			link_distance: bounded("simulation.link_distance", self.link_distance, 1.0, 10_000.0, d.link_distance),
			link_strength: bounded("simulation.link_strength", self.link_strength, 0.0, 2.0, d.link_strength),
			charge_strength: bounded(
				"simulation.charge_strength",
				self.charge_strength,
				-10_000.0,
				10_000.0,
				d.charge_strength,
			),
			charge_theta: bounded("simulation.charge_theta", self.charge_theta, 0.0, 2.0, d.charge_theta),
			charge_distance_min: bounded(
				"simulation.charge_distance_min",
				self.charge_distance_min,
				0.01,
				1_000.0,
				d.charge_distance_min,
			),
			center_strength: bounded("simulation.center_strength", self.center_strength, 0.0, 1.0, d.center_strength),
			collision_padding: bounded(
				"simulation.collision_padding",
				self.collision_padding,
				0.0,
				1_000.0,
				d.collision_padding,
			),
			collision_strength: bounded(
				"simulation.collision_strength",
				self.collision_strength,
				0.0,
				1.0,
				d.collision_strength,
			),
			collision_iterations,
			velocity_decay: bounded("simulation.velocity_decay", self.velocity_decay, 0.0, 1.0, d.velocity_decay),
			alpha_min,
			alpha_decay: bounded("simulation.alpha_decay", self.alpha_decay, 1e-4, 1.0, d.alpha_decay),
			alpha_reheat: bounded("simulation.alpha_reheat", self.alpha_reheat, 0.0, 1.0, d.alpha_reheat),
			initial_jitter: bounded("simulation.initial_jitter", self.initial_jitter, 0.0, 10_000.0, d.initial_jitter),
		}
	}
}

/// Lifecycle of the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SimulationPhase {
	/// Nothing to do. Ticks are no-ops.
	#[default]
	Idle,
	/// Freshly loaded or held hot by a pinned node.
	Running,
	/// Cooling down toward `alpha_min`.
	Settling,
}

/// Per-node physics record.
#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Fixed position while dragged.
	pub pin: Option<(f64, f64)>,
	/// Visual radius, used by the collision pass.
	pub radius: f64,
}

/// Spring between two node indices.
#[derive(Clone, Debug, PartialEq)]
pub struct SimLink {
	pub source: usize,
	pub target: usize,
	pub distance: f64,
	pub strength: f64,
	/// Share of the correction applied to the target. The source gets the rest.
	pub bias: f64,
}

/// Iterative layout state for one graph.
#[derive(Clone, Debug)]
pub struct Simulation {
	nodes: Vec<SimNode>,
	links: Vec<SimLink>,
	params: SimulationParameters,
	alpha: f64,
	alpha_target: f64,
	center: (f64, f64),
	phase: SimulationPhase,
	pinned: Option<usize>,
	rng: SmallRng,
}

impl Simulation {
	/// Lay out `radii.len()` nodes around the center of a `width` x `height` area.
	///
	/// `edges` are index pairs into `radii`. Self-loops and out-of-range
	/// indices contribute no spring.
	pub fn new(
		radii: &[f64],
		edges: &[(usize, usize)],
		width: f64,
		height: f64,
		params: SimulationParameters,
		seed: u64,
	) -> Self {
		let mut rng = SmallRng::seed_from_u64(seed);
		let center = (width / 2.0, height / 2.0);

		let nodes: Vec<SimNode> = radii
			.iter()
			.map(|&radius| {
				let (x, y) = scatter(&mut rng, center, params.initial_jitter);
				SimNode {
					x,
					y,
					vx: 0.0,
					vy: 0.0,
					pin: None,
					radius,
				}
			})
			.collect();

		let springs: Vec<(usize, usize)> = edges
			.iter()
			.copied()
			.filter(|&(s, t)| s != t && s < nodes.len() && t < nodes.len())
			.collect();
		let mut count = vec![0usize; nodes.len()];
		for &(s, t) in &springs {
			count[s] += 1;
			count[t] += 1;
		}
		let links = springs
			.into_iter()
			.map(|(source, target)| SimLink {
				source,
				target,
				distance: params.link_distance,
				strength: params.link_strength,
				bias: count[source] as f64 / (count[source] + count[target]) as f64,
			})
			.collect();

		let phase = if nodes.is_empty() {
			SimulationPhase::Idle
		} else {
			SimulationPhase::Running
		};
		debug!(
			"mindmap-graph: simulation created with {} bodies, seed {}",
			nodes.len(),
			seed
		);

		Self {
			nodes,
			links,
			params,
			alpha: 1.0,
			alpha_target: 0.0,
			center,
			phase,
			pinned: None,
			rng,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn phase(&self) -> SimulationPhase {
		self.phase
	}

	/// Whether another tick would move anything.
	pub fn is_active(&self) -> bool {
		self.phase != SimulationPhase::Idle
	}

	pub fn pinned(&self) -> Option<usize> {
		self.pinned
	}

	pub fn center(&self) -> (f64, f64) {
		self.center
	}

	pub fn params(&self) -> &SimulationParameters {
		&self.params
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[SimLink] {
		&self.links
	}

	pub fn position(&self, idx: usize) -> Option<(f64, f64)> {
		self.nodes.get(idx).map(|n| (n.x, n.y))
	}

	pub fn positions(&self) -> Vec<(f64, f64)> {
		self.nodes.iter().map(|n| (n.x, n.y)).collect()
	}

	/// Advance one step. Returns `false` when there was nothing to do.
	pub fn tick(&mut self) -> bool {
		if self.nodes.is_empty() || self.phase == SimulationPhase::Idle {
			return false;
		}

		self.recover_non_finite();
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;

		self.apply_links();
		self.apply_charge();
		self.apply_center();
		for _ in 0..self.params.collision_iterations {
			self.apply_collision();
		}
		self.integrate();
		self.recover_non_finite();

		self.phase = if self.pinned.is_some() {
			SimulationPhase::Running
		} else if self.alpha < self.params.alpha_min {
			debug!("mindmap-graph: layout settled");
			SimulationPhase::Idle
		} else {
			SimulationPhase::Settling
		};
		true
	}

	/// Fix `idx` at `(x, y)` and heat the simulation up. Any previous pin is released.
	pub fn pin(&mut self, idx: usize, x: f64, y: f64) -> bool {
		if idx >= self.nodes.len() || !x.is_finite() || !y.is_finite() {
			return false;
		}
		if let Some(prev) = self.pinned.replace(idx) {
			self.nodes[prev].pin = None;
		}
		let node = &mut self.nodes[idx];
		node.pin = Some((x, y));
		node.x = x;
		node.y = y;
		node.vx = 0.0;
		node.vy = 0.0;

		self.alpha_target = self.params.alpha_reheat;
		self.reheat();
		true
	}

	/// Move the currently pinned node.
	pub fn move_pin(&mut self, x: f64, y: f64) {
		if !x.is_finite() || !y.is_finite() {
			return;
		}
		if let Some(idx) = self.pinned {
			let node = &mut self.nodes[idx];
			node.pin = Some((x, y));
			node.x = x;
			node.y = y;
		}
	}

	/// Release the pinned node where it is and let the layout cool down.
	pub fn unpin(&mut self) {
		if let Some(idx) = self.pinned.take() {
			let node = &mut self.nodes[idx];
			node.pin = None;
			node.vx = 0.0;
			node.vy = 0.0;
		}
		self.alpha_target = 0.0;
	}

	/// Raise alpha to at least the reheat level and resume ticking.
	pub fn reheat(&mut self) {
		if self.nodes.is_empty() {
			return;
		}
		self.alpha = self.alpha.max(self.params.alpha_reheat);
		self.phase = SimulationPhase::Running;
	}

	/// Move the centering target, e.g. after the drawing surface was resized.
	pub fn set_center(&mut self, width: f64, height: f64) {
		self.center = (width / 2.0, height / 2.0);
		self.reheat();
	}

	fn apply_links(&mut self) {
		let alpha = self.alpha;
		for link in &self.links {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = jiggle(&mut self.rng);
			}
			if y == 0.0 {
				y = jiggle(&mut self.rng);
			}
			let l = (x * x + y * y).sqrt();
			let k = (l - link.distance) / l * alpha * link.strength;
			let (x, y) = (x * k, y * k);

			let target = &mut self.nodes[link.target];
			target.vx -= x * link.bias;
			target.vy -= y * link.bias;
			let source = &mut self.nodes[link.source];
			source.vx += x * (1.0 - link.bias);
			source.vy += y * (1.0 - link.bias);
		}
	}

	fn apply_charge(&mut self) {
		let points: Vec<(f64, f64)> = self.nodes.iter().map(|n| (n.x, n.y)).collect();
		let tree = QuadTree::build(&points);
		let field = ChargeField {
			strength: self.params.charge_strength * self.alpha,
			theta2: self.params.charge_theta * self.params.charge_theta,
			distance_min2: self.params.charge_distance_min * self.params.charge_distance_min,
		};
		for i in 0..self.nodes.len() {
			let (fx, fy) = tree.force_on(i, field, &mut self.rng);
			self.nodes[i].vx += fx;
			self.nodes[i].vy += fy;
		}
	}

	fn apply_center(&mut self) {
		let n = self.nodes.len() as f64;
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let shift_x = (sx / n - self.center.0) * self.params.center_strength;
		let shift_y = (sy / n - self.center.1) * self.params.center_strength;
		for node in &mut self.nodes {
			node.x -= shift_x;
			node.y -= shift_y;
		}
	}

	/// Pairwise overlap correction on velocity-predicted positions.
	fn apply_collision(&mut self) {
		let padding = self.params.collision_padding;
		let strength = self.params.collision_strength;
		let n = self.nodes.len();

		for i in 0..n {
			for j in (i + 1)..n {
				let (a, b) = (&self.nodes[i], &self.nodes[j]);
				let (ri, rj) = (a.radius + padding, b.radius + padding);
				let r = ri + rj;
				let mut x = (a.x + a.vx) - (b.x + b.vx);
				let mut y = (a.y + a.vy) - (b.y + b.vy);
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = jiggle(&mut self.rng);
					l += x * x;
				}
				if y == 0.0 {
					y = jiggle(&mut self.rng);
					l += y * y;
				}
				let l = l.sqrt();
				let k = (r - l) / l * strength;
				let (x, y) = (x * k, y * k);
				let share = (rj * rj) / (ri * ri + rj * rj);

				let a = &mut self.nodes[i];
				a.vx += x * share;
				a.vy += y * share;
				let b = &mut self.nodes[j];
				b.vx -= x * (1.0 - share);
				b.vy -= y * (1.0 - share);
			}
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.params.velocity_decay;
		for node in &mut self.nodes {
			if let Some((px, py)) = node.pin {
				node.x = px;
				node.y = py;
				node.vx = 0.0;
				node.vy = 0.0;
			} else {
				node.vx *= keep;
				node.vy *= keep;
				node.x += node.vx;
				node.y += node.vy;
			}
		}
	}

	fn recover_non_finite(&mut self) {
		for (idx, node) in self.nodes.iter_mut().enumerate() {
			if node.x.is_finite() && node.y.is_finite() && node.vx.is_finite() && node.vy.is_finite()
			{
				continue;
			}
			warn!("mindmap-graph: node {idx} diverged, re-seeding near the center");
			let (x, y) = match node.pin {
				Some(pin) => pin,
				None => scatter(&mut self.rng, self.center, self.params.initial_jitter),
			};
			node.x = x;
			node.y = y;
			node.vx = 0.0;
			node.vy = 0.0;
		}
	}

	#[cfg(test)]
	fn poison(&mut self, idx: usize) {
		self.nodes[idx].x = f64::NAN;
		self.nodes[idx].vy = f64::INFINITY;
	}
}

fn scatter<R: Rng>(rng: &mut R, center: (f64, f64), jitter: f64) -> (f64, f64) {
	(
		center.0 + (rng.random::<f64>() - 0.5) * jitter,
		center.1 + (rng.random::<f64>() - 0.5) * jitter,
	)
}
