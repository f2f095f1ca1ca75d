//! Barnes-Hut quadtree for the many-body repulsion force.
//!
//! Cells are stored in a flat arena. Every cell tracks the number of bodies
//! below it and their summed coordinates, so the center of mass is available
//! without a second pass. Coincident bodies stop splitting at [`MAX_DEPTH`]
//! and share a leaf.

use rand::Rng;

const MAX_DEPTH: usize = 32;

#[derive(Clone, Debug)]
struct Cell {
	min_x: f64,
	min_y: f64,
	size: f64,
	mass: f64,
	sum_x: f64,
	sum_y: f64,
	children: Option<[usize; 4]>,
	bodies: Vec<usize>,
}

impl Cell {
	fn new(min_x: f64, min_y: f64, size: f64) -> Self {
		Self {
			min_x,
			min_y,
			size,
			mass: 0.0,
			sum_x: 0.0,
			sum_y: 0.0,
			children: None,
			bodies: Vec::new(),
		}
	}

	fn quadrant(&self, x: f64, y: f64) -> usize {
		let half = self.size / 2.0;
		let right = x >= self.min_x + half;
		let bottom = y >= self.min_y + half;
		(right as usize) | ((bottom as usize) << 1)
	}

	fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.min_x && x < self.min_x + self.size && y >= self.min_y && y < self.min_y + self.size
	}

	fn center_of_mass(&self) -> (f64, f64) {
		(self.sum_x / self.mass, self.sum_y / self.mass)
	}
}

/// Parameters of one many-body evaluation.
#[derive(Clone, Copy, Debug)]
pub struct ChargeField {
	/// Per-body strength already scaled by alpha. Negative repels.
	pub strength: f64,
	/// Barnes-Hut accuracy threshold squared.
	pub theta2: f64,
	/// Distances below this (squared) are softened to avoid blow-ups.
	pub distance_min2: f64,
}

/// Spatial index over a snapshot of body positions.
#[derive(Clone, Debug)]
pub struct QuadTree {
	cells: Vec<Cell>,
	points: Vec<(f64, f64)>,
}

impl QuadTree {
	pub fn build(points: &[(f64, f64)]) -> Self {
		let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
		let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for &(x, y) in points {
			min_x = min_x.min(x);
			min_y = min_y.min(y);
			max_x = max_x.max(x);
			max_y = max_y.max(y);
		}
		if points.is_empty() {
			(min_x, min_y, max_x, max_y) = (0.0, 0.0, 1.0, 1.0);
		}
		let size = (max_x - min_x).max(max_y - min_y).max(1.0) * (1.0 + 1e-9);

		let mut tree = Self {
			cells: vec![Cell::new(min_x, min_y, size)],
			points: points.to_vec(),
		};
		for body in 0..points.len() {
			tree.insert(0, body, 0);
		}
		tree
	}

	pub fn len(&self) -> usize {
		self.points.len()
	}

	pub fn is_empty(&self) -> bool {
		self.points.is_empty()
	}

	/// Total mass and center of mass of the whole tree.
	pub fn root_mass(&self) -> (f64, Option<(f64, f64)>) {
		let root = &self.cells[0];
		let center = (root.mass > 0.0).then(|| root.center_of_mass());
		(root.mass, center)
	}

	fn insert(&mut self, cell: usize, body: usize, depth: usize) {
		let (x, y) = self.points[body];
		{
			let c = &mut self.cells[cell];
			c.mass += 1.0;
			c.sum_x += x;
			c.sum_y += y;
		}

		if let Some(children) = self.cells[cell].children {
			let q = self.cells[cell].quadrant(x, y);
			self.insert(children[q], body, depth + 1);
			return;
		}

		if self.cells[cell].bodies.is_empty() || depth >= MAX_DEPTH {
			self.cells[cell].bodies.push(body);
			return;
		}

		let children = self.subdivide(cell);
		let previous = std::mem::take(&mut self.cells[cell].bodies);
		for other in previous.into_iter().chain(std::iter::once(body)) {
			let (ox, oy) = self.points[other];
			let q = self.cells[cell].quadrant(ox, oy);
			self.insert(children[q], other, depth + 1);
		}
	}

	fn subdivide(&mut self, cell: usize) -> [usize; 4] {
		let (min_x, min_y, half) = {
			let c = &self.cells[cell];
			(c.min_x, c.min_y, c.size / 2.0)
		};
		let first = self.cells.len();
		self.cells.push(Cell::new(min_x, min_y, half));
		self.cells.push(Cell::new(min_x + half, min_y, half));
		self.cells.push(Cell::new(min_x, min_y + half, half));
		self.cells.push(Cell::new(min_x + half, min_y + half, half));
		let children = [first, first + 1, first + 2, first + 3];
		self.cells[cell].children = Some(children);
		children
	}

	/// Velocity change on `body` from every other body, approximating distant cells.
	pub fn force_on<R: Rng>(&self, body: usize, field: ChargeField, rng: &mut R) -> (f64, f64) {
		let (x, y) = self.points[body];
		let (mut fx, mut fy) = (0.0, 0.0);
		let mut stack = vec![0];

		while let Some(idx) = stack.pop() {
			let cell = &self.cells[idx];
			if cell.mass == 0.0 {
				continue;
			}

			if let Some(children) = cell.children {
				let (cx, cy) = cell.center_of_mass();
				let (dx, dy) = (cx - x, cy - y);
				let l = dx * dx + dy * dy;
				if !cell.contains(x, y) && cell.size * cell.size / field.theta2 < l {
					let l = soften(l, field.distance_min2);
					fx += dx * field.strength * cell.mass / l;
					fy += dy * field.strength * cell.mass / l;
				} else {
					stack.extend(children);
				}
				continue;
			}

			for &other in &cell.bodies {
				if other == body {
					continue;
				}
				let (ox, oy) = self.points[other];
				let (mut dx, mut dy) = (ox - x, oy - y);
				if dx == 0.0 {
					dx = jiggle(rng);
				}
				if dy == 0.0 {
					dy = jiggle(rng);
				}
				let l = soften(dx * dx + dy * dy, field.distance_min2);
				fx += dx * field.strength / l;
				fy += dy * field.strength / l;
			}
		}

		(fx, fy)
	}
}

fn soften(l: f64, distance_min2: f64) -> f64 {
	if l < distance_min2 {
		(distance_min2 * l).sqrt()
	} else {
		l
	}
}

/// Tiny random offset used to separate coincident points.
pub fn jiggle<R: Rng>(rng: &mut R) -> f64 {
	(rng.random::<f64>() - 0.5) * 1e-6
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	fn field(strength: f64) -> ChargeField {
		ChargeField {
			strength,
			theta2: 0.81,
			distance_min2: 1.0,
		}
	}

	#[test]
	fn root_tracks_mass_and_centroid() {
		let tree = QuadTree::build(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
		let (mass, center) = tree.root_mass();
		assert_eq!(mass, 4.0);
		let (cx, cy) = center.unwrap();
		assert!((cx - 5.0).abs() < 1e-9);
		assert!((cy - 5.0).abs() < 1e-9);
	}

	#[test]
	fn empty_tree_has_no_center() {
		let tree = QuadTree::build(&[]);
		assert!(tree.is_empty());
		assert_eq!(tree.root_mass(), (0.0, None));
	}

	#[test]
	fn coincident_points_do_not_recurse_forever() {
		let points = vec![(3.0, 3.0); 50];
		let tree = QuadTree::build(&points);
		assert_eq!(tree.len(), 50);
		let mut rng = SmallRng::seed_from_u64(1);
		let (fx, fy) = tree.force_on(0, field(-30.0), &mut rng);
		assert!(fx.is_finite() && fy.is_finite());
	}

	#[test]
	fn negative_strength_repels() {
		let tree = QuadTree::build(&[(0.0, 0.0), (10.0, 0.0)]);
		let mut rng = SmallRng::seed_from_u64(1);
		let (fx, _) = tree.force_on(0, field(-30.0), &mut rng);
		assert!(fx < 0.0, "left body should be pushed left, got {fx}");
		let (fx, _) = tree.force_on(1, field(-30.0), &mut rng);
		assert!(fx > 0.0);
	}

	#[test]
	fn approximation_is_close_to_exact_sum() {
		let mut points = vec![(0.0, 0.0)];
		for i in 0..10 {
			for j in 0..10 {
				points.push((500.0 + i as f64 * 3.0, 500.0 + j as f64 * 3.0));
			}
		}
		let tree = QuadTree::build(&points);
		let mut rng = SmallRng::seed_from_u64(7);
		let (fx, fy) = tree.force_on(0, field(-30.0), &mut rng);

		let (mut ex, mut ey) = (0.0, 0.0);
		for &(x, y) in &points[1..] {
			let l = x * x + y * y;
			ex += x * -30.0 / l;
			ey += y * -30.0 / l;
		}
		assert!((fx - ex).abs() / ex.abs() < 0.05);
		assert!((fy - ey).abs() / ey.abs() < 0.05);
	}
}
