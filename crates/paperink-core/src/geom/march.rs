//! Zero-level-set tracing: marching squares over a signed scalar field.
//!
//! Produces closed, non-self-intersecting loops with consistent orientation
//! (outer boundaries and holes wind oppositely), which is what makes the
//! shoelace areas in [`super::loops_area`] add up correctly.

use super::field::ScalarField;
use kurbo::{Point, Rect};
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound on sampled grid cells; the step widens beyond this so a
/// pathological stroke cannot stall the interaction loop.
const MAX_CELLS: f64 = 250_000.0;

/// A grid edge, identified by its lower-index node. Crossing points live on
/// edges, so using the edge itself as the key makes segment stitching exact
/// (no floating-point welding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Edge {
    /// Horizontal edge between nodes (i, j) and (i + 1, j).
    H(u32, u32),
    /// Vertical edge between nodes (i, j) and (i, j + 1).
    V(u32, u32),
}

/// Trace the zero level set of `field` inside `region` into closed loops.
///
/// `region` must cover the negative set; it is padded internally so every
/// boundary loop closes. Returns an empty vector when the field is nowhere
/// negative on the sampled grid.
pub fn trace_loops(field: &dyn ScalarField, region: Rect, step: f64) -> Vec<Vec<Point>> {
    if region.width() <= 0.0 && region.height() <= 0.0 {
        return Vec::new();
    }
    let region = region.inflate(2.0 * step, 2.0 * step);
    let step = widen_step(region, step);
    let cols = (region.width() / step).ceil().max(1.0) as usize;
    let rows = (region.height() / step).ceil().max(1.0) as usize;
    let nx = cols + 1;
    let (x0, y0) = (region.x0, region.y0);
    let node = |i: usize, j: usize| Point::new(x0 + i as f64 * step, y0 + j as f64 * step);

    let mut values = vec![0.0f64; nx * (rows + 1)];
    for j in 0..=rows {
        for i in 0..=cols {
            values[j * nx + i] = field.value(node(i, j));
        }
    }
    let at = |i: usize, j: usize| values[j * nx + i];

    // Interpolated boundary crossing on a grid edge.
    let edge_point = |edge: Edge| -> Point {
        match edge {
            Edge::H(i, j) => {
                let (i, j) = (i as usize, j as usize);
                let (va, vb) = (at(i, j), at(i + 1, j));
                let t = (va / (va - vb)).clamp(0.0, 1.0);
                Point::new(x0 + (i as f64 + t) * step, y0 + j as f64 * step)
            }
            Edge::V(i, j) => {
                let (i, j) = (i as usize, j as usize);
                let (va, vb) = (at(i, j), at(i, j + 1));
                let t = (va / (va - vb)).clamp(0.0, 1.0);
                Point::new(x0 + i as f64 * step, y0 + (j as f64 + t) * step)
            }
        }
    };

    // Each crossed edge is entered by exactly one cell and left by exactly
    // one neighbor, so `next` is a bijection whose cycles are the loops.
    let mut next: BTreeMap<Edge, Edge> = BTreeMap::new();
    for j in 0..rows {
        for i in 0..cols {
            let case = (at(i, j) < 0.0) as u8
                | ((at(i + 1, j) < 0.0) as u8) << 1
                | ((at(i + 1, j + 1) < 0.0) as u8) << 2
                | ((at(i, j + 1) < 0.0) as u8) << 3;
            if case == 0 || case == 15 {
                continue;
            }
            let top = Edge::H(i as u32, j as u32);
            let bottom = Edge::H(i as u32, j as u32 + 1);
            let left = Edge::V(i as u32, j as u32);
            let right = Edge::V(i as u32 + 1, j as u32);
            match case {
                1 => {
                    next.insert(left, top);
                }
                2 => {
                    next.insert(top, right);
                }
                3 => {
                    next.insert(left, right);
                }
                4 => {
                    next.insert(right, bottom);
                }
                6 => {
                    next.insert(top, bottom);
                }
                7 => {
                    next.insert(left, bottom);
                }
                8 => {
                    next.insert(bottom, left);
                }
                9 => {
                    next.insert(bottom, top);
                }
                11 => {
                    next.insert(bottom, right);
                }
                12 => {
                    next.insert(right, left);
                }
                13 => {
                    next.insert(right, top);
                }
                14 => {
                    next.insert(top, left);
                }
                // Saddles: disambiguate with the cell-center sample.
                5 => {
                    let center = field.value(Point::new(
                        x0 + (i as f64 + 0.5) * step,
                        y0 + (j as f64 + 0.5) * step,
                    ));
                    if center < 0.0 {
                        next.insert(right, top);
                        next.insert(left, bottom);
                    } else {
                        next.insert(left, top);
                        next.insert(right, bottom);
                    }
                }
                10 => {
                    let center = field.value(Point::new(
                        x0 + (i as f64 + 0.5) * step,
                        y0 + (j as f64 + 0.5) * step,
                    ));
                    if center < 0.0 {
                        next.insert(top, left);
                        next.insert(bottom, right);
                    } else {
                        next.insert(top, right);
                        next.insert(bottom, left);
                    }
                }
                _ => unreachable!(),
            }
        }
    }

    let min_area = step * step;
    let tolerance = step * 0.3;
    let mut visited: BTreeSet<Edge> = BTreeSet::new();
    let mut loops = Vec::new();
    for &start in next.keys() {
        if visited.contains(&start) {
            continue;
        }
        let mut points = Vec::new();
        let mut cursor = start;
        loop {
            visited.insert(cursor);
            points.push(edge_point(cursor));
            match next.get(&cursor) {
                Some(&follow) if follow != start => cursor = follow,
                _ => break,
            }
        }
        let simplified = rdp_simplify_closed(&points, tolerance);
        if simplified.len() >= 3 && super::loop_signed_area(&simplified).abs() >= min_area {
            loops.push(simplified);
        }
    }
    loops
}

fn widen_step(region: Rect, step: f64) -> f64 {
    let cells = (region.width() / step) * (region.height() / step);
    if cells > MAX_CELLS {
        step * (cells / MAX_CELLS).sqrt()
    } else {
        step
    }
}

/// Ramer-Douglas-Peucker simplification of a closed loop: the ring is split
/// at its first point, simplified as two open halves, and rejoined.
fn rdp_simplify_closed(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 4 {
        return points.to_vec();
    }
    let pivot = points.len() / 2;
    let mut first = rdp_simplify(&points[..=pivot], tolerance);
    let mut rest = points[pivot..].to_vec();
    rest.push(points[0]);
    let second = rdp_simplify(&rest, tolerance);
    first.pop();
    first.extend_from_slice(&second[..second.len() - 1]);
    first
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let d = line_end - line_start;
    let len_sq = d.hypot2();
    if len_sq < f64::EPSILON {
        return (point - line_start).hypot();
    }
    (d.cross(point - line_start)).abs() / len_sq.sqrt()
}
