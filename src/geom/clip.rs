//! Boolean operations on polygon rings.
//!
//! Both inputs are lists of rings under the even-odd rule. Every edge is
//! split where it meets the other set, each piece is classified as inside,
//! outside or on the shared boundary, the wanted pieces are selected per
//! operation and finally chained back into rings.

use std::fmt;

use super::Polygon;
use super::polygon::signed_area;
use crate::defaults::GEOMETRY_EPSILON;
use crate::log::trace;
use crate::types::Point;

const SNAP: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
    Xor,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BooleanOp::Union => "union",
            BooleanOp::Intersection => "intersection",
            BooleanOp::Difference => "difference",
            BooleanOp::Xor => "xor",
        })
    }
}

pub fn union(a: &[Vec<Point>], b: &[Vec<Point>]) -> Vec<Polygon> {
    boolean(a, b, BooleanOp::Union)
}

pub fn intersection(a: &[Vec<Point>], b: &[Vec<Point>]) -> Vec<Polygon> {
    boolean(a, b, BooleanOp::Intersection)
}

pub fn difference(a: &[Vec<Point>], b: &[Vec<Point>]) -> Vec<Polygon> {
    boolean(a, b, BooleanOp::Difference)
}

pub fn xor(a: &[Vec<Point>], b: &[Vec<Point>]) -> Vec<Polygon> {
    boolean(a, b, BooleanOp::Xor)
}

/// Run `op` on two ring sets. Result rings are counter-clockwise for
/// filled regions and clockwise for holes.
pub fn boolean(subject: &[Vec<Point>], clip: &[Vec<Point>], op: BooleanOp) -> Vec<Polygon> {
    let a = normalize_set(subject);
    let b = normalize_set(clip);
    let rings = match op {
        BooleanOp::Xor => {
            let mut out = select(&a, &b, BooleanOp::Difference);
            out.extend(select(&b, &a, BooleanOp::Difference));
            out
        }
        op => select(&a, &b, op),
    };
    trace!(%op, rings = rings.len(), "polygon boolean");
    rings.into_iter().map(Polygon::new).collect()
}

/// Subtract `inner` from `outer`.
///
/// When `inner` sits strictly inside `outer` the result is a single ring
/// with a bridge from the outer boundary to the inner one, so the hole is
/// part of one outline instead of a second nested ring.
pub fn cut(outer: &[Point], inner: &[Point]) -> Vec<Polygon> {
    let outer_ring = orient(open_ring(outer), true);
    let inner_ring = orient(open_ring(inner), true);
    if outer_ring.len() < 3 {
        return Vec::new();
    }
    if inner_ring.len() < 3 {
        return vec![Polygon::new(outer_ring)];
    }
    let outer_set = [outer_ring.clone()];
    let inner_set = [inner_ring.clone()];
    let crossing = rings_touch(&outer_ring, &inner_ring);
    if !crossing && inner_ring.iter().all(|p| inside_set(&outer_set, *p)) {
        return vec![Polygon::new(bridge(&outer_ring, &inner_ring))];
    }
    if !crossing && outer_ring.iter().all(|p| inside_set(&inner_set, *p)) {
        return Vec::new();
    }
    boolean(&outer_set, &inner_set, BooleanOp::Difference)
}

fn bridge(outer: &[Point], inner: &[Point]) -> Vec<Point> {
    let mut hole: Vec<Point> = inner.to_vec();
    hole.reverse();
    let mut best = (0, 0, f64::INFINITY);
    for (i, o) in outer.iter().enumerate() {
        for (j, h) in hole.iter().enumerate() {
            let d = o.distance_squared(*h);
            if d < best.2 {
                best = (i, j, d);
            }
        }
    }
    let (i, j, _) = best;
    let mut ring = Vec::with_capacity(outer.len() + hole.len() + 2);
    ring.extend_from_slice(&outer[..=i]);
    ring.extend(hole[j..].iter().chain(&hole[..j]));
    ring.push(hole[j]);
    ring.push(outer[i]);
    ring.extend_from_slice(&outer[i + 1..]);
    ring
}

// ============================================================================
// Ring normalization
// ============================================================================

/// Strip the closing duplicate and repeated consecutive points.
fn open_ring(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_none_or(|q| q.distance(*p) > SNAP) {
            out.push(*p);
        }
    }
    while out.len() > 1 && out[0].distance(out[out.len() - 1]) <= SNAP {
        out.pop();
    }
    out
}

fn orient(mut ring: Vec<Point>, counter_clockwise: bool) -> Vec<Point> {
    if (signed_area(&ring) > 0.0) != counter_clockwise {
        ring.reverse();
    }
    ring
}

/// Outer rings counter-clockwise, rings nested an odd number of times clockwise.
fn normalize_set(rings: &[Vec<Point>]) -> Vec<Vec<Point>> {
    let open: Vec<Vec<Point>> = rings
        .iter()
        .map(|r| open_ring(r))
        .filter(|r| r.len() >= 3 && signed_area(r).abs() > GEOMETRY_EPSILON)
        .collect();
    open.iter()
        .enumerate()
        .map(|(i, ring)| {
            let depth = open
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && point_in_ring(other, ring[0]))
                .count();
            orient(ring.clone(), depth % 2 == 0)
        })
        .collect()
}

// ============================================================================
// Predicates
// ============================================================================

fn point_in_ring(ring: &[Point], p: Point) -> bool {
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

fn inside_set(set: &[Vec<Point>], p: Point) -> bool {
    set.iter().filter(|r| point_in_ring(r, p)).count() % 2 == 1
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= 1e-18 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn ring_edges(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

fn rings_touch(a: &[Point], b: &[Point]) -> bool {
    ring_edges(a).any(|(a1, a2)| ring_edges(b).any(|(b1, b2)| !edge_hits(a1, a2, b1, b2).is_empty()))
}

/// Parameters along `a1 → a2` and `b1 → b2` where the two edges meet.
/// Collinear overlaps report both ends of the overlap.
fn edge_hits(a1: Point, a2: Point, b1: Point, b2: Point) -> Vec<(f64, f64)> {
    let da = a2 - a1;
    let db = b2 - b1;
    let denom = da.perp_dot(db);
    let offset = b1 - a1;
    let tol = 1e-12;
    if denom.abs() > GEOMETRY_EPSILON * da.length() * db.length() {
        let t = offset.perp_dot(db) / denom;
        let u = offset.perp_dot(da) / denom;
        if (-tol..=1.0 + tol).contains(&t) && (-tol..=1.0 + tol).contains(&u) {
            return vec![(t.clamp(0.0, 1.0), u.clamp(0.0, 1.0))];
        }
        return Vec::new();
    }
    // parallel: only collinear overlaps count
    if segment_distance(b1, a1, a2).min(segment_distance(b2, a1, a2)) > SNAP
        && segment_distance(a1, b1, b2).min(segment_distance(a2, b1, b2)) > SNAP
    {
        return Vec::new();
    }
    if offset.perp_dot(da).abs() > SNAP * da.length() {
        return Vec::new();
    }
    let la = da.length_squared();
    let lb = db.length_squared();
    let param_a = |p: Point| (p - a1).dot(da) / la;
    let param_b = |p: Point| (p - b1).dot(db) / lb;
    let mut hits = Vec::new();
    for p in [a1, a2, b1, b2] {
        let t = param_a(p);
        let u = param_b(p);
        if (-tol..=1.0 + tol).contains(&t) && (-tol..=1.0 + tol).contains(&u) {
            hits.push((t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)));
        }
    }
    hits
}

// ============================================================================
// Edge splitting and selection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Inside,
    Outside,
    SharedSame,
    SharedOpposite,
}

#[derive(Default)]
struct Nodes {
    points: Vec<Point>,
}

impl Nodes {
    fn id(&mut self, p: Point) -> usize {
        if let Some(i) = self.points.iter().position(|q| q.distance(p) <= SNAP) {
            return i;
        }
        self.points.push(p);
        self.points.len() - 1
    }
}

/// Split every edge of both sets where the sets meet.
fn split_edges(a: &[Vec<Point>], b: &[Vec<Point>], nodes: &mut Nodes) -> (Vec<(usize, usize)>, Vec<(usize, usize)>) {
    let flat = |set: &[Vec<Point>]| -> Vec<(Point, Point)> {
        set.iter().flat_map(|r| ring_edges(r).collect::<Vec<_>>()).collect()
    };
    let ea = flat(a);
    let eb = flat(b);
    let mut cuts_a: Vec<Vec<(f64, Point)>> = ea.iter().map(|(s, e)| vec![(0.0, *s), (1.0, *e)]).collect();
    let mut cuts_b: Vec<Vec<(f64, Point)>> = eb.iter().map(|(s, e)| vec![(0.0, *s), (1.0, *e)]).collect();

    for (i, (a1, a2)) in ea.iter().enumerate() {
        for (j, (b1, b2)) in eb.iter().enumerate() {
            for (t, u) in edge_hits(*a1, *a2, *b1, *b2) {
                let p = *a1 + (*a2 - *a1) * t;
                cuts_a[i].push((t, p));
                cuts_b[j].push((u, p));
            }
        }
    }

    let mut pieces = |cuts: &mut Vec<Vec<(f64, Point)>>| -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for edge in cuts.iter_mut() {
            edge.sort_by(|x, y| x.0.total_cmp(&y.0));
            let ids: Vec<usize> = edge.iter().map(|(_, p)| nodes.id(*p)).collect();
            for w in ids.windows(2) {
                if w[0] != w[1] {
                    out.push((w[0], w[1]));
                }
            }
        }
        out
    };
    let pa = pieces(&mut cuts_a);
    let pb = pieces(&mut cuts_b);
    (pa, pb)
}

fn classify(
    edge: (usize, usize),
    other_set: &[Vec<Point>],
    other_edges: &[(usize, usize)],
    nodes: &Nodes,
) -> Side {
    if other_edges.contains(&edge) {
        return Side::SharedSame;
    }
    if other_edges.contains(&(edge.1, edge.0)) {
        return Side::SharedOpposite;
    }
    let mid = (nodes.points[edge.0] + nodes.points[edge.1]) * 0.5;
    if inside_set(other_set, mid) {
        Side::Inside
    } else {
        Side::Outside
    }
}

fn select(a: &[Vec<Point>], b: &[Vec<Point>], op: BooleanOp) -> Vec<Vec<Point>> {
    let mut nodes = Nodes::default();
    let (pa, pb) = split_edges(a, b, &mut nodes);

    let mut chosen: Vec<(usize, usize)> = Vec::new();
    for edge in &pa {
        let keep = match (op, classify(*edge, b, &pb, &nodes)) {
            (BooleanOp::Union, Side::Outside | Side::SharedSame) => true,
            (BooleanOp::Intersection, Side::Inside | Side::SharedSame) => true,
            (BooleanOp::Difference, Side::Outside | Side::SharedOpposite) => true,
            _ => false,
        };
        if keep {
            chosen.push(*edge);
        }
    }
    for edge in &pb {
        match (op, classify(*edge, a, &pa, &nodes)) {
            (BooleanOp::Union, Side::Outside) => chosen.push(*edge),
            (BooleanOp::Intersection, Side::Inside) => chosen.push(*edge),
            (BooleanOp::Difference, Side::Inside) => chosen.push((edge.1, edge.0)),
            _ => {}
        }
    }

    chain(&chosen, &nodes)
        .into_iter()
        .map(drop_collinear)
        .filter(|r| r.len() >= 3 && signed_area(r).abs() > GEOMETRY_EPSILON)
        .collect()
}

/// Link directed edges end-to-start into closed rings.
fn chain(edges: &[(usize, usize)], nodes: &Nodes) -> Vec<Vec<Point>> {
    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();
    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let origin = edges[start].0;
        let mut ids = vec![origin];
        let mut at = edges[start].1;
        while at != origin {
            let Some(next) = (0..edges.len()).find(|k| !used[*k] && edges[*k].0 == at) else {
                break;
            };
            used[next] = true;
            ids.push(at);
            at = edges[next].1;
        }
        // open chains come from touching-only contacts and are dropped
        if at == origin {
            rings.push(ids.into_iter().map(|i| nodes.points[i]).collect());
        }
    }
    rings
}

fn drop_collinear(ring: Vec<Point>) -> Vec<Point> {
    let n = ring.len();
    if n < 3 {
        return ring;
    }
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            let cur = ring[i];
            (cur - prev).perp_dot(next - cur).abs() > GEOMETRY_EPSILON
                || (cur - prev).dot(next - cur) < 0.0
        })
        .map(|i| ring[i])
        .collect()
}
