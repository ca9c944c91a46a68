use std::collections::{HashMap, VecDeque};
use std::sync::OnceLock;

use tracing::debug;

use crate::coords::coordinate::Coordinate;
use crate::coords::edges;
use crate::coords::frame::{Frame, FrameKind};
use crate::error::{HelioError, Result};

/// A primitive conversion into the (adjacent) target frame.
pub type EdgeFn = fn(&Coordinate, &Frame) -> Result<Coordinate>;

#[derive(Clone)]
struct Edge {
    from: FrameKind,
    to: FrameKind,
    apply: EdgeFn,
}

/// Directed graph of primitive conversions between frame kinds.
///
/// Composite conversions are found by breadth-first search, so the path
/// with the fewest edges wins. Among equal-length paths, neighbours are
/// explored in [`FrameKind::ALL`] order and the first path discovered is
/// kept.
#[derive(Clone, Default)]
pub struct TransformGraph {
    edges: Vec<Edge>,
}

static BUILTIN: OnceLock<TransformGraph> = OnceLock::new();

impl TransformGraph {
    /// A graph with no edges.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard graph of solar frames, built once and shared read-only.
    pub fn builtin() -> &'static TransformGraph {
        BUILTIN.get_or_init(|| {
            use FrameKind::*;

            let mut g = TransformGraph::empty();
            g.add_edge(HeliocentricInertial, HeliographicStonyhurst, edges::hci_to_hgs);
            g.add_edge(HeliographicStonyhurst, HeliocentricInertial, edges::hgs_to_hci);
            g.add_edge(HeliographicStonyhurst, HeliographicCarrington, edges::hgs_to_hgc);
            g.add_edge(HeliographicCarrington, HeliographicStonyhurst, edges::hgc_to_hgs);
            g.add_edge(HeliographicStonyhurst, Heliocentric, edges::hgs_to_hcc);
            g.add_edge(Heliocentric, HeliographicStonyhurst, edges::hcc_to_hgs);
            g.add_edge(Heliocentric, Helioprojective, edges::hcc_to_hpc);
            g.add_edge(Helioprojective, Heliocentric, edges::hpc_to_hcc);
            g
        })
    }

    /// Register a primitive edge, replacing any existing one for the pair.
    pub fn add_edge(&mut self, from: FrameKind, to: FrameKind, apply: EdgeFn) {
        self.edges.retain(|e| !(e.from == from && e.to == to));
        self.edges.push(Edge { from, to, apply });
    }

    pub fn has_edge(&self, from: FrameKind, to: FrameKind) -> bool {
        self.edge(from, to).is_some()
    }

    fn edge(&self, from: FrameKind, to: FrameKind) -> Option<EdgeFn> {
        self.edges
            .iter()
            .find(|e| e.from == from && e.to == to)
            .map(|e| e.apply)
    }

    fn neighbours(&self, from: FrameKind) -> Vec<FrameKind> {
        let mut out: Vec<FrameKind> = self
            .edges
            .iter()
            .filter(|e| e.from == from)
            .map(|e| e.to)
            .collect();
        out.sort_by_key(|k| k.preference());
        out
    }

    /// Shortest sequence of kinds from `from` to `to`, both ends included.
    pub fn shortest_path(&self, from: FrameKind, to: FrameKind) -> Result<Vec<FrameKind>> {
        if from == to {
            return Ok(vec![from]);
        }

        let mut parent: HashMap<FrameKind, FrameKind> = HashMap::new();
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            for next in self.neighbours(current) {
                if next == from || parent.contains_key(&next) {
                    continue;
                }
                parent.insert(next, current);
                if next == to {
                    let mut path = vec![to];
                    let mut node = to;
                    while let Some(&prev) = parent.get(&node) {
                        path.push(prev);
                        node = prev;
                    }
                    path.reverse();
                    return Ok(path);
                }
                queue.push_back(next);
            }
        }

        Err(HelioError::NoPath { from, to })
    }

    /// Resolve the conversion from `from` to `to` into a reusable plan.
    ///
    /// When the two frames disagree on obstime or observer, the path is
    /// forced through a pivot: Stonyhurst if only the observers differ,
    /// the inertial frame if the obstimes differ. Frames before the pivot
    /// take the source's parameters; the pivot and everything after it take
    /// the target's. Without a conflict, intermediate frames take the
    /// target's parameters and fall back to the source's.
    pub fn plan(&self, from: &Frame, to: &Frame) -> Result<TransformPlan> {
        if from.same_as(to) {
            return Ok(TransformPlan {
                source: from.clone(),
                target: to.clone(),
                steps: Vec::new(),
            });
        }

        let (kinds, pivot_index) = if from.conflicts_with(to) {
            let pivot = if from.obstime() != to.obstime() {
                FrameKind::HeliocentricInertial
            } else {
                FrameKind::HeliographicStonyhurst
            };
            let mut head = self.shortest_path(from.kind(), pivot)?;
            let pivot_index = head.len() - 1;
            let tail = self.shortest_path(pivot, to.kind())?;
            head.extend_from_slice(&tail[1..]);
            (head, pivot_index)
        } else {
            (self.shortest_path(from.kind(), to.kind())?, 0)
        };

        debug!(path = ?kinds, "resolved transform path");

        let last = kinds.len() - 1;
        let mut steps = Vec::with_capacity(last);
        for (i, pair) in kinds.windows(2).enumerate() {
            let index = i + 1;
            let apply = self.edge(pair[0], pair[1]).ok_or(HelioError::NoPath {
                from: pair[0],
                to: pair[1],
            })?;
            let frame = if index == last {
                to.clone()
            } else {
                let (primary, fallback) = if index < pivot_index { (from, to) } else { (to, from) };
                let observer = primary.observer().or(fallback.observer()).copied();
                Frame::from_parts(pair[1], primary.obstime(), observer)?
            };
            steps.push((frame, apply));
        }

        Ok(TransformPlan {
            source: from.clone(),
            target: to.clone(),
            steps,
        })
    }

    /// Convert `coord` into `target`.
    pub fn convert(&self, coord: &Coordinate, target: &Frame) -> Result<Coordinate> {
        self.plan(coord.frame(), target)?.apply(coord)
    }
}

/// A resolved chain of primitive conversions between two frames.
#[derive(Clone)]
pub struct TransformPlan {
    source: Frame,
    target: Frame,
    steps: Vec<(Frame, EdgeFn)>,
}

impl TransformPlan {
    pub fn source(&self) -> &Frame {
        &self.source
    }

    pub fn target(&self) -> &Frame {
        &self.target
    }

    /// Kinds visited, source first.
    pub fn path(&self) -> Vec<FrameKind> {
        std::iter::once(self.source.kind())
            .chain(self.steps.iter().map(|(f, _)| f.kind()))
            .collect()
    }

    /// Intermediate and final frames, in order.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.steps.iter().map(|(f, _)| f)
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply the plan to a coordinate in the plan's source frame.
    pub fn apply(&self, coord: &Coordinate) -> Result<Coordinate> {
        if !coord.frame().same_as(&self.source) {
            return Err(HelioError::IncompatibleFrame {
                source_kind: coord.frame().kind(),
                target_kind: self.source.kind(),
                reason: "coordinate is not in the plan's source frame".into(),
            });
        }
        if self.steps.is_empty() {
            return Ok(Coordinate::from_native(self.target.clone(), *coord.position()));
        }

        let mut current = coord.clone();
        for (frame, apply) in &self.steps {
            current = apply(&current, frame)?;
        }
        Ok(current)
    }
}
