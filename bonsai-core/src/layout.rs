//! Tree layout: trunk, branch curves and leaf shapes for a mastery snapshot.
//!
//! Everything here is a pure function of the snapshot, the [`Config`] and
//! the random source used for leaf jitter. Inputs are not validated;
//! scores outside `[0, 1]` give negative lengths or inverted leaves. Call
//! [`MasteryTree::validate`] upstream if that matters.
//!
//! Coordinates are logical canvas units, origin top-left, y down.

use glam::Vec2;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::{
    bezier::{self, CubicBezier, direction_from_vertical, rotate_about},
    config::{Config, LeafPlacement},
    mastery::{Branch, Concept, MasteryTree},
    palette::{self, LegendEntry, Rgb},
    types::ShapeId,
};

/// Opacity of leaf fills.
pub const LEAF_OPACITY: f32 = 0.9;

/// Stroke width of leaf outlines.
pub const LEAF_STROKE: f32 = 1.0;

// Scores arrive as f64; geometry is f32 from here on.

#[inline]
pub fn branch_length(growth: f64) -> f32 {
    (102.0 + growth * 102.0) as f32
}

#[inline]
pub fn stroke_width(health: f64) -> f32 {
    (6.8 + health * 5.1) as f32
}

#[inline]
pub fn leaf_size(mastery: f64) -> f32 {
    (20.4 + mastery * 25.5) as f32
}

/// Curve parameter of the `c_index`-th leaf. Reaches the tip at index 2
/// and extrapolates past it after that.
#[inline]
pub fn leaf_parameter(c_index: usize) -> f32 {
    0.6 + c_index as f32 * 0.2
}

/// Odd leaves tilt clockwise, even ones counter-clockwise.
#[inline]
pub fn leaf_rotation(branch_angle: f32, c_index: usize) -> f32 {
    branch_angle + if c_index % 2 == 1 { 30.0 } else { -30.0 }
}

/// Closed trunk outline: two mirrored cubic sides joined by a flat top.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrunkShape {
    /// Base-left up to top-left.
    pub left: CubicBezier,
    /// Top-right down to base-right.
    pub right: CubicBezier,
}

impl TrunkShape {
    /// Left/right point pairs from base to top, for strip tessellation.
    ///
    /// The sides are S-shaped, so the outline is not convex.
    pub fn strip(&self, segments: usize) -> Vec<(Vec2, Vec2)> {
        let left = self.left.flatten(segments);
        let right = self.right.flatten(segments);
        left.into_iter().zip(right.into_iter().rev()).collect()
    }

    pub fn to_svg(&self) -> String {
        let (l, r) = (&self.left, &self.right);
        format!(
            "M {} {} C {} {} {} {} {} {} L {} {} C {} {} {} {} {} {} Z",
            bezier::fmt(l.p0.x),
            bezier::fmt(l.p0.y),
            bezier::fmt(l.p1.x),
            bezier::fmt(l.p1.y),
            bezier::fmt(l.p2.x),
            bezier::fmt(l.p2.y),
            bezier::fmt(l.p3.x),
            bezier::fmt(l.p3.y),
            bezier::fmt(r.p0.x),
            bezier::fmt(r.p0.y),
            bezier::fmt(r.p1.x),
            bezier::fmt(r.p1.y),
            bezier::fmt(r.p2.x),
            bezier::fmt(r.p2.y),
            bezier::fmt(r.p3.x),
            bezier::fmt(r.p3.y),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GroundEllipse {
    pub center: Vec2,
    pub radii: Vec2,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BranchCurve {
    pub id: ShapeId,
    /// Position in the snapshot; drives the stagger delay.
    pub index: usize,
    pub curve: CubicBezier,
    pub length: f32,
    pub stroke_width: f32,
    pub color: Rgb,
}

impl BranchCurve {
    pub fn start(&self) -> Vec2 {
        self.curve.p0
    }

    pub fn end(&self) -> Vec2 {
        self.curve.p3
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeafShape {
    pub id: ShapeId,
    pub branch_id: ShapeId,
    pub branch_index: usize,
    pub concept_index: usize,
    /// Jittered base of the leaf; both halves start and end here.
    pub center: Vec2,
    pub size: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    /// Base to tip.
    pub left: CubicBezier,
    /// Tip back to base.
    pub right: CubicBezier,
    pub color: Rgb,
}

impl LeafShape {
    pub fn tip(&self) -> Vec2 {
        self.left.p3
    }

    pub fn outline(&self, segments: usize) -> Vec<Vec2> {
        let mut pts = self.left.flatten(segments);
        pts.extend(self.right.flatten(segments).into_iter().skip(1));
        pts
    }

    pub fn to_svg(&self) -> String {
        let (l, r) = (&self.left, &self.right);
        format!(
            "M {} {} C {} {}, {} {}, {} {} C {} {}, {} {}, {} {} Z",
            bezier::fmt(l.p0.x),
            bezier::fmt(l.p0.y),
            bezier::fmt(l.p1.x),
            bezier::fmt(l.p1.y),
            bezier::fmt(l.p2.x),
            bezier::fmt(l.p2.y),
            bezier::fmt(l.p3.x),
            bezier::fmt(l.p3.y),
            bezier::fmt(r.p1.x),
            bezier::fmt(r.p1.y),
            bezier::fmt(r.p2.x),
            bezier::fmt(r.p2.y),
            bezier::fmt(r.p3.x),
            bezier::fmt(r.p3.y),
        )
    }
}

/// Everything a host needs to draw one snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Layout {
    pub canvas: Vec2,
    pub ground: GroundEllipse,
    pub trunk: TrunkShape,
    /// Snapshot order.
    pub branches: Vec<BranchCurve>,
    /// Eligible concepts only, in tree order.
    pub leaves: Vec<LeafShape>,
    pub legend: Vec<LegendEntry>,
}

impl Layout {
    pub fn branch(&self, id: &str) -> Option<&BranchCurve> {
        self.branches.iter().find(|b| b.id == id)
    }

    pub fn leaf(&self, id: &str) -> Option<&LeafShape> {
        self.leaves.iter().find(|l| l.id == id)
    }

    /// Id of the topmost shape under `p`, considering only ids for which
    /// `visible` returns true.
    ///
    /// Leaves are drawn over branches, and later shapes over earlier ones,
    /// so the search runs in reverse draw order.
    pub fn hit_test(
        &self,
        p: Vec2,
        segments: usize,
        visible: impl Fn(&str) -> bool,
    ) -> Option<&str> {
        if let Some(leaf) = self
            .leaves
            .iter()
            .rev()
            .filter(|l| visible(&l.id))
            .find(|l| bezier::polygon_contains(p, &l.outline(segments)))
        {
            return Some(&leaf.id);
        }

        self.branches
            .iter()
            .rev()
            .filter(|b| visible(&b.id))
            .find(|b| {
                bezier::distance_to_polyline(p, &b.curve.flatten(segments)) <= b.stroke_width / 2.0
            })
            .map(|b| b.id.as_str())
    }
}

pub fn trunk_shape(cfg: &Config) -> TrunkShape {
    let base = cfg.trunk_base();
    let (cx, cy) = (base.x, base.y);
    let (w, h) = (cfg.trunk_width, cfg.trunk_height);

    let left = CubicBezier::new(
        Vec2::new(cx - w / 2.0, cy),
        Vec2::new(cx - w, cy - h / 3.0),
        Vec2::new(cx - w / 3.0, cy - h / 2.0),
        Vec2::new(cx - w / 4.0, cy - h),
    );
    let right = CubicBezier::new(
        Vec2::new(cx + w / 4.0, cy - h),
        Vec2::new(cx + w / 3.0, cy - h / 2.0),
        Vec2::new(cx + w, cy - h / 3.0),
        Vec2::new(cx + w / 2.0, cy),
    );
    TrunkShape { left, right }
}

pub fn ground_ellipse(cfg: &Config) -> GroundEllipse {
    let base = cfg.trunk_base();
    GroundEllipse {
        center: Vec2::new(base.x, base.y + 10.0),
        radii: Vec2::new(cfg.trunk_width * 3.0, cfg.trunk_width / 2.0),
    }
}

/// Builds the curve for one branch.
///
/// 1. Length is [`branch_length`] of `branch.growth`.
/// 2. The curve starts at [`Config::branch_origin`] and runs along
///    [`direction_from_vertical`] of `branch.angle`.
/// 3. Both control points sit on the chord, at 30% and 70% of the length,
///    so the curve is straight.
/// 4. Stroke width comes from [`stroke_width`] of `branch.health`, and the
///    color from the subject via [`palette::color_for_subject`].
///
/// ### Parameters
/// - `branch` - Snapshot branch to lay out.
/// - `index` - Position of the branch in the snapshot; stored on the
///   result for stagger delays.
/// - `cfg` - Canvas constants.
///
/// ### Returns
/// The [`BranchCurve`]; every branch gets one regardless of its scores.
pub fn branch_curve(branch: &Branch, index: usize, cfg: &Config) -> BranchCurve {
    let length = branch_length(branch.growth);
    let start = cfg.branch_origin();
    let dir = direction_from_vertical(branch.angle);

    BranchCurve {
        id: branch.id.clone(),
        index,
        curve: CubicBezier::new(
            start,
            start + dir * (length * 0.3),
            start + dir * (length * 0.7),
            start + dir * length,
        ),
        length,
        stroke_width: stroke_width(branch.health),
        color: palette::color_for_subject(&branch.subject),
    }
}

/// Builds the leaf for one concept.
///
/// 1. Concepts at or below [`MASTERY_THRESHOLD`](crate::mastery::MASTERY_THRESHOLD)
///    get no leaf.
/// 2. The base is found on the branch curve at [`leaf_parameter`] of
///    `c_index`, either directly (`Parametric`) or by arc length
///    (`ArcLength`), then offset by `jitter`.
/// 3. Size is [`leaf_size`] of the mastery; rotation is [`leaf_rotation`].
/// 4. In the unrotated frame the tip is `(0, -size)`; the left half uses
///    control points `(-0.8·size, -0.2·size)` then `(-0.5·size, -0.5·size)`,
///    the right half mirrors them in reverse. Every point is rotated about
///    the base.
///
/// ### Parameters
/// - `branch` - Curve of the parent branch, already laid out.
/// - `branch_angle` - Parent branch angle in degrees, for the leaf tilt.
/// - `concept` - Concept to draw.
/// - `c_index` - Index of the concept within its branch, counting
///   ineligible concepts too.
/// - `jitter` - Offset added to the point found on the curve.
/// - `cfg` - Chooses the placement mode and curve sampling.
///
/// ### Returns
/// `Some(LeafShape)` for an eligible concept, `None` otherwise.
pub fn leaf_shape(
    branch: &BranchCurve,
    branch_angle: f32,
    concept: &Concept,
    c_index: usize,
    jitter: Vec2,
    cfg: &Config,
) -> Option<LeafShape> {
    if !concept.is_eligible() {
        return None;
    }

    let t = leaf_parameter(c_index);
    let on_curve = match cfg.leaf_placement {
        LeafPlacement::Parametric => branch.curve.point(t),
        LeafPlacement::ArcLength => branch.curve.point_at_fraction(t, cfg.curve_samples),
    };
    let center = on_curve + jitter;
    let size = leaf_size(concept.mastery);
    let rotation = leaf_rotation(branch_angle, c_index);

    let rot = |dx: f32, dy: f32| rotate_about(center + Vec2::new(dx, dy), center, rotation);
    let tip = rot(0.0, -size);
    let left_1 = rot(-size * 0.5, -size * 0.5);
    let left_2 = rot(-size * 0.8, -size * 0.2);
    let right_1 = rot(size * 0.5, -size * 0.5);
    let right_2 = rot(size * 0.8, -size * 0.2);

    Some(LeafShape {
        id: concept.id.clone(),
        branch_id: branch.id.clone(),
        branch_index: branch.index,
        concept_index: c_index,
        center,
        size,
        rotation,
        left: CubicBezier::new(center, left_2, left_1, tip),
        right: CubicBezier::new(tip, right_1, right_2, center),
        color: branch.color,
    })
}

/// Lays out the whole tree, drawing leaf jitter from `rng`.
///
/// For each branch, in snapshot order:
///
/// 1. Build its curve with [`branch_curve`].
/// 2. For each eligible concept, draw two jitter samples (x then y)
///    uniformly in `±cfg.leaf_jitter` and build the leaf with
///    [`leaf_shape`]. Ineligible concepts draw nothing from `rng`.
///
/// The ground, trunk and legend depend only on `cfg`.
///
/// ### Parameters
/// - `tree` - Snapshot to lay out; not validated.
/// - `cfg` - Canvas constants and leaf placement options.
/// - `rng` - Source of leaf jitter. A seeded rng gives a reproducible
///   layout; see [`layout_seeded`].
///
/// ### Returns
/// A [`Layout`] with one curve per branch and one leaf per eligible
/// concept.
pub fn layout(tree: &MasteryTree, cfg: &Config, rng: &mut impl Rng) -> Layout {
    let mut branches = Vec::with_capacity(tree.branches.len());
    let mut leaves = Vec::with_capacity(tree.branches.len() * 2);

    for (index, branch) in tree.branches.iter().enumerate() {
        let curve = branch_curve(branch, index, cfg);

        for (c_index, concept) in branch.concepts.iter().enumerate() {
            if !concept.is_eligible() {
                tracing::trace!(
                    concept = %concept.id,
                    mastery = concept.mastery,
                    "skipping leaf below mastery threshold"
                );
                continue;
            }
            let jitter = sample_jitter(cfg.leaf_jitter, rng);
            leaves.extend(leaf_shape(&curve, branch.angle, concept, c_index, jitter, cfg));
        }

        branches.push(curve);
    }

    tracing::debug!(
        branches = branches.len(),
        leaves = leaves.len(),
        placement = ?cfg.leaf_placement,
        "computed tree layout"
    );

    Layout {
        canvas: cfg.canvas_size(),
        ground: ground_ellipse(cfg),
        trunk: trunk_shape(cfg),
        branches,
        leaves,
        legend: palette::legend(),
    }
}

/// [`layout`] with a `StdRng` seeded from `seed`.
pub fn layout_seeded(tree: &MasteryTree, cfg: &Config, seed: u64) -> Layout {
    let mut rng = StdRng::seed_from_u64(seed);
    layout(tree, cfg, &mut rng)
}

fn sample_jitter(half_range: f32, rng: &mut impl Rng) -> Vec2 {
    if half_range <= 0.0 {
        return Vec2::ZERO;
    }
    let x = rng.random_range(-half_range..=half_range);
    let y = rng.random_range(-half_range..=half_range);
    Vec2::new(x, y)
}
