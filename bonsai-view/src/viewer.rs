//! Interactive mastery tree viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], the rendering host for a layout. It
//! owns everything the layout engine deliberately does not: the reveal
//! timer, the visible id sets, hover selection and the camera.

use std::{collections::HashSet, path::PathBuf};

use bonsai_core::{
    config::{Config, LeafPlacement},
    layout::{LEAF_OPACITY, LEAF_STROKE, Layout, layout_seeded},
    mastery::MasteryTree,
    palette::{BARK, Rgb},
    reveal::{self, RevealStage, RevealTimer},
    tooltip::{HoverState, TOOLTIP_SIZE, Tooltip, tooltip_anchor},
    types::{Seconds, ShapeId},
};
use eframe::App;
use glam::Vec2;

/// Segments used when flattening curves for drawing and hit testing.
const SEGMENTS: usize = 32;

/// Main application state for the interactive viewer.
///
/// The per-frame update is:
/// 1. Start the reveal timer on the first frame, since egui time is only
///    known from there on.
/// 2. Poll the timer and refresh the visible id sets on a stage change.
/// 3. Hit-test the pointer against visible shapes and update hover.
/// 4. Paint ground, trunk, branches, leaves and the active tooltip, each
///    scaled by its stagger progress.
///
/// ### Fields
/// - `tree` - Current snapshot.
/// - `source` - File the snapshot came from, for reloading.
/// - `permissive` - Accept snapshots that fail validation on reload.
/// - `cfg` - Layout configuration.
/// - `seed` - Jitter seed of the current layout.
/// - `layout` - Geometry derived from `tree`, `cfg` and `seed`.
///
/// - `timer` - Stage timer for the current mount.
/// - `mounted` - Whether `timer` has been started against egui time.
/// - `visible_branches` / `visible_leaves` - Ids revealed so far.
/// - `hover` - Active tooltip id.
///
/// - `zoom` - Scale from canvas units to screen points.
/// - `pan` - Screen-space pan offset in points.
/// - `show_legend` - Whether the legend overlay is drawn.
pub struct Viewer {
    tree: MasteryTree,
    source: Option<PathBuf>,
    permissive: bool,
    cfg: Config,
    seed: u64,
    layout: Layout,

    timer: RevealTimer,
    mounted: bool,
    visible_branches: HashSet<ShapeId>,
    visible_leaves: HashSet<ShapeId>,
    hover: HoverState,

    zoom: f32,
    pan: egui::Vec2,
    show_legend: bool,
}

impl Viewer {
    /// Creates a viewer for `tree`; nothing is visible until the first frame.
    pub fn new(
        tree: MasteryTree,
        cfg: Config,
        seed: u64,
        source: Option<PathBuf>,
        permissive: bool,
    ) -> Self {
        let layout = layout_seeded(&tree, &cfg, seed);
        Self {
            tree,
            source,
            permissive,
            cfg,
            seed,
            layout,
            timer: RevealTimer::start(0.0),
            mounted: false,
            visible_branches: HashSet::new(),
            visible_leaves: HashSet::new(),
            hover: HoverState::default(),
            zoom: 0.9,
            pan: egui::vec2(0.0, 0.0),
            show_legend: true,
        }
    }

    /// Starts the entrance over, as if the snapshot had just been mounted.
    ///
    /// Clears visibility and hover, and restarts the stage timer at `now`.
    fn remount(&mut self, now: Seconds) {
        self.visible_branches.clear();
        self.visible_leaves.clear();
        self.hover.clear();
        self.timer.restart(now);
        self.mounted = true;
    }

    /// Replaces the snapshot and remounts.
    fn replace_tree(&mut self, tree: MasteryTree, now: Seconds) {
        self.tree = tree;
        self.relayout();
        self.remount(now);
    }

    fn relayout(&mut self) {
        self.layout = layout_seeded(&self.tree, &self.cfg, self.seed);
    }

    /// Rereads the snapshot from disk. On failure the current one is kept.
    fn reload(&mut self, now: Seconds) {
        let Some(path) = self.source.clone() else {
            return;
        };
        match crate::load_tree(&path, self.permissive) {
            Ok(tree) => {
                tracing::info!(path = %path.display(), "reloaded mastery tree");
                self.replace_tree(tree, now);
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "reload failed, keeping current tree")
            }
        }
    }

    /// New jitter for the same snapshot; reveal state is kept.
    fn reseed(&mut self) {
        self.seed = self.seed.wrapping_add(1);
        self.relayout();
    }

    /// Polls the timer and refreshes the visible sets on a transition.
    fn advance(&mut self, now: Seconds) {
        if !self.mounted {
            self.remount(now);
        }
        if let Some(stage) = self.timer.poll(now) {
            self.apply_stage(stage);
        }
    }

    fn apply_stage(&mut self, stage: RevealStage) {
        self.visible_branches = reveal::visible_branches(&self.tree, stage).into_iter().collect();
        self.visible_leaves = reveal::visible_leaves(&self.tree, stage).into_iter().collect();
    }

    fn is_visible(&self, id: &str) -> bool {
        self.visible_branches.contains(id) || self.visible_leaves.contains(id)
    }

    /// Whether any entrance animation is still running at `elapsed`.
    fn animating(&self, elapsed: Seconds) -> bool {
        let last_leaf = self
            .layout
            .leaves
            .iter()
            .map(|l| reveal::leaf_delay(l.branch_index, l.concept_index) + reveal::LEAF_DURATION)
            .fold(0.0, f64::max);
        let last_branch = self
            .layout
            .branches
            .iter()
            .map(|b| reveal::branch_delay(b.index) + reveal::BRANCH_DURATION)
            .fold(reveal::TRUNK_DURATION, f64::max);
        elapsed < last_leaf.max(last_branch).max(reveal::LEAVES_AT)
    }

    /// Converts a canvas position to screen-space.
    ///
    /// The canvas center maps to the center of `rect`, scaled by `zoom`
    /// and shifted by `pan`. Both spaces are y-down.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let half = self.layout.canvas / 2.0;
        egui::pos2(
            center.x + (p.x - half.x) * self.zoom + self.pan.x,
            center.y + (p.y - half.y) * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`].
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let half = self.layout.canvas / 2.0;
        Vec2::new(
            (p.x - center.x - self.pan.x) / self.zoom + half.x,
            (p.y - center.y - self.pan.y) / self.zoom + half.y,
        )
    }

    fn to_screen_all(&self, pts: &[Vec2], rect: egui::Rect) -> Vec<egui::Pos2> {
        pts.iter().map(|&p| self.world_to_screen(p, rect)).collect()
    }

    /// Builds the top panel (replay, reseed, reload, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let now = ctx.input(|i| i.time);

                if ui.button("Replay").clicked() {
                    self.remount(now);
                }

                if ui.button("Reseed").clicked() {
                    self.reseed();
                }

                if ui
                    .add_enabled(self.source.is_some(), egui::Button::new("Reload"))
                    .clicked()
                {
                    self.reload(now);
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.2..=3.0).text("Zoom"));
                ui.checkbox(&mut self.show_legend, "Legend");
            });
        });
    }

    /// Builds the bottom status bar (stage, visible counts, seed).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("seed = {}", self.seed));
                ui.separator();
                ui.label(format!("leaves = {}", self.visible_leaves.len()));
                ui.label(format!("branches = {}", self.visible_branches.len()));
                ui.separator();
                ui.label(format!("stage = {:?}", self.timer.stage()));
                if let Some(id) = self.hover.active() {
                    ui.separator();
                    ui.label(format!("hover = {id}"));
                }
            });
        });
    }

    /// Builds the right-hand panel with layout options and the legend.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Layout");

                ui.separator();
                ui.label("Leaf placement");
                let mut changed = false;
                changed |= ui
                    .selectable_value(
                        &mut self.cfg.leaf_placement,
                        LeafPlacement::Parametric,
                        "Curve parameter",
                    )
                    .changed();
                changed |= ui
                    .selectable_value(
                        &mut self.cfg.leaf_placement,
                        LeafPlacement::ArcLength,
                        "Arc length",
                    )
                    .changed();

                ui.separator();
                changed |= ui
                    .add(egui::Slider::new(&mut self.cfg.leaf_jitter, 0.0..=20.0).text("Jitter"))
                    .changed();

                if ui.button("Reset layout to default").clicked() {
                    self.cfg = Config::default();
                    changed = true;
                }

                if changed {
                    self.relayout();
                }

                if self.show_legend {
                    ui.separator();
                    ui.heading("Subjects");
                    for entry in &self.layout.legend {
                        ui.horizontal(|ui| {
                            let (rect, _) =
                                ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                            ui.painter().circle_filled(rect.center(), 6.0, color(entry.color));
                            ui.label(entry.label);
                        });
                    }
                }
            });
    }

    /// Paints the tree; every shape fades or grows by its stagger progress.
    fn paint_tree(&self, painter: &egui::Painter, rect: egui::Rect, elapsed: Seconds) {
        let bark = color(BARK);

        // Ground.
        let g = &self.layout.ground;
        let grow = reveal::progress(elapsed, 0.0, reveal::GROUND_DURATION);
        let ellipse: Vec<egui::Pos2> = (0..48)
            .map(|i| {
                let a = i as f32 / 48.0 * std::f32::consts::TAU;
                let local = Vec2::new(a.cos() * g.radii.x, a.sin() * g.radii.y) * grow;
                self.world_to_screen(g.center + local, rect)
            })
            .collect();
        painter.add(egui::Shape::convex_polygon(ellipse, bark, egui::Stroke::NONE));

        // Trunk, as a strip since its outline is not convex.
        let fade = reveal::ease_out(reveal::progress(elapsed, 0.0, reveal::TRUNK_DURATION));
        let trunk_color = bark.gamma_multiply(fade);
        let mut mesh = egui::Mesh::default();
        for (l, r) in self.layout.trunk.strip(SEGMENTS) {
            mesh.colored_vertex(self.world_to_screen(l, rect), trunk_color);
            mesh.colored_vertex(self.world_to_screen(r, rect), trunk_color);
        }
        for i in 0..SEGMENTS as u32 {
            let (a, b, c, d) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(b, d, c);
        }
        painter.add(egui::Shape::mesh(mesh));

        // Branches draw from the origin outward.
        for b in &self.layout.branches {
            if !self.visible_branches.contains(&b.id) {
                continue;
            }
            let p = reveal::progress(elapsed, reveal::branch_delay(b.index), reveal::BRANCH_DURATION);
            if p <= 0.0 {
                continue;
            }
            let full = b.curve.flatten(SEGMENTS);
            let upto = ((SEGMENTS as f32 * p).ceil() as usize).clamp(1, SEGMENTS);
            let pts = self.to_screen_all(&full[..=upto], rect);

            let mut width = b.stroke_width * self.zoom;
            if self.hover.active() == Some(b.id.as_str()) {
                width *= 1.2;
            }
            let c = color(b.color);
            // Round caps.
            painter.circle_filled(pts[0], width / 2.0, c);
            painter.circle_filled(pts[pts.len() - 1], width / 2.0, c);
            painter.add(egui::Shape::line(pts, egui::Stroke::new(width, c)));
        }

        // Leaves grow from their base.
        for l in &self.layout.leaves {
            if !self.visible_leaves.contains(&l.id) {
                continue;
            }
            let delay = reveal::leaf_delay(l.branch_index, l.concept_index);
            let p = reveal::progress(elapsed, delay, reveal::LEAF_DURATION);
            if p <= 0.0 {
                continue;
            }
            let pts: Vec<egui::Pos2> = l
                .outline(SEGMENTS / 2)
                .into_iter()
                .map(|q| self.world_to_screen(l.center + (q - l.center) * p, rect))
                .collect();

            let base = color(l.color);
            let fill = base.gamma_multiply(LEAF_OPACITY * p);
            let stroke = egui::Stroke::new(LEAF_STROKE * self.zoom, base.gamma_multiply(p));
            painter.add(egui::Shape::convex_polygon(pts, fill, stroke));
        }
    }

    /// Draws the active tooltip above its shape.
    fn paint_tooltip(&self, painter: &egui::Painter, rect: egui::Rect) {
        let Some(id) = self.hover.active() else {
            return;
        };
        let (Some(tip), Some(anchor)) = (
            Tooltip::for_id(&self.tree, id),
            tooltip_anchor(&self.layout, id),
        ) else {
            return;
        };

        let min = self.world_to_screen(anchor, rect);
        let size = egui::vec2(TOOLTIP_SIZE.x, TOOLTIP_SIZE.y);
        let bg = egui::Rect::from_min_size(min, size);
        painter.rect_filled(bg, egui::CornerRadius::same(4), egui::Color32::from_gray(250));

        let font = egui::FontId::proportional(12.0);
        for (i, line) in tip.lines().into_iter().enumerate() {
            let pos = min + egui::vec2(8.0, 6.0 + i as f32 * 16.0);
            let text_color = if i == 0 {
                egui::Color32::BLACK
            } else {
                egui::Color32::DARK_GRAY
            };
            painter.text(pos, egui::Align2::LEFT_TOP, line, font.clone(), text_color);
        }
    }

    /// Builds the central panel: camera input, hover, painting.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.2, 3.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // Hover: enter on the topmost visible shape, leave otherwise.
            let hovered = response.hover_pos().and_then(|p| {
                let world = self.screen_to_world(p, rect);
                self.layout
                    .hit_test(world, SEGMENTS, |id| self.is_visible(id))
                    .map(str::to_owned)
            });
            if self.hover.track(hovered.as_deref()) {
                tracing::trace!(active = ?self.hover.active(), "hover changed");
            }

            let now = ctx.input(|i| i.time);
            let elapsed = self.timer.elapsed(now);
            self.paint_tree(&painter, rect, elapsed);
            self.paint_tooltip(&painter, rect);

            if self.animating(elapsed) {
                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that advances the reveal timer and builds all panels.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        self.advance(now);

        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        // No stage may fire against a torn-down viewer.
        self.timer.cancel();
        tracing::debug!(stage = ?self.timer.stage(), "viewer closed");
    }
}

fn color(c: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(c.r, c.g, c.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn sample_viewer() -> Viewer {
        Viewer::new(MasteryTree::sample(), Config::default(), 1, None, false)
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = sample_viewer();
        // Use non-trivial zoom and pan to exercise the math.
        viewer.zoom = 2.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let world_points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(510.0, 425.0),
            Vec2::new(-3.5, 820.25),
        ];

        let eps = 1e-3;

        for p in world_points {
            let screen = viewer.world_to_screen(p, rect);
            let back = viewer.screen_to_world(screen, rect);

            assert!(
                (back.x - p.x).abs() < eps && (back.y - p.y).abs() < eps,
                "roundtrip mismatch: p={:?}, back={:?}",
                p,
                back
            );
        }
    }

    #[test]
    fn canvas_center_maps_to_rect_center() {
        let viewer = sample_viewer();
        let rect = test_rect();
        let screen = viewer.world_to_screen(Vec2::new(510.0, 425.0), rect);
        assert_eq!(screen, rect.center());
    }

    #[test]
    fn stages_fill_visible_sets_on_schedule() {
        let mut viewer = sample_viewer();

        viewer.advance(2.0);
        assert!(viewer.visible_branches.is_empty());

        viewer.advance(2.5);
        assert_eq!(viewer.visible_branches.len(), 8);
        assert!(viewer.visible_leaves.is_empty());

        viewer.advance(3.5);
        assert_eq!(viewer.visible_leaves.len(), 16);
        assert!(viewer.is_visible("c16"));
    }

    #[test]
    fn remount_clears_visibility_and_hover() {
        let mut viewer = sample_viewer();
        viewer.advance(0.0);
        viewer.advance(5.0);
        viewer.hover.enter("b1");

        viewer.remount(10.0);

        assert_eq!(viewer.timer.stage(), RevealStage::Pending);
        assert!(viewer.visible_branches.is_empty());
        assert!(viewer.visible_leaves.is_empty());
        assert_eq!(viewer.hover.active(), None);

        viewer.advance(10.4);
        assert!(viewer.visible_branches.is_empty());
        viewer.advance(10.5);
        assert_eq!(viewer.visible_branches.len(), 8);
    }

    #[test]
    fn replace_tree_restarts_reveal_with_new_ids() {
        let mut viewer = sample_viewer();
        viewer.advance(0.0);
        viewer.advance(5.0);

        let mut tree = MasteryTree::sample();
        tree.branches.truncate(2);
        tree.branches[0].concepts[0].mastery = 0.2;
        viewer.replace_tree(tree, 6.0);

        assert!(viewer.visible_leaves.is_empty());
        viewer.advance(7.5);
        assert_eq!(viewer.visible_branches.len(), 2);
        assert_eq!(viewer.visible_leaves.len(), 3);
        assert!(!viewer.is_visible("c1"));
        assert_eq!(viewer.layout.leaves.len(), 3);
    }

    #[test]
    fn reseed_moves_leaves_but_keeps_reveal_state() {
        let mut viewer = sample_viewer();
        viewer.advance(0.0);
        viewer.advance(5.0);
        let before = viewer.layout.leaves.clone();

        viewer.reseed();

        assert_eq!(viewer.seed, 2);
        assert_ne!(viewer.layout.leaves, before);
        assert_eq!(viewer.timer.stage(), RevealStage::AllVisible);
        assert_eq!(viewer.visible_leaves.len(), 16);
    }

    #[test]
    fn animation_runs_until_last_leaf_finishes() {
        let viewer = sample_viewer();
        // Last leaf: branch 7, concept 1 -> 1.5 + 1.4 + 0.1 = 3.0, plus 0.5.
        assert!(viewer.animating(3.4));
        assert!(!viewer.animating(3.6));
    }
}
