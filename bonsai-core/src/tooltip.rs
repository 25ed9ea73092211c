//! Hover selection and tooltip content.
//!
//! [`HoverState`] belongs to the host; layout never reads it.

use glam::Vec2;
use serde::Serialize;

use crate::{
    layout::Layout,
    mastery::{MasteryTree, Node},
    types::ShapeId,
};

pub const TOOLTIP_SIZE: Vec2 = Vec2::new(160.0, 60.0);

/// Top-left of the tooltip box relative to the shape anchor.
pub const TOOLTIP_OFFSET: Vec2 = Vec2::new(-80.0, -60.0);

/// At most one hovered shape at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HoverState {
    active: Option<ShapeId>,
}

impl HoverState {
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Pointer entered `id`; replaces any previous selection.
    pub fn enter(&mut self, id: &str) {
        if self.active.as_deref() != Some(id) {
            self.active = Some(id.to_string());
        }
    }

    /// Pointer left `id`. A stale leave for another shape is ignored.
    pub fn leave(&mut self, id: &str) {
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Applies a hit-test result: enter the new id, leave the old one.
    ///
    /// Returns `true` if the selection changed.
    pub fn track(&mut self, hovered: Option<&str>) -> bool {
        let before = self.active.clone();
        match hovered {
            Some(id) => self.enter(id),
            None => {
                if let Some(prev) = before.as_deref() {
                    self.leave(prev);
                }
            }
        }
        before != self.active
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub title: String,
    pub subject: String,
    pub mastery: String,
}

impl Tooltip {
    /// Content for a branch or concept id.
    ///
    /// Branches report their subject and health; concepts report the
    /// parent branch name and their own mastery.
    pub fn for_id(tree: &MasteryTree, id: &str) -> Option<Self> {
        let tip = match tree.node(id)? {
            Node::Branch(b) => Tooltip {
                title: b.name.clone(),
                subject: format!("Subject: {}", b.subject),
                mastery: format!("Mastery: {}", percent(b.health)),
            },
            Node::Concept { concept, branch } => Tooltip {
                title: concept.name.clone(),
                subject: format!("Subject: {}", branch.name),
                mastery: format!("Mastery: {}", percent(concept.mastery)),
            },
        };
        Some(tip)
    }

    pub fn lines(&self) -> [&str; 3] {
        [&self.title, &self.subject, &self.mastery]
    }
}

/// Rounds half away from zero in `f64`, like the dashboard's percentage
/// labels. `0.145` is `14.499..` there and so reads `14%`.
pub fn percent(score: f64) -> String {
    format!("{}%", (score * 100.0).round() as i64)
}

/// Top-left corner of the tooltip box for `id`.
///
/// Branch tooltips hang above the branch tip, leaf tooltips above the
/// jittered leaf base.
pub fn tooltip_anchor(layout: &Layout, id: &str) -> Option<Vec2> {
    let anchor = layout
        .leaf(id)
        .map(|l| l.center)
        .or_else(|| layout.branch(id).map(|b| b.end()))?;
    Some(anchor + TOOLTIP_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, layout::layout_seeded};

    #[test]
    fn enter_replaces_and_stale_leave_is_ignored() {
        let mut hover = HoverState::default();
        hover.enter("b1");
        hover.enter("c2");
        assert_eq!(hover.active(), Some("c2"));

        hover.leave("b1");
        assert_eq!(hover.active(), Some("c2"));

        hover.leave("c2");
        assert_eq!(hover.active(), None);
    }

    #[test]
    fn track_reports_changes_only() {
        let mut hover = HoverState::default();
        assert!(hover.track(Some("b3")));
        assert!(!hover.track(Some("b3")));
        assert!(hover.track(Some("c5")));
        assert!(hover.track(None));
        assert!(!hover.track(None));
        assert_eq!(hover.active(), None);
    }

    #[test]
    fn branch_tooltip_shows_subject_and_health() {
        let tree = MasteryTree::sample();
        let tip = Tooltip::for_id(&tree, "b1").unwrap();
        assert_eq!(tip.lines(), ["Algebra", "Subject: SAT Math", "Mastery: 90%"]);
    }

    #[test]
    fn concept_tooltip_shows_parent_branch_and_mastery() {
        let tree = MasteryTree::sample();
        let tip = Tooltip::for_id(&tree, "c14").unwrap();
        assert_eq!(
            tip.lines(),
            ["Evidence Use", "Subject: Essay Structure", "Mastery: 55%"]
        );
        assert!(Tooltip::for_id(&tree, "missing").is_none());
    }

    #[test]
    fn percent_rounds() {
        assert_eq!(percent(0.856), "86%");
        assert_eq!(percent(0.554), "55%");
        assert_eq!(percent(0.0), "0%");
        assert_eq!(percent(1.0), "100%");
    }

    #[test]
    fn percent_keeps_double_precision_ties() {
        assert_eq!(percent(0.145), "14%");
        assert_eq!(percent(0.285), "28%");
        assert_eq!(percent(0.565), "56%");
    }

    #[test]
    fn tooltip_text_rounds_loaded_scores() {
        let json = r#"{
            "trunk": { "health": 0.5, "growth": 0.5 },
            "branches": [{
                "id": "b1", "name": "Algebra", "subject": "SAT Math",
                "growth": 0.5, "health": 0.145, "angle": 0,
                "concepts": [{ "id": "c1", "name": "Linear", "mastery": 0.565 }]
            }]
        }"#;
        let tree = MasteryTree::from_json_str(json).unwrap();

        let branch = Tooltip::for_id(&tree, "b1").unwrap();
        assert_eq!(branch.mastery, "Mastery: 14%");
        let concept = Tooltip::for_id(&tree, "c1").unwrap();
        assert_eq!(concept.mastery, "Mastery: 56%");
    }

    #[test]
    fn anchors_sit_above_shapes() {
        let tree = MasteryTree::sample();
        let layout = layout_seeded(&tree, &Config::default(), 9);

        let b = layout.branch("b3").unwrap();
        assert_eq!(tooltip_anchor(&layout, "b3"), Some(b.end() + TOOLTIP_OFFSET));

        let l = layout.leaf("c1").unwrap();
        assert_eq!(tooltip_anchor(&layout, "c1"), Some(l.center + TOOLTIP_OFFSET));

        assert_eq!(tooltip_anchor(&layout, "nope"), None);
    }
}
