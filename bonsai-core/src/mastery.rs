//! Mastery snapshot: subjects, branches and concepts with their scores.

use crate::error::TreeError;
use crate::types::ShapeId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Concepts at or below this mastery never get a leaf.
pub const MASTERY_THRESHOLD: f64 = 0.3;

/// Whole-tree scores; carried through but not drawn.
///
/// Scores are `f64` throughout; tooltip percentages round from them as-is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trunk {
    pub health: f64,
    pub growth: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: ShapeId,
    pub name: String,
    pub mastery: f64,
}

impl Concept {
    #[inline]
    pub fn is_eligible(&self) -> bool {
        self.mastery > MASTERY_THRESHOLD
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: ShapeId,
    pub name: String,
    pub subject: String,
    pub growth: f64,
    pub health: f64,
    /// Degrees from vertical; positive leans toward +x.
    pub angle: f32,
    pub concepts: Vec<Concept>,
}

/// Immutable snapshot the layout is derived from.
///
/// Branch order is display order and drives the stagger delays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasteryTree {
    pub trunk: Trunk,
    pub branches: Vec<Branch>,
}

/// Result of [`MasteryTree::node`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Node<'a> {
    Branch(&'a Branch),
    Concept {
        concept: &'a Concept,
        branch: &'a Branch,
    },
}

impl MasteryTree {
    pub fn from_json_str(json: &str) -> Result<Self, TreeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, TreeError> {
        let json = std::fs::read_to_string(path).map_err(|source| TreeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tree = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            branches = tree.branches.len(),
            "loaded mastery tree"
        );
        Ok(tree)
    }

    /// Checks id uniqueness and that every score lies in `[0, 1]`.
    ///
    /// Layout does not call this; out-of-range input there just produces
    /// degenerate geometry.
    pub fn validate(&self) -> Result<(), TreeError> {
        check_unit("trunk", "health", self.trunk.health)?;
        check_unit("trunk", "growth", self.trunk.growth)?;

        let mut seen: HashSet<&str> = HashSet::new();
        for b in &self.branches {
            if !seen.insert(&b.id) {
                return Err(TreeError::DuplicateId(b.id.clone()));
            }
            check_unit(&b.id, "growth", b.growth)?;
            check_unit(&b.id, "health", b.health)?;
            for c in &b.concepts {
                if !seen.insert(&c.id) {
                    return Err(TreeError::DuplicateId(c.id.clone()));
                }
                check_unit(&c.id, "mastery", c.mastery)?;
            }
        }
        Ok(())
    }

    /// Looks up a branch or concept by id.
    pub fn node(&self, id: &str) -> Option<Node<'_>> {
        for branch in &self.branches {
            if branch.id == id {
                return Some(Node::Branch(branch));
            }
            if let Some(concept) = branch.concepts.iter().find(|c| c.id == id) {
                return Some(Node::Concept { concept, branch });
            }
        }
        None
    }

    pub fn branch_ids(&self) -> Vec<ShapeId> {
        self.branches.iter().map(|b| b.id.clone()).collect()
    }

    /// Ids of concepts with `mastery > 0.3`, in tree order.
    pub fn eligible_concept_ids(&self) -> Vec<ShapeId> {
        self.branches
            .iter()
            .flat_map(|b| b.concepts.iter())
            .filter(|c| c.is_eligible())
            .map(|c| c.id.clone())
            .collect()
    }

    /// The eight-branch reference dataset.
    pub fn sample() -> Self {
        fn concept(id: &str, name: &str, mastery: f64) -> Concept {
            Concept {
                id: id.into(),
                name: name.into(),
                mastery,
            }
        }

        fn branch(
            id: &str,
            name: &str,
            subject: &str,
            (growth, health, angle): (f64, f64, f32),
            concepts: Vec<Concept>,
        ) -> Branch {
            Branch {
                id: id.into(),
                name: name.into(),
                subject: subject.into(),
                growth,
                health,
                angle,
                concepts,
            }
        }

        Self {
            trunk: Trunk {
                health: 0.85,
                growth: 0.8,
            },
            branches: vec![
                branch(
                    "b1",
                    "Algebra",
                    "SAT Math",
                    (0.9, 0.9, -60.0),
                    vec![
                        concept("c1", "Linear Equations", 0.95),
                        concept("c2", "Quadratic Equations", 0.85),
                    ],
                ),
                branch(
                    "b2",
                    "Geometry",
                    "SAT Math",
                    (0.8, 0.85, -30.0),
                    vec![
                        concept("c3", "Triangles", 0.8),
                        concept("c4", "Circles", 0.7),
                    ],
                ),
                branch(
                    "b3",
                    "Statistics",
                    "SAT Math",
                    (0.7, 0.75, 0.0),
                    vec![
                        concept("c5", "Data Analysis", 0.75),
                        concept("c6", "Probability", 0.65),
                    ],
                ),
                branch(
                    "b4",
                    "Reading Comprehension",
                    "SAT Reading",
                    (0.85, 0.8, 30.0),
                    vec![
                        concept("c7", "Main Ideas", 0.8),
                        concept("c8", "Supporting Details", 0.75),
                    ],
                ),
                branch(
                    "b5",
                    "Vocabulary",
                    "SAT Reading",
                    (0.7, 0.75, 60.0),
                    vec![
                        concept("c9", "Context Clues", 0.7),
                        concept("c10", "Word Meanings", 0.65),
                    ],
                ),
                branch(
                    "b6",
                    "Grammar",
                    "SAT Writing",
                    (0.75, 0.7, 90.0),
                    vec![
                        concept("c11", "Punctuation", 0.7),
                        concept("c12", "Sentence Structure", 0.65),
                    ],
                ),
                branch(
                    "b7",
                    "Essay Structure",
                    "SAT Writing",
                    (0.65, 0.6, 120.0),
                    vec![
                        concept("c13", "Thesis Development", 0.6),
                        concept("c14", "Evidence Use", 0.55),
                    ],
                ),
                branch(
                    "b8",
                    "PSAT Prep",
                    "PSAT",
                    (0.6, 0.55, 150.0),
                    vec![
                        concept("c15", "Test Strategy", 0.55),
                        concept("c16", "Time Management", 0.5),
                    ],
                ),
            ],
        }
    }
}

fn check_unit(id: &str, field: &'static str, value: f64) -> Result<(), TreeError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TreeError::OutOfRange {
            id: id.to_string(),
            field,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_valid_and_has_eight_branches() {
        let tree = MasteryTree::sample();
        assert_eq!(tree.branches.len(), 8);
        assert!(tree.validate().is_ok());
        assert_eq!(tree.eligible_concept_ids().len(), 16);
    }

    #[test]
    fn eligibility_threshold_is_strict() {
        let mut c = Concept {
            id: "c".into(),
            name: "Boundary".into(),
            mastery: 0.3,
        };
        assert!(!c.is_eligible());
        c.mastery = 0.31;
        assert!(c.is_eligible());
    }

    #[test]
    fn validate_rejects_duplicate_id_across_branches_and_concepts() {
        let mut tree = MasteryTree::sample();
        // A concept reusing a branch id collides in the shared namespace.
        tree.branches[1].concepts[0].id = "b1".into();

        match tree.validate() {
            Err(TreeError::DuplicateId(id)) => assert_eq!(id, "b1"),
            other => panic!("expected duplicate id, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_out_of_range_and_nan() {
        let mut tree = MasteryTree::sample();
        tree.branches[2].growth = 1.2;
        assert!(matches!(
            tree.validate(),
            Err(TreeError::OutOfRange { field: "growth", .. })
        ));

        let mut tree = MasteryTree::sample();
        tree.branches[0].concepts[1].mastery = f64::NAN;
        assert!(matches!(
            tree.validate(),
            Err(TreeError::OutOfRange { field: "mastery", .. })
        ));
    }

    #[test]
    fn node_finds_branches_and_concepts_with_parent() {
        let tree = MasteryTree::sample();

        assert!(matches!(tree.node("b3"), Some(Node::Branch(b)) if b.name == "Statistics"));
        match tree.node("c8") {
            Some(Node::Concept { concept, branch }) => {
                assert_eq!(concept.name, "Supporting Details");
                assert_eq!(branch.id, "b4");
            }
            other => panic!("expected concept, got {other:?}"),
        }
        assert!(tree.node("nope").is_none());
    }

    #[test]
    fn json_roundtrip_uses_source_field_names() {
        let json = r#"{
            "trunk": { "health": 0.5, "growth": 0.5 },
            "branches": [{
                "id": "b1", "name": "Algebra", "subject": "SAT Math",
                "growth": 0.9, "health": 0.9, "angle": 0,
                "concepts": [{ "id": "c1", "name": "Linear", "mastery": 0.95 }]
            }]
        }"#;
        let tree = MasteryTree::from_json_str(json).unwrap();
        assert_eq!(tree.branches[0].concepts[0].id, "c1");
        assert_eq!(tree.branches[0].angle, 0.0);

        assert!(matches!(
            MasteryTree::from_json_str("{ \"trunk\": 1 }"),
            Err(TreeError::Parse(_))
        ));
    }
}
