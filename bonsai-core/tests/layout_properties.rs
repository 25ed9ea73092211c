use bonsai_core::{
    config::Config,
    error::TreeError,
    layout::{self, layout_seeded},
    mastery::{Branch, Concept, MasteryTree, Trunk},
    reveal::{RevealStage, RevealTimer, visible_branches, visible_leaves},
};
use rstest::{fixture, rstest};
use std::io::Write;

const EPS: f32 = 1e-3;

#[fixture]
fn sample() -> MasteryTree {
    MasteryTree::sample()
}

fn tree_with(branch: Branch) -> MasteryTree {
    MasteryTree {
        trunk: Trunk {
            health: 0.5,
            growth: 0.5,
        },
        branches: vec![branch],
    }
}

fn branch(subject: &str, growth: f64, health: f64, masteries: &[f64]) -> Branch {
    Branch {
        id: "b1".into(),
        name: "Branch".into(),
        subject: subject.into(),
        growth,
        health,
        angle: 0.0,
        concepts: masteries
            .iter()
            .enumerate()
            .map(|(i, &mastery)| Concept {
                id: format!("c{i}"),
                name: format!("Concept {i}"),
                mastery,
            })
            .collect(),
    }
}

#[rstest]
#[case(0.0, 102.0)]
#[case(0.5, 153.0)]
#[case(0.9, 193.8)]
#[case(1.0, 204.0)]
fn branch_length_range(#[case] growth: f64, #[case] expected: f32) {
    assert!((layout::branch_length(growth) - expected).abs() < EPS);
}

#[rstest]
#[case(0.0, 6.8)]
#[case(0.9, 11.39)]
#[case(1.0, 11.9)]
fn stroke_width_range(#[case] health: f64, #[case] expected: f32) {
    assert!((layout::stroke_width(health) - expected).abs() < EPS);
}

#[rstest]
#[case(0.31)]
#[case(0.5)]
#[case(0.95)]
#[case(1.0)]
fn leaf_size_within_bounds(#[case] mastery: f64) {
    let size = layout::leaf_size(mastery);
    assert!((20.4..=45.9 + EPS).contains(&size), "size {size}");
}

#[test]
fn scalars_are_monotonic() {
    let steps: Vec<f64> = (0..=20).map(|i| i as f64 / 20.0).collect();
    for w in steps.windows(2) {
        assert!(layout::branch_length(w[0]) < layout::branch_length(w[1]));
        assert!(layout::stroke_width(w[0]) < layout::stroke_width(w[1]));
        assert!(layout::leaf_size(w[0]) < layout::leaf_size(w[1]));
    }
}

#[rstest]
#[case("SAT Math", "#4ade80")]
#[case("SAT Reading", "#60a5fa")]
#[case("SAT Writing", "#c084fc")]
#[case("PSAT", "#f97316")]
#[case("Chemistry", "#6b7280")]
fn branch_color_by_subject(#[case] subject: &str, #[case] hex: &str) {
    let tree = tree_with(branch(subject, 0.5, 0.5, &[]));
    let out = layout_seeded(&tree, &Config::default(), 0);
    assert_eq!(out.branches[0].color.hex(), hex);
}

#[rstest]
fn every_sample_branch_is_in_range(sample: MasteryTree) {
    let out = layout_seeded(&sample, &Config::default(), 11);
    assert_eq!(out.branches.len(), sample.branches.len());
    for b in &out.branches {
        assert!((102.0..=204.0).contains(&b.length));
        assert!((6.8..=11.9 + EPS).contains(&b.stroke_width));
        assert!((b.start().distance(b.end()) - b.length).abs() < EPS);
    }
}

#[rstest]
fn low_mastery_is_never_visible(sample: MasteryTree) {
    let mut tree = sample;
    tree.branches[0].concepts[0].mastery = 0.3;
    tree.branches[4].concepts[1].mastery = 0.1;

    let out = layout_seeded(&tree, &Config::default(), 5);
    let leaf_ids: Vec<&str> = out.leaves.iter().map(|l| l.id.as_str()).collect();
    assert!(!leaf_ids.contains(&"c1"));
    assert!(!leaf_ids.contains(&"c10"));
    assert_eq!(leaf_ids.len(), 14);

    let visible = visible_leaves(&tree, RevealStage::AllVisible);
    assert!(!visible.iter().any(|id| id == "c1" || id == "c10"));
    assert_eq!(visible.len(), 14);
}

#[rstest]
fn stage_timeline_matches_visibility(sample: MasteryTree) {
    let mut timer = RevealTimer::start(0.0);
    let mut branches = visible_branches(&sample, timer.stage());
    let mut leaves = visible_leaves(&sample, timer.stage());

    let mut at = 0.0;
    while at <= 2.0 {
        if let Some(stage) = timer.poll(at) {
            branches = visible_branches(&sample, stage);
            leaves = visible_leaves(&sample, stage);
        }
        if at < 0.5 {
            assert!(branches.is_empty(), "t={at}");
        } else {
            assert_eq!(branches, sample.branch_ids(), "t={at}");
        }
        if at < 1.5 {
            assert!(leaves.is_empty(), "t={at}");
        } else {
            assert_eq!(leaves, sample.eligible_concept_ids(), "t={at}");
        }
        at += 0.25;
    }
}

#[rstest]
fn seeded_layout_is_reproducible(sample: MasteryTree) {
    let cfg = Config::default();
    assert_eq!(layout_seeded(&sample, &cfg, 7), layout_seeded(&sample, &cfg, 7));
}

#[test]
fn load_reads_json_file_and_validates() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = serde_json::to_string(&MasteryTree::sample()).unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let tree = MasteryTree::load(file.path()).unwrap();
    assert_eq!(tree, MasteryTree::sample());
    assert!(tree.validate().is_ok());
}

#[test]
fn load_reports_missing_file() {
    let err = MasteryTree::load(std::path::Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(matches!(err, TreeError::Io { .. }));
    assert!(err.to_string().contains("/definitely/not/here.json"));
}
