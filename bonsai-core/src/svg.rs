//! Standalone SVG rendering of a [`Layout`].
//!
//! Shapes are emitted in draw order (ground, trunk, branches, leaves,
//! legend) and carry a `data-id` so a browser host can key hover state.
//! Each branch and leaf also gets a `<title>` with its tooltip text.

use crate::{
    bezier::fmt,
    layout::{GroundEllipse, LEAF_OPACITY, LEAF_STROKE, Layout},
    mastery::MasteryTree,
    palette::BARK,
    reveal::{self, RevealStage},
    tooltip::Tooltip,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SvgOptions {
    /// Emit SMIL entrance animations using the stagger delays.
    pub animate: bool,
    pub legend: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            animate: false,
            legend: true,
        }
    }
}

pub fn render_svg(
    tree: &MasteryTree,
    layout: &Layout,
    stage: RevealStage,
    opts: SvgOptions,
) -> String {
    let mut out = String::with_capacity(8 * 1024);
    let (w, h) = (fmt(layout.canvas.x), fmt(layout.canvas.y));

    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n"
    ));

    push_ground(&mut out, &layout.ground, opts.animate);

    let mut attrs = format!("d=\"{}\" fill=\"{}\"", layout.trunk.to_svg(), BARK);
    let children = fade_in(opts.animate, &mut attrs, 0.0, reveal::TRUNK_DURATION, 1.0);
    element(&mut out, "path", &attrs, &children);

    if stage.branches_visible() {
        for b in &layout.branches {
            let mut attrs = format!(
                "data-id=\"{}\" d=\"{}\" stroke=\"{}\" stroke-width=\"{}\" fill=\"none\" stroke-linecap=\"round\"",
                escape(&b.id),
                b.curve.to_svg(),
                b.color,
                fmt(b.stroke_width),
            );
            let mut children = Vec::new();
            if opts.animate {
                attrs.push_str(" pathLength=\"1\" stroke-dasharray=\"1\" stroke-dashoffset=\"1\"");
                children.push(format!(
                    "<animate attributeName=\"stroke-dashoffset\" from=\"1\" to=\"0\" begin=\"{}s\" dur=\"{}s\" fill=\"freeze\"/>",
                    secs(reveal::branch_delay(b.index)),
                    secs(reveal::BRANCH_DURATION),
                ));
            }
            children.extend(title(tree, &b.id));
            element(&mut out, "path", &attrs, &children);
        }
    }

    if stage.leaves_visible() {
        for l in &layout.leaves {
            let mut attrs = format!(
                "data-id=\"{}\" d=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
                escape(&l.id),
                l.to_svg(),
                l.color,
                l.color,
                fmt(LEAF_STROKE),
            );
            let delay = reveal::leaf_delay(l.branch_index, l.concept_index);
            let mut children =
                fade_in(opts.animate, &mut attrs, delay, reveal::LEAF_DURATION, LEAF_OPACITY);
            children.extend(title(tree, &l.id));
            element(&mut out, "path", &attrs, &children);
        }
    }

    if opts.legend {
        push_legend(&mut out, layout);
    }

    out.push_str("</svg>\n");
    out
}

/// Ground ellipse. When animating it grows from nothing about its center:
/// the ellipse sits at the origin of a translated group so the SMIL scale
/// has a fixed point there.
fn push_ground(out: &mut String, g: &GroundEllipse, animate: bool) {
    let shape = format!(
        "rx=\"{}\" ry=\"{}\" fill=\"{}\"",
        fmt(g.radii.x),
        fmt(g.radii.y),
        BARK
    );
    if !animate {
        let attrs = format!("cx=\"{}\" cy=\"{}\" {shape}", fmt(g.center.x), fmt(g.center.y));
        element(out, "ellipse", &attrs, &[]);
        return;
    }

    out.push_str(&format!(
        "  <g transform=\"translate({} {})\">\n",
        fmt(g.center.x),
        fmt(g.center.y)
    ));
    out.push_str(&format!(
        "    <ellipse cx=\"0\" cy=\"0\" {shape} transform=\"scale(0)\">\n"
    ));
    out.push_str(&format!(
        "      <animateTransform attributeName=\"transform\" type=\"scale\" from=\"0\" to=\"1\" begin=\"0s\" dur=\"{}s\" fill=\"freeze\"/>\n",
        secs(reveal::GROUND_DURATION)
    ));
    out.push_str("    </ellipse>\n  </g>\n");
}

/// Writes one indented element, self-closing when it has no children.
fn element(out: &mut String, tag: &str, attrs: &str, children: &[String]) {
    if children.is_empty() {
        out.push_str(&format!("  <{tag} {attrs}/>\n"));
        return;
    }
    out.push_str(&format!("  <{tag} {attrs}>\n"));
    for child in children {
        out.push_str(&format!("    {child}\n"));
    }
    out.push_str(&format!("  </{tag}>\n"));
}

/// Sets the opacity attribute; when animating, starts at 0 and returns
/// the `<animate>` child that fades up to `to`.
fn fade_in(animate: bool, attrs: &mut String, delay: f64, duration: f64, to: f32) -> Vec<String> {
    if !animate {
        attrs.push_str(&format!(" opacity=\"{}\"", fmt(to)));
        return Vec::new();
    }
    attrs.push_str(" opacity=\"0\"");
    vec![format!(
        "<animate attributeName=\"opacity\" from=\"0\" to=\"{}\" begin=\"{}s\" dur=\"{}s\" fill=\"freeze\"/>",
        fmt(to),
        secs(delay),
        secs(duration),
    )]
}

fn title(tree: &MasteryTree, id: &str) -> Option<String> {
    Tooltip::for_id(tree, id).map(|tip| format!("<title>{}</title>", escape(&tip.lines().join("\n"))))
}

fn push_legend(out: &mut String, layout: &Layout) {
    const ROW: f32 = 18.0;
    const MARGIN: f32 = 12.0;
    let rows = layout.legend.len() as f32;
    let x = layout.canvas.x - 150.0 - MARGIN;
    let y = layout.canvas.y - rows * ROW - MARGIN;

    out.push_str(&format!(
        "  <g class=\"legend\" transform=\"translate({} {})\" font-family=\"sans-serif\" font-size=\"12\">\n",
        fmt(x),
        fmt(y)
    ));
    for (i, entry) in layout.legend.iter().enumerate() {
        let cy = i as f32 * ROW + ROW / 2.0;
        out.push_str(&format!(
            "    <circle cx=\"6\" cy=\"{}\" r=\"6\" fill=\"{}\"/>\n    <text x=\"18\" y=\"{}\" dominant-baseline=\"middle\">{}</text>\n",
            fmt(cy),
            entry.color,
            fmt(cy),
            escape(entry.label),
        ));
    }
    out.push_str("  </g>\n");
}

fn secs(s: f64) -> String {
    fmt(s as f32)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
