//! Subject colors and the legend built from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque sRGB color, serialized as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Formats the color as `#rrggbb`.
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parses a `#rrggbb` string. The leading `#` is optional.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.hex()
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rgb::parse_hex(&s).ok_or_else(|| format!("invalid color {s:?}, expected #rrggbb"))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// Fallback for subjects missing from the table.
pub const DEFAULT_GRAY: Rgb = Rgb::new(0x6b, 0x72, 0x80);

/// Trunk and ground fill.
pub const BARK: Rgb = Rgb::new(0x8b, 0x45, 0x13);

/// Subjects with a dedicated branch color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subject {
    SatMath,
    SatReading,
    SatWriting,
    Psat,
}

impl Subject {
    /// Table order, which is also legend order.
    pub const ALL: [Subject; 4] = [
        Subject::SatMath,
        Subject::SatReading,
        Subject::SatWriting,
        Subject::Psat,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Subject::SatMath => "SAT Math",
            Subject::SatReading => "SAT Reading",
            Subject::SatWriting => "SAT Writing",
            Subject::Psat => "PSAT",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Subject::SatMath => Rgb::new(0x4a, 0xde, 0x80),
            Subject::SatReading => Rgb::new(0x60, 0xa5, 0xfa),
            Subject::SatWriting => Rgb::new(0xc0, 0x84, 0xfc),
            Subject::Psat => Rgb::new(0xf9, 0x73, 0x16),
        }
    }

    /// Exact, case-sensitive label match.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

/// Color for a branch's `subject` label, or [`DEFAULT_GRAY`] if unmapped.
pub fn color_for_subject(label: &str) -> Rgb {
    Subject::from_label(label).map_or(DEFAULT_GRAY, Subject::color)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: Rgb,
}

/// One entry per subject in the color table.
pub fn legend() -> Vec<LegendEntry> {
    Subject::ALL
        .into_iter()
        .map(|s| LegendEntry {
            label: s.label(),
            color: s.color(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_subjects_map_to_their_colors() {
        assert_eq!(color_for_subject("SAT Math").hex(), "#4ade80");
        assert_eq!(color_for_subject("SAT Reading").hex(), "#60a5fa");
        assert_eq!(color_for_subject("SAT Writing").hex(), "#c084fc");
        assert_eq!(color_for_subject("PSAT").hex(), "#f97316");
    }

    #[test]
    fn unknown_subject_falls_back_to_gray() {
        assert_eq!(color_for_subject("Chemistry"), DEFAULT_GRAY);
        assert_eq!(color_for_subject("sat math"), DEFAULT_GRAY);
        assert_eq!(DEFAULT_GRAY.hex(), "#6b7280");
    }

    #[test]
    fn parse_hex_accepts_with_and_without_hash() {
        assert_eq!(Rgb::parse_hex("#8b4513"), Some(BARK));
        assert_eq!(Rgb::parse_hex("8B4513"), Some(BARK));
        assert_eq!(Rgb::parse_hex("#8b45"), None);
        assert_eq!(Rgb::parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn serializes_as_hex_string() {
        let json = serde_json::to_string(&Subject::Psat.color()).unwrap();
        assert_eq!(json, "\"#f97316\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Subject::Psat.color());
        assert!(serde_json::from_str::<Rgb>("\"orange\"").is_err());
    }

    #[test]
    fn legend_follows_table_order() {
        let labels: Vec<&str> = legend().iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["SAT Math", "SAT Reading", "SAT Writing", "PSAT"]);
    }
}
