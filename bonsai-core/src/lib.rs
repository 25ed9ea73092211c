//! Layout engine for the mastery "bonsai" tree.
//!
//! Main components:
//! - [`mastery`]: the snapshot of branches, concepts and their scores.
//! - [`palette`]: subject colors and the legend.
//! - [`config`]: canvas constants and layout options.
//! - [`bezier`]: cubic curve evaluation and small geometry helpers.
//! - [`layout`]: trunk, branch and leaf geometry for a snapshot.
//! - [`reveal`]: stage timer and stagger delays for the entrance.
//! - [`tooltip`]: host-side hover selection and tooltip text.
//! - [`svg`]: standalone SVG output.
//! - [`error`]: loading and validation errors.
//! - [`types`]: shared type aliases.

pub mod bezier;
pub mod config;
pub mod error;
pub mod layout;
pub mod mastery;
pub mod palette;
pub mod reveal;
pub mod svg;
pub mod tooltip;
pub mod types;
