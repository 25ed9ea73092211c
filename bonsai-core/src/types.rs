/// Identifier shared by branches and concepts in a [`crate::mastery::MasteryTree`].
///
/// Branch and concept ids live in one namespace, so a single value is
/// enough for hosts to key hover and visibility state.
pub type ShapeId = String;

/// Seconds since the host mounted the current snapshot.
pub type Seconds = f64;
