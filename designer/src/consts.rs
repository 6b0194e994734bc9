//! Shared numeric and style constants for the designer crate.

// ── Snap guides ─────────────────────────────────────────────────

/// Extra length past the farthest edge for equal-distance guide ticks.
pub const GUIDE_OVERHANG_PX: f64 = 15.0;

/// Gap between the farthest edge and the equal-distance measure line.
pub const DIST_GUIDE_GAP_PX: f64 = 10.0;

/// Guide line thickness.
pub const GUIDE_THICKNESS_PX: f64 = 1.0;

// ── Ghosts ──────────────────────────────────────────────────────

/// Height reserved per ghost container inside its component.
pub const GHOST_CONTAINER_SPACE_PX: f64 = 62.0;

/// Top margin added when the component is tall enough for it.
pub const GHOST_EMPTY_SPACE_TOP_PX: f64 = 30.0;

/// Offset of ghost containers and ghosts from the content origin.
pub const GHOST_OFFSET_PX: f64 = 20.0;

/// Width of a part label ghost, drawn right of the form.
pub const PART_GHOST_WIDTH_PX: f64 = 90.0;

/// Height of a part label ghost.
pub const PART_GHOST_HEIGHT_PX: f64 = 20.0;

pub const GHOST_BACKGROUND_PART: &str = "#d0d0d0";
pub const GHOST_BACKGROUND_INVISIBLE: &str = "#d0d0d0";
pub const GHOST_BACKGROUND_CONFIG: &str = "#ffbb37";
pub const GHOST_BACKGROUND_DEFAULT: &str = "#e4844a";
pub const GHOST_BACKGROUND_SELECTED: &str = "#07f";
pub const GHOST_COLOR_SELECTED: &str = "#fff";
