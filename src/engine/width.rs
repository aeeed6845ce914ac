use unicode_width::UnicodeWidthChar;

/// Glyph measured against the available cells. Its display width, not an
/// assumed 1, drives the estimate.
const PROBE_GLYPH: char = 'W';

/// Bounds applied to an estimated column count.
#[derive(Clone, Copy, Debug)]
pub struct WidthPolicy {
    /// Columns held back from the fit as a safety buffer.
    pub margin: usize,
    /// Floor below which reflow output becomes unreadable.
    pub min_columns: usize,
    /// Ceiling so very wide terminals still produce typeable lines.
    pub max_columns: usize,
}

impl Default for WidthPolicy {
    fn default() -> Self {
        Self {
            margin: 2,
            min_columns: 20,
            max_columns: 80,
        }
    }
}

/// How many copies of the probe glyph fit into `available_cells`.
pub fn fit_columns(available_cells: usize) -> usize {
    let glyph_cells = UnicodeWidthChar::width(PROBE_GLYPH).unwrap_or(1).max(1);
    available_cells / glyph_cells
}

/// Reflow width for a typing area `available_cells` wide.
///
/// Derived from the probe fit minus the safety margin, then clamped into
/// the policy's bounds. Called on every resize and whenever the block
/// layout changes; the result is never persisted, so the stored flat index
/// stays meaningful across terminal geometries.
pub fn estimate_columns(available_cells: usize, policy: WidthPolicy) -> usize {
    let floor = policy.min_columns.max(1);
    let ceiling = policy.max_columns.max(floor);
    fit_columns(available_cells)
        .saturating_sub(policy.margin)
        .clamp(floor, ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_counts_single_cell_probe() {
        assert_eq!(fit_columns(0), 0);
        assert_eq!(fit_columns(72), 72);
    }

    #[test]
    fn test_margin_subtracted() {
        let policy = WidthPolicy {
            margin: 2,
            min_columns: 10,
            max_columns: 200,
        };
        assert_eq!(estimate_columns(72, policy), 70);
    }

    #[test]
    fn test_floor_applied_to_tiny_areas() {
        let policy = WidthPolicy::default();
        assert_eq!(estimate_columns(0, policy), policy.min_columns);
        assert_eq!(estimate_columns(5, policy), policy.min_columns);
    }

    #[test]
    fn test_ceiling_applied_to_wide_areas() {
        let policy = WidthPolicy::default();
        assert_eq!(estimate_columns(500, policy), policy.max_columns);
    }

    #[test]
    fn test_degenerate_policy_still_positive() {
        let policy = WidthPolicy {
            margin: 50,
            min_columns: 0,
            max_columns: 0,
        };
        assert_eq!(estimate_columns(40, policy), 1);
    }
}
