//! Per-tile statistics and the aggregate progress summary.

use std::collections::HashMap;
use std::fmt;

use crate::types::{Template, TileCoord};

/// Pixel counts for one tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileStats {
    pub painted: u64,
    pub required: u64,
    pub wrong: u64,
}

/// Latest statistics for every tile seen so far.
///
/// Recording a tile replaces its previous entry, so re-fetching a tile never
/// double counts.
#[derive(Debug, Clone, Default)]
pub struct ProgressTable {
    tiles: HashMap<TileCoord, TileStats>,
}

impl ProgressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the stats for a tile, overwriting any earlier entry.
    pub fn record(&mut self, tile: TileCoord, stats: TileStats) {
        self.tiles.insert(tile, stats);
    }

    pub fn get(&self, tile: &TileCoord) -> Option<&TileStats> {
        self.tiles.get(tile)
    }

    /// Number of tracked tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Forget every tile.
    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    /// Sum of all tracked tiles.
    pub fn totals(&self) -> TileStats {
        self.tiles.values().fold(TileStats::default(), |acc, s| TileStats {
            painted: acc.painted + s.painted,
            required: acc.required + s.required,
            wrong: acc.wrong + s.wrong,
        })
    }

    /// Aggregate progress against the active templates.
    ///
    /// `required` comes from the templates' precomputed counts, minus their
    /// hidden colours, when any template declares one; otherwise from the
    /// tiles seen so far.
    pub fn summarize(&self, active: &[&Template], shown: usize, loaded: usize) -> ProgressSummary {
        let totals = self.totals();
        let declared: u64 = active.iter().map(|t| t.visible_required_count()).sum();
        let required = if declared > 0 { declared } else { totals.required };

        ProgressSummary {
            shown,
            loaded,
            painted: totals.painted,
            required,
            missing: required.saturating_sub(totals.painted),
            wrong: totals.wrong,
            extra: totals.painted.saturating_sub(required),
        }
    }
}

/// Aggregate counts reported after each tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    /// Templates drawn on the latest tile.
    pub shown: usize,
    /// Templates in the registry.
    pub loaded: usize,
    pub painted: u64,
    pub required: u64,
    pub missing: u64,
    pub wrong: u64,
    pub extra: u64,
}

impl fmt::Display for ProgressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Showing {} {} (of {} loaded).",
            self.shown,
            if self.shown == 1 { "template" } else { "templates" },
            self.loaded
        )?;
        write!(
            f,
            "\nPainted {} / {} • Missing {} • Wrong {}",
            group_thousands(self.painted),
            group_thousands(self.required),
            group_thousands(self.missing),
            group_thousands(self.wrong)
        )?;
        if self.extra > 0 {
            write!(f, " • Extra {}", group_thousands(self.extra))?;
        }
        Ok(())
    }
}

/// Format a count with comma thousands separators: `1234567` → "1,234,567".
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StorageKey;
    use crate::types::{Anchor, ColourPalette, Rgb};
    use std::collections::BTreeMap;

    fn template(required: u64) -> Template {
        Template {
            storage_key: StorageKey::new(0, "!"),
            display_name: "t".to_string(),
            anchor: Anchor::default(),
            chunks: Default::default(),
            palette: ColourPalette::new(),
            required_pixel_count: required,
            enabled: true,
            selected: false,
        }
    }

    #[test]
    fn test_record_overwrites() {
        let mut table = ProgressTable::new();
        let tile = TileCoord::new(1, 2);
        table.record(tile, TileStats { painted: 5, required: 9, wrong: 1 });
        table.record(tile, TileStats { painted: 6, required: 9, wrong: 0 });

        assert_eq!(table.len(), 1);
        assert_eq!(table.totals(), TileStats { painted: 6, required: 9, wrong: 0 });
    }

    #[test]
    fn test_totals_across_tiles() {
        let mut table = ProgressTable::new();
        table.record(TileCoord::new(0, 0), TileStats { painted: 1, required: 2, wrong: 3 });
        table.record(TileCoord::new(0, 1), TileStats { painted: 4, required: 5, wrong: 6 });
        assert_eq!(table.totals(), TileStats { painted: 5, required: 7, wrong: 9 });
    }

    #[test]
    fn test_summary_prefers_declared_required() {
        let mut table = ProgressTable::new();
        table.record(TileCoord::new(0, 0), TileStats { painted: 2, required: 2, wrong: 1 });
        let t = template(3);

        let summary = table.summarize(&[&t], 1, 1);
        assert_eq!(summary.required, 3);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.extra, 0);
        assert_eq!(summary.wrong, 1);
    }

    #[test]
    fn test_summary_leaves_out_hidden_colours() {
        let mut table = ProgressTable::new();
        table.record(TileCoord::new(0, 0), TileStats { painted: 2, required: 2, wrong: 0 });
        let mut t = template(3);
        t.palette = ColourPalette::from_counts(BTreeMap::from([
            (Rgb::new(255, 0, 0), 2),
            (Rgb::new(0, 0, 255), 1),
        ]));
        t.palette.set_enabled(Rgb::new(0, 0, 255), false);

        let summary = table.summarize(&[&t], 1, 1);
        assert_eq!(summary.required, 2);
        assert_eq!(summary.missing, 0);
    }

    #[test]
    fn test_summary_falls_back_to_tiles() {
        let mut table = ProgressTable::new();
        table.record(TileCoord::new(0, 0), TileStats { painted: 4, required: 2, wrong: 0 });
        let t = template(0);

        let summary = table.summarize(&[&t], 1, 1);
        assert_eq!(summary.required, 2);
        assert_eq!(summary.missing, 0);
        assert_eq!(summary.extra, 2);
    }

    #[test]
    fn test_summary_display() {
        let summary = ProgressSummary {
            shown: 1,
            loaded: 2,
            painted: 1234,
            required: 5000,
            missing: 3766,
            wrong: 7,
            extra: 0,
        };
        assert_eq!(
            summary.to_string(),
            "Showing 1 template (of 2 loaded).\nPainted 1,234 / 5,000 • Missing 3,766 • Wrong 7"
        );

        let summary = ProgressSummary {
            shown: 2,
            extra: 3,
            ..summary
        };
        assert!(summary.to_string().starts_with("Showing 2 templates"));
        assert!(summary.to_string().ends_with(" • Extra 3"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
