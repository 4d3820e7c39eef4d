//! Per-template colour palette with user-toggleable visibility.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Rgb;

/// Frequency and visibility of one template colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// Number of required pixels using this colour.
    pub count: u64,
    /// Whether pixels of this colour are drawn and counted.
    pub enabled: bool,
}

/// The colours a template uses, keyed by RGB.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColourPalette {
    colours: BTreeMap<Rgb, PaletteEntry>,
}

impl ColourPalette {
    /// Create an empty palette.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a palette from fresh counts with every colour enabled.
    pub fn from_counts(counts: BTreeMap<Rgb, u64>) -> Self {
        let colours = counts
            .into_iter()
            .map(|(rgb, count)| (rgb, PaletteEntry { count, enabled: true }))
            .collect();
        Self { colours }
    }

    /// Rebuild a palette from recomputed counts, keeping the user's choices.
    ///
    /// Counts always come from `counts`. The `enabled` flag of a colour is
    /// copied from `persisted` when it holds an explicit boolean for the same
    /// `"r,g,b"` key; anything else defaults to enabled. Persisted colours that
    /// no longer occur are dropped.
    pub fn merge_persisted(
        counts: BTreeMap<Rgb, u64>,
        persisted: &BTreeMap<String, PersistedColour>,
    ) -> Self {
        let colours = counts
            .into_iter()
            .map(|(rgb, count)| {
                let enabled = persisted
                    .get(&rgb.to_string())
                    .and_then(|p| p.enabled)
                    .unwrap_or(true);
                (rgb, PaletteEntry { count, enabled })
            })
            .collect();
        Self { colours }
    }

    /// Get the entry for a colour.
    pub fn get(&self, rgb: Rgb) -> Option<&PaletteEntry> {
        self.colours.get(&rgb)
    }

    /// Check whether a colour is part of this palette.
    pub fn contains(&self, rgb: Rgb) -> bool {
        self.colours.contains_key(&rgb)
    }

    /// Whether pixels of this colour should be drawn.
    ///
    /// Colours outside the palette are never filtered.
    pub fn is_enabled(&self, rgb: Rgb) -> bool {
        self.colours.get(&rgb).map_or(true, |e| e.enabled)
    }

    /// Toggle a colour. Returns false if the colour is not in the palette.
    pub fn set_enabled(&mut self, rgb: Rgb, enabled: bool) -> bool {
        match self.colours.get_mut(&rgb) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Check if any colour is disabled.
    pub fn has_disabled(&self) -> bool {
        self.colours.values().any(|e| !e.enabled)
    }

    /// Iterate colours in key order.
    pub fn iter(&self) -> impl Iterator<Item = (Rgb, &PaletteEntry)> {
        self.colours.iter().map(|(rgb, e)| (*rgb, e))
    }

    /// Colours sorted by count, most common first.
    pub fn by_frequency(&self) -> Vec<(Rgb, PaletteEntry)> {
        let mut entries: Vec<(Rgb, PaletteEntry)> =
            self.colours.iter().map(|(rgb, e)| (*rgb, *e)).collect();
        entries.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.0.cmp(&b.0)));
        entries
    }

    /// Sum of all colour counts.
    pub fn total(&self) -> u64 {
        self.colours.values().map(|e| e.count).sum()
    }

    /// Get the number of colours.
    pub fn len(&self) -> usize {
        self.colours.len()
    }

    /// Check if the palette is empty.
    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    /// Convert to the persisted `"r,g,b"` keyed form.
    pub fn to_persisted(&self) -> BTreeMap<String, PersistedColour> {
        self.colours
            .iter()
            .map(|(rgb, e)| {
                (
                    rgb.to_string(),
                    PersistedColour {
                        count: Some(e.count),
                        enabled: Some(e.enabled),
                    },
                )
            })
            .collect()
    }
}

/// A palette entry as found in stored documents.
///
/// Older documents may omit either field, so both are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedColour {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn counts() -> BTreeMap<Rgb, u64> {
        BTreeMap::from([(RED, 2), (BLUE, 1)])
    }

    #[test]
    fn test_from_counts_all_enabled() {
        let palette = ColourPalette::from_counts(counts());
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get(RED), Some(&PaletteEntry { count: 2, enabled: true }));
        assert!(!palette.has_disabled());
        assert_eq!(palette.total(), 3);
    }

    #[test]
    fn test_merge_keeps_enabled_flags() {
        let persisted = BTreeMap::from([
            (
                "255,0,0".to_string(),
                PersistedColour {
                    count: Some(99),
                    enabled: Some(false),
                },
            ),
            (
                "1,2,3".to_string(),
                PersistedColour {
                    count: Some(5),
                    enabled: Some(false),
                },
            ),
        ]);

        let palette = ColourPalette::merge_persisted(counts(), &persisted);

        // Recomputed count wins, enabled flag survives
        assert_eq!(palette.get(RED), Some(&PaletteEntry { count: 2, enabled: false }));
        // No record: enabled by default
        assert_eq!(palette.get(BLUE), Some(&PaletteEntry { count: 1, enabled: true }));
        // Stale colour dropped
        assert!(!palette.contains(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn test_merge_missing_enabled_defaults_true() {
        let persisted = BTreeMap::from([(
            "255,0,0".to_string(),
            PersistedColour {
                count: Some(2),
                enabled: None,
            },
        )]);
        let palette = ColourPalette::merge_persisted(counts(), &persisted);
        assert!(palette.is_enabled(RED));
    }

    #[test]
    fn test_set_enabled() {
        let mut palette = ColourPalette::from_counts(counts());
        assert!(palette.set_enabled(BLUE, false));
        assert!(!palette.is_enabled(BLUE));
        assert!(palette.has_disabled());
        assert!(!palette.set_enabled(Rgb::new(9, 9, 9), false));
        // Unknown colours are never filtered
        assert!(palette.is_enabled(Rgb::new(9, 9, 9)));
    }

    #[test]
    fn test_by_frequency() {
        let palette = ColourPalette::from_counts(counts());
        let order: Vec<Rgb> = palette.by_frequency().into_iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec![RED, BLUE]);
    }

    #[test]
    fn test_to_persisted() {
        let mut palette = ColourPalette::from_counts(counts());
        palette.set_enabled(RED, false);
        let persisted = palette.to_persisted();
        assert_eq!(persisted["255,0,0"].enabled, Some(false));
        assert_eq!(persisted["0,0,255"].count, Some(1));
    }
}
