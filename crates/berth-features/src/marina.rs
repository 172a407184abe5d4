//! Marina → country reference data.
//!
//! The listing source only records a home marina (often a cruising region
//! rather than a port). [`MarinaCountries`] is an immutable lookup table that
//! maps those names to the country used for one-hot encoding and filtering.

use std::collections::BTreeMap;

/// Marinas and regions known to the marketplace, with their country.
const BUILTIN_MARINAS: &[(&str, &str)] = &[
    ("Amalfi Coast", "Italy"),
    ("Sardinia", "Italy"),
    ("Ligurian Riviera", "Italy"),
    ("Mykonos", "Greece"),
    ("Calvi", "France"),
    ("Corsica", "France"),
    ("French Riviera", "France"),
    ("Cannes", "France"),
    ("Ibiza", "Spain"),
    ("Mallorca", "Spain"),
    ("The Balearics", "Spain"),
    ("Virgin Islands", "USA"),
    ("Alaska", "USA"),
    ("Florida", "USA"),
    ("New England", "USA"),
    ("Abu Dhabi", "UAE"),
    ("Dubai", "UAE"),
    ("Sydney", "Australia"),
    ("Whitsundays", "Australia"),
    ("Komodo", "Indonesia"),
    // A region, not a country; mapped to its main charter base.
    ("Scandinavia", "Norway"),
];

/// Immutable marina → country lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarinaCountries {
    entries: BTreeMap<String, String>,
}

impl Default for MarinaCountries {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MarinaCountries {
    /// The built-in marketplace table.
    pub fn builtin() -> Self {
        Self::empty().with_entries(
            BUILTIN_MARINAS
                .iter()
                .map(|(marina, country)| (marina.to_string(), country.to_string())),
        )
    }

    /// A table with no entries.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace a single entry.
    pub fn with_entry(mut self, marina: impl Into<String>, country: impl Into<String>) -> Self {
        self.insert(marina.into(), country.into());
        self
    }

    /// Add or replace many entries.
    pub fn with_entries<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (marina, country) in entries {
            self.insert(marina, country);
        }
        self
    }

    fn insert(&mut self, marina: String, country: String) {
        let marina = marina.trim();
        let country = country.trim();
        if !marina.is_empty() && !country.is_empty() {
            self.entries.insert(marina.to_string(), country.to_string());
        }
    }

    /// Country for a marina, if known. Surrounding whitespace is ignored.
    pub fn country_for(&self, marina: &str) -> Option<&str> {
        self.entries.get(marina.trim()).map(String::as_str)
    }

    /// Number of known marinas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(marina, country)` pairs in marina order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(m, c)| (m.as_str(), c.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = MarinaCountries::builtin();
        assert_eq!(table.len(), BUILTIN_MARINAS.len());
        assert_eq!(table.country_for("Mykonos"), Some("Greece"));
        assert_eq!(table.country_for("The Balearics"), Some("Spain"));
        assert_eq!(table.country_for("Scandinavia"), Some("Norway"));
    }

    #[test]
    fn test_lookup_trims_and_misses() {
        let table = MarinaCountries::default();
        assert_eq!(table.country_for("  Dubai "), Some("UAE"));
        assert_eq!(table.country_for("Atlantis"), None);
        assert_eq!(table.country_for("dubai"), None);
    }

    #[test]
    fn test_with_entry_overrides() {
        let table = MarinaCountries::builtin()
            .with_entry("Split", "Croatia")
            .with_entry("Scandinavia", "Sweden");
        assert_eq!(table.country_for("Split"), Some("Croatia"));
        assert_eq!(table.country_for("Scandinavia"), Some("Sweden"));
    }

    #[test]
    fn test_blank_entries_ignored() {
        let table = MarinaCountries::empty()
            .with_entry("", "Nowhere")
            .with_entry("Port", "  ");
        assert!(table.is_empty());
    }
}
