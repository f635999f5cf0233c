//! Tracked city list

use serde::{Deserialize, Serialize};

/// Ordered list of city names the user monitors.
///
/// Insertion order is the order cities were added; names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedCityList {
    cities: Vec<String>,
}

impl TrackedCityList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a city. Returns `false` (and changes nothing) for blank or
    /// already tracked names.
    pub fn add(&mut self, city: &str) -> bool {
        if city.trim().is_empty() || self.contains(city) {
            return false;
        }
        self.cities.push(city.to_string());
        true
    }

    /// Remove a city. Returns `false` if it was not tracked.
    pub fn remove(&mut self, city: &str) -> bool {
        let before = self.cities.len();
        self.cities.retain(|c| c != city);
        self.cities.len() != before
    }

    #[must_use]
    pub fn contains(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.cities
    }
}

impl FromIterator<String> for TrackedCityList {
    /// Builds a list, dropping blanks and later duplicates.
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut list = Self::new();
        for city in iter {
            list.add(&city);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut list = TrackedCityList::new();
        assert!(list.add("Paris"));
        assert!(list.add("London"));
        assert!(list.add("Tokyo"));
        assert_eq!(list.as_slice(), ["Paris", "London", "Tokyo"]);
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut list = TrackedCityList::new();
        list.add("Paris");
        assert!(!list.add("Paris"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_blank_add_is_noop() {
        let mut list = TrackedCityList::new();
        assert!(!list.add(""));
        assert!(!list.add("   "));
        assert!(list.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut list: TrackedCityList = ["Paris", "London"].map(String::from).into_iter().collect();
        assert!(list.remove("Paris"));
        assert!(!list.remove("Paris"));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["London"]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let list: TrackedCityList = ["Oslo", "Lima"].map(String::from).into_iter().collect();
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["Oslo","Lima"]"#);

        let restored: TrackedCityList = serde_json::from_str(r#"["Oslo","Lima"]"#).unwrap();
        assert_eq!(restored, list);
    }
}
