use serde::{Deserialize, Serialize};

/// Display metadata for a curated region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capacity_mw: Option<f64>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "active".to_string()
}

impl RegionInfo {
    pub fn new(name: &str, display_name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            description: Some(description.to_string()),
            capacity_mw: None,
            status: default_status(),
        }
    }
}

/// Curated catalog of regions used for listing and display.
///
/// This is independent of the admission allow-list held by
/// [`crate::access::AccessControl`]: a region may be admissible without
/// appearing here, and the two sets are never merged.
#[derive(Debug, Clone)]
pub struct RegionRegistry {
    regions: Vec<RegionInfo>,
}

impl RegionRegistry {
    pub fn new(regions: Vec<RegionInfo>) -> Self {
        Self { regions }
    }

    /// Regions in catalog order.
    pub fn list_regions(&self) -> &[RegionInfo] {
        &self.regions
    }

    pub fn get(&self, name: &str) -> Option<&RegionInfo> {
        let name = name.trim().to_lowercase();
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

pub fn default_catalog() -> Vec<RegionInfo> {
    vec![
        RegionInfo::new("us-west", "US West", "Western United States grid"),
        RegionInfo::new("us-east", "US East", "Eastern United States grid"),
        RegionInfo::new("us-central", "US Central", "Central United States grid"),
        RegionInfo::new("pgae", "PG&E", "Pacific Gas & Electric grid"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_is_stable() {
        let registry = RegionRegistry::default();
        let first: Vec<_> = registry.names().collect();
        let second: Vec<_> = registry.names().collect();
        assert_eq!(first, vec!["us-west", "us-east", "us-central", "pgae"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_lookup_normalizes() {
        let registry = RegionRegistry::default();
        assert_eq!(registry.get(" PGAE ").map(|r| r.display_name.as_str()), Some("PG&E"));
        assert!(!registry.contains("europe"));
    }
}
