use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Display value used when a region or service carries no usable label.
pub const UNKNOWN_DISPLAY: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub code: String,
    pub name: String,
    pub availability_zone_count: Option<u32>,
    /// Raw launch date as found in the source; parsed at render time.
    pub launch_date: Option<String>,
    pub blog_url: Option<String>,
}

impl Region {
    pub fn display_name(&self) -> &str {
        non_empty_or(&self.name, UNKNOWN_DISPLAY)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub code: String,
    pub name: String,
}

impl Service {
    /// Name, then code, then the unknown sentinel.
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            &self.name
        } else {
            non_empty_or(&self.code, UNKNOWN_DISPLAY)
        }
    }
}

/// Region code to the set of service codes offered there.
pub type CoverageMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceMetadata {
    pub schema_version: Option<String>,
    pub data_timestamp: Option<String>,
}

/// Normalized view of one run's inputs. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalModel {
    pub metadata: SourceMetadata,
    pub regions: Vec<Region>,
    pub services: Vec<Service>,
    pub coverage: Option<CoverageMap>,
}

impl CanonicalModel {
    /// Number of services offered in `region_code`; zero when the region has
    /// no coverage entry or coverage data is absent altogether.
    pub fn service_count_for_region(&self, region_code: &str) -> usize {
        self.coverage
            .as_ref()
            .and_then(|coverage| coverage.get(region_code))
            .map_or(0, BTreeSet::len)
    }

    /// Number of listed regions whose coverage set contains `service_code`.
    pub fn region_count_for_service(&self, service_code: &str) -> usize {
        let Some(coverage) = self.coverage.as_ref() else {
            return 0;
        };
        self.regions
            .iter()
            .filter(|region| {
                coverage
                    .get(&region.code)
                    .is_some_and(|codes| codes.contains(service_code))
            })
            .count()
    }

    pub fn mapping_entry_count(&self) -> Option<usize> {
        self.coverage.as_ref().map(BTreeMap::len)
    }

    pub fn region_offers(&self, region_code: &str, service_code: &str) -> bool {
        self.coverage
            .as_ref()
            .and_then(|coverage| coverage.get(region_code))
            .is_some_and(|codes| codes.contains(service_code))
    }

    /// Service codes referenced by the coverage mapping with no matching
    /// entry in the service list.
    pub fn unlisted_service_codes(&self) -> BTreeSet<String> {
        let Some(coverage) = self.coverage.as_ref() else {
            return BTreeSet::new();
        };
        let known: BTreeSet<&str> = self.services.iter().map(|s| s.code.as_str()).collect();
        coverage
            .values()
            .flatten()
            .filter(|code| !known.contains(code.as_str()))
            .cloned()
            .collect()
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
