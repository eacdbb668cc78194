//! Table-driven lookup of fields whose spelling varies between source
//! documents.
//!
//! Every logical field is described by an ordered list of candidate keys and
//! the first non-empty match wins. Container lookups work the same way over
//! key paths, so a collection may sit directly under its key or one level
//! deeper under a wrapper object of the same name.

use serde_json::{Map, Value};

/// Ordered spellings for one logical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCandidates {
    pub field: &'static str,
    pub keys: &'static [&'static str],
}

pub const REGION_CODE: FieldCandidates = FieldCandidates {
    field: "region.code",
    keys: &["code", "regionCode", "region_code", "id", "regionId", "region"],
};

pub const REGION_NAME: FieldCandidates = FieldCandidates {
    field: "region.name",
    keys: &[
        "name",
        "regionName",
        "region_name",
        "longName",
        "displayName",
        "fullName",
    ],
};

pub const REGION_AZ_COUNT: FieldCandidates = FieldCandidates {
    field: "region.availabilityZoneCount",
    keys: &[
        "availabilityZoneCount",
        "availabilityZones",
        "azCount",
        "az_count",
        "availability_zones",
        "zones",
    ],
};

pub const REGION_LAUNCH_DATE: FieldCandidates = FieldCandidates {
    field: "region.launchDate",
    keys: &["launchDate", "launch_date", "launched", "launchedAt"],
};

pub const REGION_BLOG_URL: FieldCandidates = FieldCandidates {
    field: "region.blogUrl",
    keys: &["blogUrl", "blog_url", "launchBlog", "announcementUrl", "blog"],
};

pub const SERVICE_CODE: FieldCandidates = FieldCandidates {
    field: "service.code",
    keys: &["code", "serviceCode", "service_code", "id", "serviceId", "key"],
};

pub const SERVICE_NAME: FieldCandidates = FieldCandidates {
    field: "service.name",
    keys: &[
        "name",
        "serviceName",
        "service_name",
        "displayName",
        "longName",
        "fullName",
    ],
};

pub const SCHEMA_VERSION: FieldCandidates = FieldCandidates {
    field: "metadata.schemaVersion",
    keys: &["schemaVersion", "schema_version", "version"],
};

pub const DATA_TIMESTAMP: FieldCandidates = FieldCandidates {
    field: "metadata.timestamp",
    keys: &["timestamp", "generatedAt", "generated_at", "lastUpdated"],
};

/// Keys under which a coverage entry may wrap its plain list of codes.
pub const COVERAGE_ENTRY_LIST: FieldCandidates = FieldCandidates {
    field: "servicesByRegion.<region>",
    keys: &["services", "serviceCodes", "service_codes", "codes"],
};

pub const REGIONS_CONTAINER: &[&[&str]] = &[
    &["regions"],
    &["regions", "regions"],
    &["data", "regions"],
];

pub const SERVICES_CONTAINER: &[&[&str]] = &[
    &["services"],
    &["services", "services"],
    &["data", "services"],
];

pub const COVERAGE_CONTAINER: &[&[&str]] = &[
    &["servicesByRegion"],
    &["servicesByRegion", "servicesByRegion"],
    &["services_by_region"],
    &["regionServices"],
    &["data", "servicesByRegion"],
];

pub const METADATA_CONTAINER: &[&[&str]] = &[&["metadata"], &["meta"]];

pub fn lookup_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, segment| current.get(*segment))
}

/// First path that resolves to an array.
pub fn probe_collection<'a>(document: &'a Value, paths: &[&[&str]]) -> Option<&'a [Value]> {
    paths.iter().find_map(|path| {
        lookup_path(document, path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    })
}

/// First path that resolves to an object. A wrapper that repeats the last
/// path segment as a nested object is unwrapped.
pub fn probe_object<'a>(
    document: &'a Value,
    paths: &[&[&str]],
) -> Option<&'a Map<String, Value>> {
    paths.iter().find_map(|path| {
        let object = lookup_path(document, path).and_then(Value::as_object)?;
        let nested = path
            .last()
            .and_then(|last| object.get(*last))
            .and_then(Value::as_object);
        Some(nested.unwrap_or(object))
    })
}

/// First candidate key holding a non-empty string. Numbers are accepted and
/// rendered as text so numeric identifiers survive.
pub fn probe_string_field(record: &Value, candidates: &FieldCandidates) -> Option<String> {
    candidates.keys.iter().find_map(|key| {
        let text = match record.get(*key)? {
            Value::String(text) => text.trim().to_string(),
            Value::Number(number) => number.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    })
}

/// First candidate key holding a count: a non-negative integer, a numeric
/// string, or an array whose length is the count.
pub fn probe_count_field(record: &Value, candidates: &FieldCandidates) -> Option<u32> {
    candidates
        .keys
        .iter()
        .find_map(|key| match record.get(*key)? {
            Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(text) => text.trim().parse::<u32>().ok(),
            Value::Array(items) => u32::try_from(items.len()).ok(),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn first_non_empty_candidate_wins() {
        let record = json!({"code": "", "regionCode": "eu-west-1", "id": "ignored"});
        assert_eq!(
            probe_string_field(&record, &REGION_CODE),
            Some("eu-west-1".to_string())
        );
    }

    #[test]
    fn missing_candidates_yield_none() {
        let record = json!({"unrelated": "value", "name": null});
        assert_eq!(probe_string_field(&record, &REGION_NAME), None);
    }

    #[test]
    fn count_accepts_numbers_strings_and_arrays() {
        assert_eq!(
            probe_count_field(&json!({"availabilityZoneCount": 6}), &REGION_AZ_COUNT),
            Some(6)
        );
        assert_eq!(
            probe_count_field(&json!({"azCount": "3"}), &REGION_AZ_COUNT),
            Some(3)
        );
        assert_eq!(
            probe_count_field(
                &json!({"availabilityZones": ["a", "b"]}),
                &REGION_AZ_COUNT
            ),
            Some(2)
        );
        assert_eq!(
            probe_count_field(&json!({"availabilityZoneCount": -1}), &REGION_AZ_COUNT),
            None
        );
    }

    #[test]
    fn collections_may_be_nested_under_same_key() {
        let direct = json!({"regions": [{"code": "a"}]});
        let nested = json!({"regions": {"regions": [{"code": "b"}], "count": 1}});

        assert_eq!(
            probe_collection(&direct, REGIONS_CONTAINER).map(<[Value]>::len),
            Some(1)
        );
        assert_eq!(
            probe_collection(&nested, REGIONS_CONTAINER)
                .and_then(|items| items.first())
                .and_then(|item| item.get("code")),
            Some(&json!("b"))
        );
        assert!(probe_collection(&json!({"other": []}), REGIONS_CONTAINER).is_none());
    }

    #[test]
    fn object_probe_unwraps_same_named_wrapper() {
        let wrapped = json!({
            "servicesByRegion": {"servicesByRegion": {"us-east-1": ["s3"]}, "count": 1}
        });
        let object = probe_object(&wrapped, COVERAGE_CONTAINER).expect("mapping should resolve");
        assert!(object.contains_key("us-east-1"));
        assert!(!object.contains_key("count"));

        let direct = json!({"servicesByRegion": {"us-east-1": ["s3"]}});
        let object = probe_object(&direct, COVERAGE_CONTAINER).expect("mapping should resolve");
        assert!(object.contains_key("us-east-1"));
    }
}
