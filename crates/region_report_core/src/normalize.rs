use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::model::{CanonicalModel, CoverageMap, Region, Service, SourceMetadata};
use crate::probe::{
    lookup_path, probe_collection, probe_count_field, probe_object, probe_string_field,
    COVERAGE_CONTAINER, COVERAGE_ENTRY_LIST, DATA_TIMESTAMP, METADATA_CONTAINER,
    REGIONS_CONTAINER, REGION_AZ_COUNT, REGION_BLOG_URL, REGION_CODE, REGION_LAUNCH_DATE,
    REGION_NAME, SCHEMA_VERSION, SERVICES_CONTAINER, SERVICE_CODE, SERVICE_NAME,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("source document must be a JSON object")]
    InvalidDocument,
    #[error("source document has no `{0}` collection")]
    MissingContainer(&'static str),
}

/// Builds the canonical model from the primary document and the optional
/// service-names document.
///
/// Only the regions and services collections are mandatory. A missing
/// coverage mapping leaves `coverage` empty and the report degrades to a
/// "not available" state.
pub fn normalize_documents(
    primary: &Value,
    service_names: Option<&Value>,
) -> Result<CanonicalModel, NormalizeError> {
    if !primary.is_object() {
        return Err(NormalizeError::InvalidDocument);
    }

    let raw_regions = probe_collection(primary, REGIONS_CONTAINER)
        .ok_or(NormalizeError::MissingContainer("regions"))?;
    let raw_services = probe_collection(primary, SERVICES_CONTAINER)
        .ok_or(NormalizeError::MissingContainer("services"))?;

    let name_lookup = service_names.map(build_name_lookup).unwrap_or_default();

    let regions = raw_regions.iter().map(normalize_region).collect();
    let services = raw_services
        .iter()
        .map(|record| backfill_service_name(normalize_service(record), &name_lookup))
        .collect();
    let coverage = probe_object(primary, COVERAGE_CONTAINER).map(normalize_coverage);

    Ok(CanonicalModel {
        metadata: normalize_metadata(primary),
        regions,
        services,
        coverage,
    })
}

pub fn normalize_metadata(primary: &Value) -> SourceMetadata {
    let metadata = METADATA_CONTAINER
        .iter()
        .find_map(|path| lookup_path(primary, path).filter(|value| value.is_object()))
        .unwrap_or(primary);

    SourceMetadata {
        schema_version: probe_string_field(metadata, &SCHEMA_VERSION),
        data_timestamp: probe_string_field(metadata, &DATA_TIMESTAMP),
    }
}

pub fn normalize_region(record: &Value) -> Region {
    if let Some(code) = record.as_str() {
        return Region {
            code: code.trim().to_string(),
            name: String::new(),
            availability_zone_count: None,
            launch_date: None,
            blog_url: None,
        };
    }

    Region {
        code: probe_string_field(record, &REGION_CODE).unwrap_or_default(),
        name: probe_string_field(record, &REGION_NAME).unwrap_or_default(),
        availability_zone_count: probe_count_field(record, &REGION_AZ_COUNT),
        launch_date: probe_string_field(record, &REGION_LAUNCH_DATE),
        blog_url: probe_string_field(record, &REGION_BLOG_URL),
    }
}

pub fn normalize_service(record: &Value) -> Service {
    if let Some(code) = record.as_str() {
        return Service {
            code: code.trim().to_string(),
            name: String::new(),
        };
    }

    Service {
        code: probe_string_field(record, &SERVICE_CODE).unwrap_or_default(),
        name: probe_string_field(record, &SERVICE_NAME).unwrap_or_default(),
    }
}

/// Code to friendly name, exact matches only.
pub fn build_name_lookup(document: &Value) -> BTreeMap<String, String> {
    probe_collection(document, SERVICES_CONTAINER)
        .unwrap_or_default()
        .iter()
        .map(normalize_service)
        .filter(|service| !service.code.is_empty() && !service.name.is_empty())
        .map(|service| (service.code, service.name))
        .collect()
}

fn backfill_service_name(mut service: Service, lookup: &BTreeMap<String, String>) -> Service {
    if service.name.is_empty() {
        service.name = lookup
            .get(&service.code)
            .cloned()
            .unwrap_or_else(|| service.code.clone());
    }
    service
}

/// Flattens each region entry to a set of service codes. Entries may be a
/// plain array or an object wrapping the array; any other shape becomes an
/// empty set.
pub fn normalize_coverage(mapping: &Map<String, Value>) -> CoverageMap {
    mapping
        .iter()
        .map(|(region_code, entry)| (region_code.clone(), coverage_entry_codes(entry)))
        .collect()
}

fn coverage_entry_codes(entry: &Value) -> BTreeSet<String> {
    let items = match entry {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => COVERAGE_ENTRY_LIST
            .keys
            .iter()
            .find_map(|key| entry.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    items
        .iter()
        .map(|item| normalize_service(item).code)
        .filter(|code| !code.is_empty())
        .collect()
}

/// Returns a warning when the source declares a schema version whose major
/// component differs from `expected_major`. An absent version is not flagged.
pub fn check_schema_version(metadata: &SourceMetadata, expected_major: &str) -> Option<String> {
    let version = metadata.schema_version.as_deref()?;
    let major = version
        .trim()
        .trim_start_matches(['v', 'V'])
        .split('.')
        .next()
        .unwrap_or_default();
    (major != expected_major).then(|| {
        format!("unexpected source schema version '{version}' (expected major {expected_major})")
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn primary() -> Value {
        json!({
            "metadata": {"schemaVersion": "1.2", "timestamp": "2026-10-01T12:00:00Z"},
            "regions": [
                {"code": "us-east-1", "name": "US East (N. Virginia)", "availabilityZoneCount": 6},
                {"regionCode": "eu-west-1", "regionName": "Europe (Ireland)"}
            ],
            "services": [
                {"code": "s3", "name": "Amazon S3"},
                {"serviceCode": "ec2"},
                {"code": "lambda"}
            ],
            "servicesByRegion": {
                "us-east-1": ["s3", "ec2", "lambda"],
                "eu-west-1": {"services": ["s3"]}
            }
        })
    }

    #[test]
    fn normalizes_regions_services_and_coverage() {
        let names = json!({"count": 1, "services": [{"code": "ec2", "name": "Amazon EC2"}]});
        let model = normalize_documents(&primary(), Some(&names)).expect("should normalize");

        assert_eq!(model.regions.len(), 2);
        assert_eq!(model.regions[1].code, "eu-west-1");
        assert_eq!(model.regions[1].name, "Europe (Ireland)");
        assert_eq!(model.regions[0].availability_zone_count, Some(6));
        assert_eq!(model.regions[1].availability_zone_count, None);

        let names: Vec<&str> = model.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Amazon S3", "Amazon EC2", "lambda"]);

        let coverage = model.coverage.expect("coverage present");
        assert_eq!(coverage["eu-west-1"], BTreeSet::from(["s3".to_string()]));
        assert_eq!(coverage["us-east-1"].len(), 3);
        assert_eq!(
            model.metadata,
            SourceMetadata {
                schema_version: Some("1.2".to_string()),
                data_timestamp: Some("2026-10-01T12:00:00Z".to_string()),
            }
        );
    }

    #[test]
    fn array_and_wrapped_entries_normalize_identically() {
        let plain = json!({"us-east-1": ["ec2", "s3"]});
        let wrapped = json!({"us-east-1": {"services": ["ec2", "s3"]}});

        let plain = normalize_coverage(plain.as_object().expect("object"));
        let wrapped = normalize_coverage(wrapped.as_object().expect("object"));

        assert_eq!(plain, wrapped);
        assert_eq!(
            plain["us-east-1"],
            BTreeSet::from(["ec2".to_string(), "s3".to_string()])
        );
    }

    #[test]
    fn missing_mandatory_collections_fail() {
        let no_regions = json!({"services": []});
        assert_eq!(
            normalize_documents(&no_regions, None),
            Err(NormalizeError::MissingContainer("regions"))
        );

        let no_services = json!({"regions": []});
        assert_eq!(
            normalize_documents(&no_services, None),
            Err(NormalizeError::MissingContainer("services"))
        );

        assert_eq!(
            normalize_documents(&json!([1, 2]), None),
            Err(NormalizeError::InvalidDocument)
        );
    }

    #[test]
    fn missing_coverage_is_not_fatal() {
        let document = json!({"regions": [], "services": []});
        let model = normalize_documents(&document, None).expect("should normalize");
        assert!(model.coverage.is_none());
        assert_eq!(model.metadata, SourceMetadata::default());
    }

    #[test]
    fn services_without_any_name_keep_their_code() {
        let model = normalize_documents(&primary(), None).expect("should normalize");
        assert!(model.services.iter().all(|s| !s.display_name().is_empty()));
        assert_eq!(model.services[1].name, "ec2");
    }

    #[test]
    fn unrecognized_records_produce_empty_fields() {
        let region = normalize_region(&json!({"unexpected": true}));
        assert_eq!(region.code, "");
        assert_eq!(region.name, "");
        assert_eq!(region.launch_date, None);
    }

    #[test]
    fn schema_version_check_flags_other_majors() {
        let metadata = |version: Option<&str>| SourceMetadata {
            schema_version: version.map(str::to_string),
            ..SourceMetadata::default()
        };

        assert_eq!(check_schema_version(&metadata(Some("1.4")), "1"), None);
        assert_eq!(check_schema_version(&metadata(Some("v1")), "1"), None);
        assert_eq!(check_schema_version(&metadata(None), "1"), None);
        assert!(check_schema_version(&metadata(Some("2.0")), "1")
            .expect("warning expected")
            .contains("2.0"));
    }
}
