use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::dates::{
    format_launch_date, format_source_timestamp, format_zoned_timestamp, LaunchDate,
};
use super::{
    Cell, CellStyle, CellValue, Column, Report, Sheet, AVAILABLE_MARK, COVERAGE_SHEET,
    REGIONS_SHEET, SERVICES_SHEET, SUMMARY_SHEET, UNAVAILABLE_MARK,
};
use crate::model::{CanonicalModel, Region, Service, UNKNOWN_DISPLAY};

pub const COVERAGE_UNAVAILABLE_NOTICE: &str =
    "Service coverage data is not available in the source document.";

/// Inputs to rendering that do not come from the source documents.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub generated_at: DateTime<Utc>,
    pub timezone: Tz,
    /// Where the primary document was read from, e.g. `s3://bucket/key`.
    pub source_location: String,
}

/// Renders the four report sheets in their fixed order. Pure: identical
/// inputs produce identical reports.
pub fn render_report(model: &CanonicalModel, context: &RenderContext) -> Report {
    Report {
        sheets: vec![
            render_summary_sheet(model, context),
            render_regions_sheet(model),
            render_services_sheet(model),
            render_coverage_sheet(model),
        ],
    }
}

pub fn render_summary_sheet(model: &CanonicalModel, context: &RenderContext) -> Sheet {
    let metadata = &model.metadata;
    let schema_version = metadata
        .schema_version
        .clone()
        .unwrap_or_else(|| UNKNOWN_DISPLAY.to_string());
    let data_timestamp = metadata
        .data_timestamp
        .as_deref()
        .map(|raw| format_source_timestamp(raw, context.timezone))
        .unwrap_or_else(|| UNKNOWN_DISPLAY.to_string());
    let mapping_entries = model
        .mapping_entry_count()
        .map_or_else(Cell::not_available, Cell::integer);

    let rows = vec![
        summary_row(
            "Report Generated",
            Cell::text(format_zoned_timestamp(context.generated_at, context.timezone)),
        ),
        summary_row("Data Source", Cell::text(context.source_location.clone())),
        summary_row("Schema Version", Cell::text(schema_version)),
        summary_row("Data Timestamp", Cell::text(data_timestamp)),
        summary_row("Total Regions", Cell::integer(model.regions.len())),
        summary_row("Total Services", Cell::integer(model.services.len())),
        summary_row("Coverage Mapping Entries", mapping_entries),
    ];

    Sheet::table(
        SUMMARY_SHEET,
        vec![Column::new("Property", 28.0), Column::new("Value", 60.0)],
        rows,
    )
}

fn summary_row(label: &str, value: Cell) -> Vec<Cell> {
    vec![Cell::styled_text(label, CellStyle::Label), value]
}

/// One row per region in source order.
pub fn render_regions_sheet(model: &CanonicalModel) -> Sheet {
    let rows = model
        .regions
        .iter()
        .map(|region| {
            vec![
                Cell::text(region.code.clone()),
                Cell::text(region.display_name()),
                region
                    .availability_zone_count
                    .map_or_else(Cell::not_available, |count| Cell::integer(count as usize)),
                Cell::integer(model.service_count_for_region(&region.code)),
                launch_date_cell(region),
                blog_cell(region),
            ]
        })
        .collect();

    Sheet::table(
        REGIONS_SHEET,
        vec![
            Column::new("Region Code", 18.0),
            Column::new("Region Name", 34.0),
            Column::new("Availability Zones", 20.0),
            Column::new("Services Available", 20.0),
            Column::new("Launch Date", 14.0),
            Column::new("Launch Blog", 60.0),
        ],
        rows,
    )
    .with_header_freeze(0)
    .with_autofilter()
}

fn launch_date_cell(region: &Region) -> Cell {
    match LaunchDate::parse(region.launch_date.as_deref()) {
        LaunchDate::Parsed(date) => Cell::text(format_launch_date(date)),
        LaunchDate::Unparsed(raw) => Cell::text(raw),
        LaunchDate::Missing => Cell::not_available(),
    }
}

fn blog_cell(region: &Region) -> Cell {
    match region.blog_url.as_deref().map(str::trim) {
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => Cell {
            value: CellValue::Link {
                url: url.to_string(),
                text: url.to_string(),
            },
            style: CellStyle::Link,
        },
        Some(raw) if !raw.is_empty() => Cell::text(raw),
        _ => Cell::not_available(),
    }
}

/// Services ordered case-insensitively by display name, ties broken by code.
pub fn sorted_services(services: &[Service]) -> Vec<&Service> {
    let mut sorted: Vec<&Service> = services.iter().collect();
    sorted.sort_by_cached_key(|service| {
        (
            service.display_name().to_lowercase(),
            service.code.clone(),
        )
    });
    sorted
}

pub fn render_services_sheet(model: &CanonicalModel) -> Sheet {
    let total_regions = model.regions.len();
    let rows = sorted_services(&model.services)
        .into_iter()
        .map(|service| {
            let available = model.region_count_for_service(&service.code);
            vec![
                Cell::text(service.code.clone()),
                Cell::text(service.display_name()),
                Cell::integer(available),
                Cell {
                    value: CellValue::Percent(coverage_percentage(available, total_regions)),
                    style: coverage_band(available, total_regions),
                },
            ]
        })
        .collect();

    Sheet::table(
        SERVICES_SHEET,
        vec![
            Column::new("Service Code", 22.0),
            Column::new("Service Name", 48.0),
            Column::new("Regions Available", 18.0),
            Column::new("Coverage", 12.0),
        ],
        rows,
    )
    .with_header_freeze(0)
    .with_autofilter()
}

/// Share of regions offering a service, in percent, rounded to one decimal.
/// Zero regions yields zero.
pub fn coverage_percentage(available: usize, total_regions: usize) -> f64 {
    if total_regions == 0 {
        return 0.0;
    }
    let percent = available as f64 * 100.0 / total_regions as f64;
    (percent * 10.0).round() / 10.0
}

/// Color band for the displayed (rounded) coverage percentage, so a cell
/// reading 100.0 always carries the full-coverage style.
pub fn coverage_band(available: usize, total_regions: usize) -> CellStyle {
    let percent = coverage_percentage(available, total_regions);
    if percent >= 100.0 {
        CellStyle::CoverageFull
    } else if percent >= 75.0 {
        CellStyle::CoverageHigh
    } else if percent >= 50.0 {
        CellStyle::CoverageMedium
    } else if percent > 0.0 {
        CellStyle::CoverageLow
    } else {
        CellStyle::CoverageNone
    }
}

/// Service-by-region availability matrix. Coverage codes missing from the
/// service list get their own rows, labelled with the raw code.
pub fn render_coverage_sheet(model: &CanonicalModel) -> Sheet {
    if model.coverage.is_none() {
        return Sheet::notice(COVERAGE_SHEET, COVERAGE_UNAVAILABLE_NOTICE);
    }

    let unlisted: Vec<Service> = model
        .unlisted_service_codes()
        .into_iter()
        .map(|code| Service {
            name: code.clone(),
            code,
        })
        .collect();
    let mut all_services: Vec<Service> = model.services.clone();
    all_services.extend(unlisted);

    let mut columns = vec![Column::new("Service", 44.0)];
    columns.extend(
        model
            .regions
            .iter()
            .map(|region| Column::new(region.code.clone(), 14.0)),
    );

    let rows = sorted_services(&all_services)
        .into_iter()
        .map(|service| {
            let mut cells = Vec::with_capacity(model.regions.len() + 1);
            cells.push(Cell::text(service.display_name()));
            cells.extend(model.regions.iter().map(|region| {
                if model.region_offers(&region.code, &service.code) {
                    Cell::styled_text(AVAILABLE_MARK, CellStyle::Available)
                } else {
                    Cell::styled_text(UNAVAILABLE_MARK, CellStyle::Unavailable)
                }
            }));
            cells
        })
        .collect();

    Sheet::table(COVERAGE_SHEET, columns, rows)
        .with_header_freeze(1)
        .with_autofilter()
}
