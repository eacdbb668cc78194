//! In-memory report model produced by the renderer and consumed by the
//! workbook encoder.
//!
//! Cells carry a semantic [`CellStyle`]; the concrete colors, weights and
//! alignment live in one table ([`CellStyle::appearance`]) so the encoder
//! stays a mechanical translation.

pub mod dates;
pub mod render;

pub use render::{
    coverage_band, coverage_percentage, render_coverage_sheet, render_regions_sheet,
    render_report, render_services_sheet, render_summary_sheet, sorted_services, RenderContext,
};

pub const SUMMARY_SHEET: &str = "Summary";
pub const REGIONS_SHEET: &str = "Regions";
pub const SERVICES_SHEET: &str = "Services";
pub const COVERAGE_SHEET: &str = "Service Coverage";

pub const NOT_AVAILABLE: &str = "N/A";
pub const AVAILABLE_MARK: &str = "✓";
pub const UNAVAILABLE_MARK: &str = "✗";

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(u64),
    /// Percentage in the 0..=100 range.
    Percent(f64),
    Link { url: String, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellStyle {
    Plain,
    Label,
    NotAvailable,
    Link,
    CoverageFull,
    CoverageHigh,
    CoverageMedium,
    CoverageLow,
    CoverageNone,
    Available,
    Unavailable,
    Notice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    General,
    Left,
    Center,
}

/// Concrete presentation of a style. Colors are `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appearance {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub font_color: Option<u32>,
    pub fill_color: Option<u32>,
    pub align: HorizontalAlign,
}

impl Appearance {
    const PLAIN: Self = Self {
        bold: false,
        italic: false,
        underline: false,
        font_color: None,
        fill_color: None,
        align: HorizontalAlign::General,
    };
}

/// Header row presentation shared by every tabular sheet.
pub const HEADER_APPEARANCE: Appearance = Appearance {
    bold: true,
    italic: false,
    underline: false,
    font_color: Some(0xFFFFFF),
    fill_color: Some(0x232F3E),
    align: HorizontalAlign::Center,
};

impl CellStyle {
    pub fn appearance(self) -> Appearance {
        let plain = Appearance::PLAIN;
        match self {
            Self::Plain => plain,
            Self::Label => Appearance {
                bold: true,
                ..plain
            },
            Self::NotAvailable => Appearance {
                italic: true,
                font_color: Some(0x808080),
                align: HorizontalAlign::Center,
                ..plain
            },
            Self::Link => Appearance {
                underline: true,
                font_color: Some(0x0563C1),
                ..plain
            },
            Self::CoverageFull => Appearance {
                bold: true,
                font_color: Some(0x006100),
                fill_color: Some(0xC6EFCE),
                align: HorizontalAlign::Center,
                ..plain
            },
            Self::CoverageHigh => Appearance {
                font_color: Some(0x375623),
                fill_color: Some(0xE2EFDA),
                align: HorizontalAlign::Center,
                ..plain
            },
            Self::CoverageMedium => Appearance {
                font_color: Some(0x9C5700),
                fill_color: Some(0xFFEB9C),
                align: HorizontalAlign::Center,
                ..plain
            },
            Self::CoverageLow => Appearance {
                font_color: Some(0x9C0006),
                fill_color: Some(0xFFC7CE),
                align: HorizontalAlign::Center,
                ..plain
            },
            Self::CoverageNone => Appearance {
                italic: true,
                font_color: Some(0x808080),
                fill_color: Some(0xD9D9D9),
                align: HorizontalAlign::Center,
                ..plain
            },
            Self::Available => Appearance {
                bold: true,
                font_color: Some(0x006100),
                fill_color: Some(0xC6EFCE),
                align: HorizontalAlign::Center,
                ..plain
            },
            Self::Unavailable => Appearance {
                font_color: Some(0xBFBFBF),
                align: HorizontalAlign::Center,
                ..plain
            },
            Self::Notice => Appearance {
                italic: true,
                font_color: Some(0x595959),
                align: HorizontalAlign::Center,
                ..plain
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::styled_text(value, CellStyle::Plain)
    }

    pub fn styled_text(value: impl Into<String>, style: CellStyle) -> Self {
        Self {
            value: CellValue::Text(value.into()),
            style,
        }
    }

    pub fn integer(value: usize) -> Self {
        Self {
            value: CellValue::Integer(value as u64),
            style: CellStyle::Plain,
        }
    }

    pub fn not_available() -> Self {
        Self::styled_text(NOT_AVAILABLE, CellStyle::NotAvailable)
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            CellValue::Text(text) => Some(text),
            CellValue::Link { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: String,
    pub width: f64,
}

impl Column {
    pub fn new(header: impl Into<String>, width: f64) -> Self {
        Self {
            header: header.into(),
            width,
        }
    }
}

/// Rows and columns kept visible while scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezePane {
    pub rows: u32,
    pub columns: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
    pub freeze: Option<FreezePane>,
    /// Filter over the header row and every data row, spanning all columns.
    pub autofilter: bool,
    /// Replaces the table with one centered message when set.
    pub notice: Option<String>,
}

impl Sheet {
    pub fn table(name: &str, columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows,
            freeze: None,
            autofilter: false,
            notice: None,
        }
    }

    pub fn notice(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
            freeze: None,
            autofilter: false,
            notice: Some(message.into()),
        }
    }

    pub fn with_header_freeze(mut self, columns: u16) -> Self {
        self.freeze = Some(FreezePane { rows: 1, columns });
        self
    }

    pub fn with_autofilter(mut self) -> Self {
        self.autofilter = true;
        self
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    /// Data row whose first cell reads `key`.
    pub fn row_by_key(&self, key: &str) -> Option<&[Cell]> {
        self.rows
            .iter()
            .find(|cells| cells.first().and_then(Cell::as_text) == Some(key))
            .map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub sheets: Vec<Sheet>,
}

impl Report {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }
}
