//! In-memory workbook model
//!
//! Report builders lay out cells, fills, freeze panes and column widths on
//! a [`Sheet`]; nothing touches disk until [`Workbook::save`] renders the
//! whole model with `rust_xlsxwriter`. Rows and columns are zero-based.

use crate::error::{ReportError, Result};
use crate::numeric::Numeric;
use rust_xlsxwriter::{Format, FormatAlign};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Widest worksheet Excel opens
pub const MAX_COLUMNS: usize = 16_384;

const MAX_SHEET_NAME_CHARS: usize = 31;
const INVALID_SHEET_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Fail when a sheet needs more columns than Excel allows
pub fn check_column_count(sheet: &str, columns: usize) -> Result<()> {
    if columns > MAX_COLUMNS {
        return Err(ReportError::TooManyColumns {
            sheet: sheet.to_string(),
            columns,
            limit: MAX_COLUMNS,
        });
    }
    Ok(())
}

/// Excel-safe sheet name
///
/// Characters Excel rejects become `_`, a leading or trailing apostrophe
/// too, and the result is cut to 31 characters.
pub fn sanitize_sheet_name(name: &str) -> String {
    let mut chars: Vec<char> = name
        .chars()
        .map(|c| if INVALID_SHEET_NAME_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_CHARS)
        .collect();
    if chars.is_empty() {
        return "Sheet".to_string();
    }
    if chars[0] == '\'' {
        chars[0] = '_';
    }
    let last = chars.len() - 1;
    if chars[last] == '\'' {
        chars[last] = '_';
    }
    chars.into_iter().collect()
}

/// Value held by a cell
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    /// Always finite
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Text cell; empty text becomes an empty cell
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// Numeric cell; NaN and infinities become an empty cell
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            CellValue::Number(value)
        } else {
            CellValue::Empty
        }
    }

    pub fn from_opt(value: Option<f64>) -> Self {
        value.map_or(CellValue::Empty, CellValue::number)
    }

    /// Numeric view; text is parsed
    pub fn numeric(&self) -> Numeric {
        match self {
            CellValue::Empty => Numeric::Unparsable,
            CellValue::Number(v) => Numeric::from_f64(*v),
            CellValue::Text(s) => Numeric::parse(s),
        }
    }

    /// Integer view; numbers are truncated, text must be an integer literal
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Number(v) if v.is_finite() => Some(v.trunc() as i64),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            CellValue::Number(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::number(value)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        CellValue::from_opt(value)
    }
}

/// Solid background fills used by the reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    LightGreen,
    LightRed,
}

impl Fill {
    pub fn hex(self) -> &'static str {
        match self {
            Fill::LightGreen => "#C6EFCE",
            Fill::LightRed => "#FFC7CE",
        }
    }
}

/// Cell styling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub fill: Option<Fill>,
    pub align_right: bool,
    /// `0.00` number format
    pub two_decimals: bool,
}

impl Style {
    pub fn right_aligned() -> Self {
        Self {
            align_right: true,
            ..Self::default()
        }
    }

    fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    fn to_format(self) -> Option<Format> {
        if self.is_plain() {
            return None;
        }
        let mut format = Format::new();
        if let Some(fill) = self.fill {
            format = format.set_background_color(fill.hex());
        }
        if self.align_right {
            format = format.set_align(FormatAlign::Right);
        }
        if self.two_decimals {
            format = format.set_num_format("0.00");
        }
        Some(format)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: Style,
}

/// One worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    freeze: Option<(u32, u16)>,
    widths: BTreeMap<u16, f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            freeze: None,
            widths: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write a value, keeping any style already on the cell
    pub fn write(&mut self, row: u32, col: u16, value: impl Into<CellValue>) {
        self.cells.entry((row, col)).or_default().value = value.into();
    }

    pub fn write_styled(&mut self, row: u32, col: u16, value: impl Into<CellValue>, style: Style) {
        self.cells.insert(
            (row, col),
            Cell {
                value: value.into(),
                style,
            },
        );
    }

    /// Restyle a cell without touching its value
    pub fn update_style(&mut self, row: u32, col: u16, update: impl FnOnce(&mut Style)) {
        update(&mut self.cells.entry((row, col)).or_default().style);
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: u32, col: u16) -> CellValue {
        self.cell(row, col).map(|c| c.value.clone()).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn style(&self, row: u32, col: u16) -> Style {
        self.cell(row, col).map(|c| c.style).unwrap_or_default()
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u16), &Cell)> {
        self.cells.iter().map(|(&pos, cell)| (pos, cell))
    }

    /// Number of rows up to the last used one
    pub fn row_count(&self) -> u32 {
        self.cells.keys().map(|&(r, _)| r + 1).max().unwrap_or(0)
    }

    /// Number of columns up to the last used one
    pub fn column_count(&self) -> u16 {
        self.cells.keys().map(|&(_, c)| c + 1).max().unwrap_or(0)
    }

    /// Freeze rows above `row` and columns left of `col`
    pub fn set_freeze_panes(&mut self, row: u32, col: u16) {
        self.freeze = Some((row, col));
    }

    #[cfg(test)]
    pub fn freeze_panes(&self) -> Option<(u32, u16)> {
        self.freeze
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.widths.insert(col, width);
    }

    #[cfg(test)]
    pub fn column_width(&self, col: u16) -> Option<f64> {
        self.widths.get(&col).copied()
    }

    fn render(&self, worksheet: &mut rust_xlsxwriter::Worksheet) -> Result<()> {
        worksheet.set_name(&self.name)?;

        for (&(row, col), cell) in &self.cells {
            match (&cell.value, cell.style.to_format()) {
                (CellValue::Empty, None) => {}
                (CellValue::Empty, Some(format)) => {
                    worksheet.write_blank(row, col, &format)?;
                }
                (CellValue::Number(n), None) => {
                    worksheet.write_number(row, col, *n)?;
                }
                (CellValue::Number(n), Some(format)) => {
                    worksheet.write_number_with_format(row, col, *n, &format)?;
                }
                (CellValue::Text(s), None) => {
                    worksheet.write_string(row, col, s)?;
                }
                (CellValue::Text(s), Some(format)) => {
                    worksheet.write_string_with_format(row, col, s, &format)?;
                }
            }
        }

        if let Some((row, col)) = self.freeze {
            worksheet.set_freeze_panes(row, col)?;
        }
        for (&col, &width) in &self.widths {
            worksheet.set_column_width(col, width)?;
        }
        Ok(())
    }
}

/// An ordered collection of sheets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    #[cfg(test)]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Sanitized `name`, suffixed with `~2`, `~3`, ... when a sheet of that
    /// name already exists (Excel compares names case-insensitively)
    pub fn unique_sheet_name(&self, name: &str) -> String {
        let base = sanitize_sheet_name(name);
        let taken = |candidate: &str| {
            self.sheets
                .iter()
                .any(|s| s.name.to_lowercase() == candidate.to_lowercase())
        };
        if !taken(&base) {
            return base;
        }
        (2..)
            .map(|n| {
                let suffix = format!("~{}", n);
                let keep = MAX_SHEET_NAME_CHARS - suffix.chars().count();
                let stem: String = base.chars().take(keep).collect();
                format!("{}{}", stem, suffix)
            })
            .find(|candidate| !taken(candidate))
            .unwrap_or(base)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Render every sheet and write the `.xlsx` file
    pub fn save(&self, path: &Path) -> Result<()> {
        log::debug!("Writing {} sheet(s) to {:?}", self.sheets.len(), path);

        let mut workbook = rust_xlsxwriter::Workbook::new();
        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            sheet.render(worksheet)?;
        }
        workbook.save(path)?;
        Ok(())
    }
}
