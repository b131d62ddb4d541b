use crate::error::{PanelizeError, Result};
use crate::model::CatalogEntry;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Quantity column names, compared after normalisation
const QUANTITY_HEADERS: &[&str] = &[
    "qty",
    "panelqty",
    "panelnum",
    "numpanels",
    "#ofpanels",
    "#panels",
    "numberofpanels",
];

/// Which catalog a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    /// Widths only; counts are ignored
    Wishlist,
    /// Widths with on-hand quantities
    Inventory,
}

/// Column offsets found in the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CatalogColumns {
    width: usize,
    height: Option<usize>,
    quantity: Option<usize>,
}

impl CatalogColumns {
    fn locate(header: &StringRecord, kind: CatalogKind) -> Option<Self> {
        let width = header.iter().position(is_width_header)?;
        let height = header.iter().position(is_height_header);
        let quantity = match kind {
            CatalogKind::Wishlist => None,
            CatalogKind::Inventory => header.iter().position(is_quantity_header),
        };

        Some(Self {
            width,
            height,
            quantity,
        })
    }
}

/// Load a panel catalog from a `.csv` file
pub fn load_catalog(path: &Path, kind: CatalogKind) -> Result<Vec<CatalogEntry>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(PanelizeError::InvalidCatalog(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let entries = parse_catalog(file, kind, path)?;

    info!(
        "Loaded {} panel widths from {} ({:?})",
        entries.len(),
        path.display(),
        kind
    );
    Ok(entries)
}

/// Parse catalog CSV content. The header row is the first row naming a
/// width column; rows above it are ignored. `source` is only used in errors.
pub fn parse_catalog<R: Read>(
    reader: R,
    kind: CatalogKind,
    source: &Path,
) -> Result<Vec<CatalogEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut columns: Option<CatalogColumns> = None;
    let mut entries = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping unreadable catalog row: {}", e);
                continue;
            }
        };

        let Some(cols) = columns else {
            columns = CatalogColumns::locate(&record, kind);
            if let Some(cols) = columns {
                debug!("Catalog columns in {}: {:?}", source.display(), cols);
            }
            continue;
        };

        if let Some(entry) = parse_row(&record, &cols) {
            entries.push(entry);
        }
    }

    if columns.is_none() {
        return Err(PanelizeError::MissingWidthColumn(source.to_path_buf()));
    }

    Ok(entries)
}

fn parse_row(record: &StringRecord, cols: &CatalogColumns) -> Option<CatalogEntry> {
    let raw_width = record.get(cols.width).filter(|field| !field.is_empty())?;
    let width = match raw_width.parse::<f64>() {
        Ok(width) if width.is_finite() && width > 0.0 => width,
        Ok(_) => {
            debug!("Skipping non-positive panel width {}", raw_width);
            return None;
        }
        Err(_) => {
            debug!("Skipping non-numeric panel width {:?}", raw_width);
            return None;
        }
    };

    let height = cols
        .height
        .and_then(|col| record.get(col))
        .and_then(|field| field.parse::<f64>().ok());
    let count = cols
        .quantity
        .and_then(|col| record.get(col))
        .and_then(|field| field.parse::<u32>().ok());

    Some(CatalogEntry {
        width,
        height,
        count,
    })
}

fn normalize_header(field: &str) -> String {
    field
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_width_header(field: &str) -> bool {
    normalize_header(field).contains("width")
}

fn is_height_header(field: &str) -> bool {
    normalize_header(field).contains("height")
}

fn is_quantity_header(field: &str) -> bool {
    let normalized = normalize_header(field);
    QUANTITY_HEADERS.iter().any(|name| normalized.contains(name))
}
