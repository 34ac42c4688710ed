//! CSV codec for the stock table and the single-column registry tables.
//!
//! Decoding normalizes whatever layout older files have into the canonical
//! column set; encoding always writes the canonical layout.

use pantry_inventory::{AddedAt, StockRow, Unit};

/// Canonical stock table header, in order.
pub const STOCK_COLUMNS: [&str; 7] = [
    "Nom",
    "Catégorie",
    "Nombre",
    "Unité",
    "Lieu",
    "Date",
    "Contenant",
];

/// Header of registry tables.
pub const NAME_COLUMN: &str = "Nom";

const NAME: usize = 0;
const CATEGORY: usize = 1;
const QUANTITY: usize = 2;
const UNIT: usize = 3;
const LOCATION: usize = 4;
const DATE: usize = 5;
const CONTAINER: usize = 6;

/// Normalize a header cell: first letter upper-case, the rest lower-case,
/// with any casing of "catégorie" mapped to `Catégorie`.
pub fn normalize_header(raw: &str) -> String {
    let raw = raw.trim().trim_start_matches('\u{feff}');
    let lower = raw.to_lowercase();
    if lower == "catégorie" {
        return "Catégorie".to_string();
    }
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(bytes)
}

fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Decode a stock table into rows.
///
/// Unknown columns are dropped, a missing `Unité` column defaults every row
/// to `Portions`, other missing columns read as empty. Rows made only of
/// blank cells are skipped.
pub fn decode_stock(bytes: &[u8]) -> Result<Vec<StockRow>, csv::Error> {
    let mut rdr = reader(bytes);
    let headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();
    let columns: Vec<Option<usize>> = STOCK_COLUMNS
        .iter()
        .map(|name| column_index(&headers, name))
        .collect();
    if columns[UNIT].is_none() {
        tracing::debug!("stock table has no unit column, defaulting to {}", Unit::Portions);
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |field: usize| cell_at(&record, &columns, field);
        rows.push(StockRow {
            name: cell(NAME).to_string(),
            category: cell(CATEGORY).to_string(),
            quantity: parse_quantity(cell(QUANTITY)),
            unit: parse_unit(cell(UNIT)),
            location: cell(LOCATION).to_string(),
            added_at: AddedAt::from_raw(cell(DATE)),
            container: cell(CONTAINER).to_string(),
        });
    }
    Ok(rows)
}

fn cell_at<'r>(record: &'r csv::StringRecord, columns: &[Option<usize>], field: usize) -> &'r str {
    columns[field]
        .and_then(|idx| record.get(idx))
        .unwrap_or("")
}

/// Integer quantity; float text is truncated, anything else reads as zero.
fn parse_quantity(raw: &str) -> u32 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    if let Ok(n) = raw.parse::<u32>() {
        return n;
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f <= f64::from(u32::MAX) => f.trunc() as u32,
        _ => {
            tracing::warn!(quantity = raw, "unreadable quantity, using 0");
            0
        }
    }
}

/// Blank or unknown units fall back to `Portions`.
fn parse_unit(raw: &str) -> Unit {
    if raw.trim().is_empty() {
        return Unit::Portions;
    }
    raw.parse().unwrap_or_else(|_| {
        tracing::debug!(unit = raw, "unknown unit, using {}", Unit::Portions);
        Unit::Portions
    })
}

pub fn encode_stock(rows: &[StockRow]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(STOCK_COLUMNS)?;
    for row in rows {
        let quantity = row.quantity.to_string();
        wtr.write_record([
            row.name.as_str(),
            row.category.as_str(),
            quantity.as_str(),
            row.unit.as_str(),
            row.location.as_str(),
            row.added_at.as_str(),
            row.container.as_str(),
        ])?;
    }
    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

/// Decode a registry table. A file without a `Nom` column holds no names.
pub fn decode_names(bytes: &[u8]) -> Result<Vec<String>, csv::Error> {
    let mut rdr = reader(bytes);
    let headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();
    let Some(idx) = column_index(&headers, NAME_COLUMN) else {
        tracing::warn!("registry table has no {NAME_COLUMN} column");
        return Ok(Vec::new());
    };
    let mut names = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(name) = record.get(idx).filter(|n| !n.trim().is_empty()) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

pub fn encode_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([NAME_COLUMN])?;
    for name in names {
        wtr.write_record([name.as_ref()])?;
    }
    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL_HEADER: &str = "Nom,Catégorie,Nombre,Unité,Lieu,Date,Contenant";

    fn header_of(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .to_string()
    }

    #[test]
    fn header_normalization_capitalizes() {
        assert_eq!(normalize_header("nom"), "Nom");
        assert_eq!(normalize_header("LIEU"), "Lieu");
        assert_eq!(normalize_header("CATÉGORIE"), "Catégorie");
        assert_eq!(normalize_header("\u{feff}Nom "), "Nom");
        assert_eq!(normalize_header("unité"), "Unité");
    }

    #[test]
    fn full_table_decodes_all_fields() {
        let csv = format!(
            "{CANONICAL_HEADER}\nSoupe,Plat cuisiné,3,kg,Cuisine,2024-01-02 10:00:00,Pyrex\n"
        );
        let rows = decode_stock(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.name, "Soupe");
        assert_eq!(row.category, "Plat cuisiné");
        assert_eq!(row.quantity, 3);
        assert_eq!(row.unit, Unit::Kilograms);
        assert_eq!(row.location, "Cuisine");
        assert_eq!(row.added_at.as_str(), "2024-01-02 10:00:00");
        assert_eq!(row.container, "Pyrex");
    }

    #[test]
    fn legacy_table_without_unit_defaults_to_portions() {
        let csv = "Nom,Catégorie,Nombre,Lieu,Date,Contenant\nSoupe,Autre,2,Cuisine,,Pyrex\n";
        let rows = decode_stock(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].unit, Unit::Portions);
        assert_eq!(rows[0].quantity, 2);
        assert_eq!(rows[0].added_at.as_str(), "");
    }

    #[test]
    fn unknown_columns_are_dropped_and_missing_ones_empty() {
        let csv = "nom,Extra,nombre\nGlace,zzz,4\n";
        let rows = decode_stock(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].name, "Glace");
        assert_eq!(rows[0].quantity, 4);
        assert_eq!(rows[0].category, "");
        assert_eq!(rows[0].container, "");
        let encoded = encode_stock(&rows).unwrap();
        assert_eq!(header_of(&encoded), CANONICAL_HEADER);
        assert!(!String::from_utf8(encoded).unwrap().contains("zzz"));
    }

    #[test]
    fn quantities_tolerate_float_and_garbage() {
        assert_eq!(parse_quantity("3.0"), 3);
        assert_eq!(parse_quantity(" 7 "), 7);
        assert_eq!(parse_quantity(""), 0);
        assert_eq!(parse_quantity("beaucoup"), 0);
        assert_eq!(parse_quantity("-2"), 0);
    }

    #[test]
    fn full_partial_and_missing_unit_columns_share_one_shape() {
        let full = format!("{CANONICAL_HEADER}\nA,Autre,1,Portions,Cuisine,,Pyrex\n");
        let partial = format!("{CANONICAL_HEADER}\nA,Autre,1,,Cuisine,,Pyrex\n");
        let missing = "Nom,Catégorie,Nombre,Lieu,Date,Contenant\nA,Autre,1,Cuisine,,Pyrex\n";

        let encoded: Vec<Vec<u8>> = [full.as_str(), partial.as_str(), missing]
            .iter()
            .map(|csv| encode_stock(&decode_stock(csv.as_bytes()).unwrap()).unwrap())
            .collect();

        assert_eq!(header_of(&encoded[0]), CANONICAL_HEADER);
        assert_eq!(encoded[0], encoded[1]);
        assert_eq!(encoded[1], encoded[2]);
    }

    #[test]
    fn short_rows_and_blank_lines_are_tolerated() {
        let csv = format!("{CANONICAL_HEADER}\nPain,Autre\n,,,,,,\n");
        let rows = decode_stock(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Pain");
        assert_eq!(rows[0].location, "");
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let mut bytes = format!("{CANONICAL_HEADER}\n").into_bytes();
        bytes.extend_from_slice(&[0xff, 0xfe, b',', b'1', b'\n']);
        assert!(decode_stock(&bytes).is_err());
    }

    #[test]
    fn names_round_trip_and_skip_blanks() {
        let encoded = encode_names(&["Cuisine", "Buanderie"]).unwrap();
        assert_eq!(
            String::from_utf8(encoded.clone()).unwrap(),
            "Nom\nCuisine\nBuanderie\n"
        );
        assert_eq!(decode_names(&encoded).unwrap(), vec!["Cuisine", "Buanderie"]);
        assert_eq!(decode_names(b"Nom\n\nCave\n  \n").unwrap(), vec!["Cave"]);
        assert!(decode_names(b"Other\nx\n").unwrap().is_empty());
    }
}
