//! Dataset ingestion.
//!
//! Reads the marketplace CSV export into typed [`YachtRecord`]s. The header
//! row is validated up front: a missing column is a configuration error that
//! names every absent column, while a missing or unparseable *value* simply
//! becomes `None`.
//!
//! Canonical headers are the camelCase names of the `yachts` table
//! (`summerLowSeasonPrice`, `baseMarina`, ...). The snake_case names written
//! by the cleaning scripts (`summer_low_season_price_per_day_$`,
//! `base_marina`, ...) are accepted as aliases.

use crate::record::{SeasonalPrices, YachtRecord};
use berth_core::{Error, Result};
use csv::StringRecord;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

// ============================================================================
// Schema
// ============================================================================

/// A column of the yacht dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    Type,
    Guests,
    Cabins,
    Crew,
    Length,
    Year,
    Rating,
    SummerLowPrice,
    SummerHighPrice,
    WinterLowPrice,
    WinterHighPrice,
    BaseMarina,
    Country,
}

impl Field {
    /// Every column the loader understands.
    pub const ALL: [Field; 15] = [
        Field::Id,
        Field::Name,
        Field::Type,
        Field::Guests,
        Field::Cabins,
        Field::Crew,
        Field::Length,
        Field::Year,
        Field::Rating,
        Field::SummerLowPrice,
        Field::SummerHighPrice,
        Field::WinterLowPrice,
        Field::WinterHighPrice,
        Field::BaseMarina,
        Field::Country,
    ];

    /// Columns that must be present in the header.
    ///
    /// `country` is handled separately: it may be replaced by `baseMarina`.
    pub const REQUIRED: [Field; 11] = [
        Field::Guests,
        Field::Cabins,
        Field::Crew,
        Field::Length,
        Field::Year,
        Field::Rating,
        Field::SummerLowPrice,
        Field::SummerHighPrice,
        Field::WinterLowPrice,
        Field::WinterHighPrice,
        Field::Type,
    ];

    /// Canonical header name.
    pub fn canonical(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Type => "type",
            Field::Guests => "guests",
            Field::Cabins => "cabins",
            Field::Crew => "crew",
            Field::Length => "length",
            Field::Year => "year",
            Field::Rating => "rating",
            Field::SummerLowPrice => "summerLowSeasonPrice",
            Field::SummerHighPrice => "summerHighSeasonPrice",
            Field::WinterLowPrice => "winterLowSeasonPrice",
            Field::WinterHighPrice => "winterHighSeasonPrice",
            Field::BaseMarina => "baseMarina",
            Field::Country => "country",
        }
    }

    /// Alternative header names accepted for this column.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::SummerLowPrice => &[
                "summer_low_season_price_per_day_$",
                "summer_low_season_price",
            ],
            Field::SummerHighPrice => &[
                "summer_high_season_price_per_day_$",
                "summer_high_season_price",
            ],
            Field::WinterLowPrice => &[
                "winter_low_season_price_per_day_$",
                "winter_low_season_price",
            ],
            Field::WinterHighPrice => &[
                "winter_high_season_price_per_day_$",
                "winter_high_season_price",
            ],
            Field::BaseMarina => &["base_marina", "Base Marina"],
            _ => &[],
        }
    }

    fn matches(self, header: &str) -> bool {
        let header = header.trim();
        header.eq_ignore_ascii_case(self.canonical())
            || self.aliases().iter().any(|a| header.eq_ignore_ascii_case(a))
    }
}

/// Header positions resolved against the schema.
#[derive(Debug, Clone)]
struct ColumnMap {
    positions: HashMap<Field, usize>,
}

impl ColumnMap {
    /// Resolve header positions, failing if required columns are absent.
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut positions = HashMap::new();
        for field in Field::ALL {
            if let Some(pos) = headers.iter().position(|h| field.matches(h)) {
                positions.insert(field, pos);
            }
        }

        let mut missing: Vec<&str> = Field::REQUIRED
            .iter()
            .filter(|f| !positions.contains_key(*f))
            .map(|f| f.canonical())
            .collect();
        if !positions.contains_key(&Field::Country) && !positions.contains_key(&Field::BaseMarina)
        {
            missing.push("country (or baseMarina)");
        }

        if !missing.is_empty() {
            return Err(Error::config(format!(
                "Dataset is missing required columns: {}. Available columns: {:?}",
                missing.join(", "),
                headers.iter().collect::<Vec<_>>()
            )));
        }

        Ok(Self { positions })
    }

    fn has(&self, field: Field) -> bool {
        self.positions.contains_key(&field)
    }

    /// Raw cell text, `None` if the column is absent or the cell is a null marker.
    fn text<'r>(&self, row: &'r StringRecord, field: Field) -> Option<&'r str> {
        let value = row.get(*self.positions.get(&field)?)?.trim();
        if is_null_marker(value) {
            None
        } else {
            Some(value)
        }
    }

    fn string(&self, row: &StringRecord, field: Field) -> Option<String> {
        self.text(row, field).map(str::to_string)
    }

    fn number(&self, row: &StringRecord, field: Field) -> Option<f64> {
        self.text(row, field).and_then(parse_number)
    }

    fn count(&self, row: &StringRecord, field: Field) -> Option<u32> {
        self.number(row, field)
            .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
            .map(|n| n.round() as u32)
    }

    fn year(&self, row: &StringRecord, field: Field) -> Option<i32> {
        self.number(row, field)
            .filter(|n| n.abs() <= f64::from(i32::MAX))
            .map(|n| n.round() as i32)
    }
}

/// Cell values treated as missing, following common dataframe exports.
fn is_null_marker(value: &str) -> bool {
    matches!(
        value,
        "" | "nan" | "NaN" | "NAN" | "NA" | "N/A" | "null" | "NULL" | "None" | "<NA>"
    )
}

/// Lenient numeric coercion: anything unparseable or non-finite is missing.
fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

// ============================================================================
// Dataset
// ============================================================================

/// The full collection of yacht records fed to the recommender.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<YachtRecord>,
    has_identifiers: bool,
}

impl Dataset {
    /// Build a dataset from in-memory records.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if an identifier is empty or duplicated.
    pub fn from_records(records: Vec<YachtRecord>) -> Result<Self> {
        validate_identifiers(&records)?;
        Ok(Self {
            records,
            has_identifiers: true,
        })
    }

    /// Load a dataset from a CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io_with_path(e, path))?;
        let dataset = Self::from_reader(file)?;
        log::info!("Loaded {} yachts from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Load a dataset from any CSV reader.
    ///
    /// Without an `id` column, the zero-based row position becomes the
    /// identifier.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| Error::parse(format!("Failed to read CSV headers: {e}")))?
            .clone();
        let columns = ColumnMap::from_headers(&headers)?;
        let has_identifiers = columns.has(Field::Id);
        if !has_identifiers {
            log::debug!("No id column; using row positions as identifiers");
        }

        let mut records = Vec::new();
        for (position, row) in reader.records().enumerate() {
            // Header is line 1.
            let row = row.map_err(|e| {
                Error::parse(format!("Failed to read CSV line {}: {e}", position + 2))
            })?;
            records.push(parse_row(&columns, &row, position, has_identifiers)?);
        }

        validate_identifiers(&records)?;
        Ok(Self {
            records,
            has_identifiers,
        })
    }

    /// All records in input order.
    pub fn records(&self) -> &[YachtRecord] {
        &self.records
    }

    /// Consume the dataset, returning its records.
    pub fn into_records(self) -> Vec<YachtRecord> {
        self.records
    }

    /// Whether identifiers came from an id column (as opposed to row positions).
    pub fn has_identifiers(&self) -> bool {
        self.has_identifiers
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identifiers in input order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }
}

fn parse_row(
    columns: &ColumnMap,
    row: &StringRecord,
    position: usize,
    has_identifiers: bool,
) -> Result<YachtRecord> {
    let id = if has_identifiers {
        columns.string(row, Field::Id).ok_or_else(|| {
            Error::invalid_data(format!("Empty id on data row {position}"))
        })?
    } else {
        position.to_string()
    };

    Ok(YachtRecord {
        id,
        name: columns.string(row, Field::Name),
        yacht_type: columns.string(row, Field::Type),
        guests: columns.count(row, Field::Guests),
        cabins: columns.count(row, Field::Cabins),
        crew: columns.count(row, Field::Crew),
        length: columns.number(row, Field::Length),
        year: columns.year(row, Field::Year),
        rating: columns.number(row, Field::Rating),
        prices: SeasonalPrices::new(
            columns.number(row, Field::SummerLowPrice),
            columns.number(row, Field::SummerHighPrice),
            columns.number(row, Field::WinterLowPrice),
            columns.number(row, Field::WinterHighPrice),
        ),
        base_marina: columns.string(row, Field::BaseMarina),
        country: columns.string(row, Field::Country),
    })
}

fn validate_identifiers(records: &[YachtRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if record.id.trim().is_empty() {
            return Err(Error::invalid_data("Yacht identifiers must not be empty"));
        }
        if !seen.insert(record.id.as_str()) {
            return Err(Error::invalid_data(format!(
                "Duplicate yacht identifier: {}",
                record.id
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
