//! Export the cleaned dataset to CSV.
//!
//! UTF-8, comma-separated, one header row with the schema's column names
//! (source order after renaming, then `month`, `year`). Missing cells are empty.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{CleanDataset, Year};
use crate::error::AppError;

/// Default download name for a given selector year.
pub fn export_file_name(year: Year) -> PathBuf {
    PathBuf::from(format!("compras_publicas_{year}.csv"))
}

/// Write the dataset as CSV into any writer.
pub fn write_csv<W: Write>(writer: W, dataset: &CleanDataset) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(dataset.schema.header())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for record in &dataset.records {
        wtr.write_record(dataset.row_text(record))
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// CSV bytes (UTF-8), e.g. for an in-memory download.
pub fn to_csv_bytes(dataset: &CleanDataset) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, dataset)?;
    Ok(buf)
}

/// Write the dataset to a CSV file.
pub fn write_csv_file(path: &Path, dataset: &CleanDataset) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_csv(file, dataset)?;
    info!(path = %path.display(), rows = dataset.len(), "exported CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::normalize;
    use crate::domain::RawTable;

    fn dataset(body: &str) -> CleanDataset {
        normalize(&RawTable::from_json_str(body).unwrap())
    }

    #[test]
    fn csv_has_schema_header_and_empty_missing_cells() {
        let ds = dataset(
            r#"[{"province":"AZUAY","type":"Licitación","amount":"100","date":"2022-03-01","ocid":"ocds-9"},
                {"province":"CAÑAR","type":"Cotización","amount":12.5,"date":"??"}]"#,
        );
        let text = String::from_utf8(to_csv_bytes(&ds).unwrap()).unwrap();
        let expected = concat!(
            "region,internal_type,total,date,ocid,month,year\n",
            "AZUAY,Licitación,100.0,2022-03-01,ocds-9,3,2022\n",
            "CAÑAR,Cotización,12.5,,,,\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let ds = dataset(r#"[{"amount":1,"buyer":"GAD Municipal, Cuenca"}]"#);
        let text = String::from_utf8(to_csv_bytes(&ds).unwrap()).unwrap();
        assert_eq!(text, "total,buyer\n1.0,\"GAD Municipal, Cuenca\"\n");
    }

    #[test]
    fn default_file_name_uses_year() {
        let year = Year::new(2022).unwrap();
        assert_eq!(export_file_name(year), PathBuf::from("compras_publicas_2022.csv"));
    }

    #[test]
    fn writes_file_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let ds = dataset(r#"[{"amount":"3"}]"#);
        write_csv_file(&path, &ds).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "total\n3.0\n");
    }
}
