//! Load a saved API payload from disk.
//!
//! The file holds the same JSON the endpoint returns (an array of objects), so
//! a response can be captured once and re-analysed offline.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::domain::RawTable;
use crate::error::AppError;

pub fn read_raw_json(path: &Path) -> Result<RawTable, AppError> {
    let body = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to open input JSON '{}': {e}", path.display())))?;
    let table = RawTable::from_json_str(&body)
        .map_err(|e| AppError::new(2, format!("Invalid input JSON '{}': {e}", path.display())))?;
    info!(path = %path.display(), rows = table.len(), "loaded saved payload");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_saved_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resp.json");
        fs::write(&path, r#"[{"province":"NAPO","amount":"4"}]"#).unwrap();
        let table = read_raw_json(&path).unwrap();
        assert_eq!(table.columns, vec!["province", "amount"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = read_raw_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
