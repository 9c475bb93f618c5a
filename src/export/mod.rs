// Replay Keeper - Export
// Writes the visible replay set as CSV (table column order) or JSON.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::schema::Replay;
use crate::error::{CatalogError, Result};

pub const CSV_HEADERS: [&str; 9] = [
    "File Name", "Timestamp", "UFC", "Recorded", "Video Link",
    "Description", "Date Added", "Tags", "Renamed File",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row<W: Write>(writer: &mut W, fields: &[&str]) -> Result<()> {
    let line = fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",");
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\r\n")?;
    Ok(())
}

pub fn export_csv<W: Write>(writer: &mut W, records: &[Replay]) -> Result<()> {
    csv_row(writer, &CSV_HEADERS)?;
    for r in records {
        let recorded = if r.recorded { "Yes" } else { "No" };
        csv_row(writer, &[
            r.file_name.as_str(),
            r.timestamp.as_str(),
            r.ufc.as_str(),
            recorded,
            r.video_link.as_str(),
            r.extended_desc.as_str(),
            r.date_added.as_str(),
            r.tags.as_str(),
            r.renamed_filename.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_json<W: Write>(writer: &mut W, records: &[Replay]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write `records` to `output_path` (temp file then rename). Returns the row count.
pub fn export_to_file(output_path: &Path, format: ExportFormat, records: &[Replay]) -> Result<usize> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = output_path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CatalogError::Validation(format!("bad export path {}", output_path.display())))?;
    let tmp_path = output_path.with_file_name(format!(".{}.tmp", file_name));

    let written = (|| -> Result<()> {
        let file = std::fs::File::create(&tmp_path)?;
        let mut out = std::io::BufWriter::new(file);
        match format {
            ExportFormat::Csv => export_csv(&mut out, records)?,
            ExportFormat::Json => export_json(&mut out, records)?,
        }
        out.into_inner()
            .map_err(|e| CatalogError::Io(e.into_error()))?
            .sync_all()?;
        Ok(())
    })();

    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, output_path)
        .map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            CatalogError::Io(e)
        })?;

    log::info!("Exported {} replays to {}", records.len(), output_path.display());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<Replay> {
        vec![
            Replay {
                id: 1,
                ufc: "UFC-0001".to_string(),
                file_name: "ryu, ken".to_string(),
                renamed_filename: None,
                timestamp: "00:42".to_string(),
                video_link: "https://example.com/a".to_string(),
                extended_desc: "He said \"hadouken\"".to_string(),
                tags: "ranked".to_string(),
                recorded: true,
                date_added: "2026-01-02 03:04:05".to_string(),
            },
        ]
    }

    #[test]
    fn test_csv_quotes_fields() {
        let mut out = Vec::new();
        export_csv(&mut out, &sample()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();

        assert_eq!(lines[0], "File Name,Timestamp,UFC,Recorded,Video Link,Description,Date Added,Tags,Renamed File");
        assert_eq!(
            lines[1],
            "\"ryu, ken\",00:42,UFC-0001,Yes,https://example.com/a,\"He said \"\"hadouken\"\"\",2026-01-02 03:04:05,ranked,"
        );
    }

    #[test]
    fn test_json_is_an_array_of_replays() {
        let mut out = Vec::new();
        export_json(&mut out, &sample()).unwrap();
        let parsed: Vec<Replay> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_export_to_file_and_format_detection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("replays.csv");
        assert_eq!(ExportFormat::from_path(&path), Some(ExportFormat::Csv));

        let count = export_to_file(&path, ExportFormat::Csv, &sample()).unwrap();
        assert_eq!(count, 1);
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("File Name,"));
        assert!(!dir.path().join("out").join(".replays.csv.tmp").exists());
    }
}
