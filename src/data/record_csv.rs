use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{Reader, Writer};

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::models::{RECORD_HEADER, SummaryRecord};

/// Write records under the fixed `Window_ID,Entropy,Volatility,Market_Condition` header.
pub fn write_records<W: Write>(writer: W, records: &[SummaryRecord]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    // Written explicitly so an empty run still carries the header
    writer.write_record(RECORD_HEADER)?;
    for record in records {
        writer.write_record([
            record.window_id.to_string(),
            record.entropy.to_string(),
            record.volatility.to_string(),
            record.condition.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read records back, checking the header and that window ids run 0, 1, 2, ...
pub fn read_records<R: Read>(reader: R) -> Result<Vec<SummaryRecord>> {
    let mut reader = Reader::from_reader(reader);

    let headers = reader.headers()?.clone();
    let found: Vec<&str> = headers.iter().map(str::trim).collect();
    if found != RECORD_HEADER {
        bail!(
            "Unexpected record header {:?}, expected {:?}",
            found,
            RECORD_HEADER
        );
    }

    let mut records = Vec::new();
    for (expected_id, result) in reader.deserialize::<SummaryRecord>().enumerate() {
        let record = result.context(format!("Failed to parse record row {}", expected_id))?;
        if record.window_id != expected_id {
            bail!(
                "Window_ID out of sequence: found {} where {} was expected",
                record.window_id,
                expected_id
            );
        }
        records.push(record);
    }
    Ok(records)
}

pub fn save_records(path: &Path, records: &[SummaryRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = File::create(path).context(format!("Failed to create file: {}", path.display()))?;
    write_records(file, records).context(format!("Failed to write records to: {}", path.display()))?;

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_serde {
        log::info!("Wrote {} records to {}", records.len(), path.display());
    }
    Ok(())
}

pub fn load_records(path: &Path) -> Result<Vec<SummaryRecord>> {
    let file = File::open(path).context(format!("Failed to open record file: {}", path.display()))?;
    read_records(file).context(format!("Failed to read records from: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MarketCondition;

    fn sample() -> Vec<SummaryRecord> {
        vec![
            SummaryRecord::new(0, 0.0, 0.0, MarketCondition::Bear),
            SummaryRecord::new(1, 1.0, 0.25, MarketCondition::Bull),
            SummaryRecord::new(2, 1.5, 0.5, MarketCondition::HighVolatility),
        ]
    }

    #[test]
    fn test_header_and_rows_are_exact() {
        let mut buffer = Vec::new();
        write_records(&mut buffer, &sample()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Window_ID,Entropy,Volatility,Market_Condition");
        assert_eq!(lines[1], "0,0,0,Bear");
        assert_eq!(lines[2], "1,1,0.25,Bull");
        assert_eq!(lines[3], "2,1.5,0.5,HighVolatility");
    }

    #[test]
    fn test_written_records_read_back() {
        let mut buffer = Vec::new();
        write_records(&mut buffer, &sample()).unwrap();
        assert_eq!(read_records(buffer.as_slice()).unwrap(), sample());
    }

    #[test]
    fn test_empty_run_keeps_header() {
        let mut buffer = Vec::new();
        write_records(&mut buffer, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "Window_ID,Entropy,Volatility,Market_Condition\n"
        );
    }

    #[test]
    fn test_gapped_ids_rejected() {
        let data = "Window_ID,Entropy,Volatility,Market_Condition\n0,0.1,0.2,Bull\n2,0.1,0.2,Bull\n";
        assert!(read_records(data.as_bytes()).is_err());

        let data = "Window_ID,Entropy,Volatility,Market_Condition\n1,0.1,0.2,Bull\n";
        assert!(read_records(data.as_bytes()).is_err(), "ids must start at 0");
    }

    #[test]
    fn test_wrong_header_or_label_rejected() {
        let data = "id,entropy,volatility,condition\n0,0.1,0.2,Bull\n";
        assert!(read_records(data.as_bytes()).is_err());

        let data = "Window_ID,Entropy,Volatility,Market_Condition\n0,0.1,0.2,Sideways\n";
        assert!(read_records(data.as_bytes()).is_err());
    }
}
