//! Wide CSV export
//!
//! Each record becomes one row. Fixed fields come first, then one column
//! per role slot and contact field (`President 1 Name`, `Board Member 2
//! Email`, ...), sorted by name across the whole export.

use super::parse::{HoaRecord, Role};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File written into the chosen save directory
pub const EXPORT_FILE_NAME: &str = "utah_hoa_registry_data.csv";

pub const FIXED_COLUMNS: [&str; 9] = [
    "Entity ID",
    "HOA Name",
    "DBA",
    "Registration #",
    "Registration Type",
    "Status",
    "Expires",
    "Location",
    "Mailing Address",
];

/// One record as column name -> value
pub fn flatten(record: &HoaRecord) -> BTreeMap<String, String> {
    let fixed = [
        record.entity_id.to_string(),
        record.name.clone(),
        record.dba.clone(),
        record.registration.clone(),
        record.registration_type.clone(),
        record.status.clone(),
        record.expires.clone(),
        record.location.clone(),
        record.mailing_address.clone(),
    ];
    let mut row: BTreeMap<String, String> = FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .zip(fixed)
        .collect();

    for role in Role::ALL {
        for (i, contact) in record.contacts(role).iter().enumerate() {
            let prefix = format!("{} {}", role.label(), i + 1);
            row.insert(format!("{prefix} Name"), contact.name.clone());
            row.insert(format!("{prefix} Phone"), contact.phone.clone());
            row.insert(format!("{prefix} Email"), contact.email.clone());
            row.insert(format!("{prefix} Address"), contact.address.clone());
        }
    }
    row
}

/// Header for a set of flattened rows
pub fn columns(rows: &[BTreeMap<String, String>]) -> Vec<String> {
    let dynamic: BTreeSet<&String> = rows
        .iter()
        .flat_map(|r| r.keys())
        .filter(|k| !FIXED_COLUMNS.contains(&k.as_str()))
        .collect();

    FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(dynamic.into_iter().cloned())
        .collect()
}

/// Write `records` as CSV. Cells a record has no value for are left empty.
pub fn write_csv<W: Write>(records: &[HoaRecord], out: W) -> Result<usize> {
    let rows: Vec<_> = records.iter().map(flatten).collect();
    let header = columns(&rows);

    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(&header)
        .context("Failed to write CSV header")?;
    for row in &rows {
        writer
            .write_record(
                header
                    .iter()
                    .map(|c| row.get(c).map(String::as_str).unwrap_or("")),
            )
            .context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV output")?;
    Ok(rows.len())
}

/// Write the export file into `dir`, creating the directory if needed
pub fn export_to_dir(records: &[HoaRecord], dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let path = dir.join(EXPORT_FILE_NAME);
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_csv(records, file)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::parse::Contact;

    fn contact(name: &str) -> Contact {
        Contact {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<HoaRecord> {
        vec![
            HoaRecord {
                entity_id: 1001,
                name: "Aspen Ridge".into(),
                presidents: vec![contact("Jane Smith")],
                board_members: vec![contact("Tom Jones"), contact("Maria Lopez")],
                ..Default::default()
            },
            HoaRecord {
                entity_id: 1002,
                name: "Canyon View".into(),
                managers: vec![contact("Valley HOA Services")],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn fixed_columns_lead_then_sorted_role_columns() {
        let rows: Vec<_> = sample().iter().map(flatten).collect();
        let header = columns(&rows);

        assert_eq!(&header[..9], &FIXED_COLUMNS.map(String::from)[..]);
        let dynamic = &header[9..];
        let mut sorted = dynamic.to_vec();
        sorted.sort();
        assert_eq!(dynamic, &sorted[..]);
        assert!(dynamic.contains(&"Board Member 2 Name".to_string()));
        assert!(dynamic.contains(&"Manager 1 Email".to_string()));
        assert_eq!(header.len(), 9 + 4 * 4);
    }

    #[test]
    fn csv_leaves_missing_cells_empty() {
        let mut out = Vec::new();
        let written = write_csv(&sample(), &mut out).unwrap();
        assert_eq!(written, 2);

        let mut reader = csv::Reader::from_reader(out.as_slice());
        let header = reader.headers().unwrap().clone();
        let manager_col = header.iter().position(|h| h == "Manager 1 Name").unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(&rows[0][0], "1001");
        assert_eq!(&rows[0][manager_col], "");
        assert_eq!(&rows[1][manager_col], "Valley HOA Services");
    }

    #[test]
    fn export_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_dir(&sample(), &dir.path().join("out")).unwrap();
        assert_eq!(path.file_name().unwrap(), EXPORT_FILE_NAME);
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Entity ID,HOA Name,DBA,"));
    }
}
