// Primitives for reading CSV files.

use crate::clash::{io_common::Dataset, *};

pub fn read_csv_dataset(path: &str) -> ClashResult<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        // Rows with missing trailing cells are accepted, the cells are treated as empty.
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    debug!("read_csv_dataset: header: {:?}", header);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let row: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        debug!("read_csv_dataset: lineno: {:?} row: {:?}", lineno, row);
        rows.push(row);
    }
    if header.is_empty() {
        return Err(ClashError::EmptyDataset {
            path: path.to_string(),
        });
    }
    Ok(Dataset { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_quoted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("countries.csv");
        let mut f = std::fs::File::create(&p).unwrap();
        writeln!(f, "Country,gdp,military,literacy,birth,death").unwrap();
        writeln!(f, "France,\"3,764\",1.9,99,10.9,9.9").unwrap();
        writeln!(f, "Chad,,,22.3").unwrap();
        drop(f);

        let ds = read_csv_dataset(p.to_str().unwrap()).unwrap();
        assert_eq!(ds.header.len(), 6);
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.rows[0][1], "3,764");
        assert_eq!(ds.rows[1], vec!["Chad", "", "", "22.3"]);
    }

    #[test]
    fn missing_file() {
        let res = read_csv_dataset("/nonexistent/countries.csv");
        assert!(matches!(res, Err(ClashError::CsvOpen { .. })));
    }
}
