use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::clash::{io_common::Dataset, *};

pub fn read_xlsx_dataset(path: &str, worksheet_name: Option<&str>) -> ClashResult<Dataset> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyDatasetSnafu { path })?
        .iter()
        .map(|c| read_cell(c).trim().to_string())
        .collect();
    debug!("read_xlsx_dataset: header: {:?}", header);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let cells: Vec<String> = row.iter().map(read_cell).collect();
        debug!("read_xlsx_dataset: idx: {:?} row: {:?}", idx, cells);
        rows.push(cells);
    }
    Ok(Dataset { header, rows })
}

// All the cells are turned into text: the repository does the parsing.
fn read_cell(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => "".to_string(),
        _ => {
            warn!("read_xlsx_dataset: could not understand cell {:?}", cell);
            "".to_string()
        }
    }
}

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> ClashResult<calamine::Range<DataType>> {
    debug!(
        "read_xlsx_dataset: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                worksheet: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => Err(ClashError::EmptyDataset {
                path: path.to_string(),
            }),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_xlsx_dataset: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => {
                whatever!(
                    "{}: the workbook has {} worksheets, the worksheet name must be provided",
                    path,
                    all_worksheets.len()
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::path::Path;

    #[test]
    fn cells_as_text() {
        assert_eq!(read_cell(&DataType::String("99%".to_string())), "99%");
        assert_eq!(read_cell(&DataType::Float(10.5)), "10.5");
        assert_eq!(read_cell(&DataType::Int(42)), "42");
        assert_eq!(read_cell(&DataType::Empty), "");
    }

    // Writes a workbook with one worksheet per (name, rows) pair. Numeric cells
    // are written as numbers, the others as text.
    fn write_workbook(path: &Path, sheets: &[(&str, &[&[&str]])]) {
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    match cell.parse::<f64>() {
                        Ok(x) => worksheet.write_number(r as u32, c as u16, x).unwrap(),
                        Err(_) => worksheet.write_string(r as u32, c as u16, *cell).unwrap(),
                    };
                }
            }
        }
        workbook.save(path).unwrap();
    }

    const STATS: &[&[&str]] = &[
        &["Country", "gdp", "military", "literacy", "birth", "death"],
        &["Atlantia", "1000", "1.9%", "99", "10.5", "9"],
        &["Borduria", "500", "2.5", "80", "12", "6"],
    ];

    const NOTES: &[&[&str]] = &[&["Source", "factbook"]];

    #[test]
    fn single_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("countries.xlsx");
        write_workbook(&p, &[("Stats", STATS)]);
        let ds = read_xlsx_dataset(&p.display().to_string(), None).unwrap();
        assert_eq!(
            ds.header,
            vec!["Country", "gdp", "military", "literacy", "birth", "death"]
        );
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.rows[0], vec!["Atlantia", "1000", "1.9%", "99", "10.5", "9"]);
        assert_eq!(ds.rows[1][0], "Borduria");
        assert_eq!(ds.rows[1][2], "2.5");
    }

    #[test]
    fn named_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("countries.xlsx");
        write_workbook(&p, &[("Notes", NOTES), ("Stats", STATS)]);
        let path = p.display().to_string();

        let ds = read_xlsx_dataset(&path, Some("Stats")).unwrap();
        assert_eq!(ds.header[0], "Country");
        assert_eq!(ds.rows.len(), 2);
        let ds = read_xlsx_dataset(&path, Some("Notes")).unwrap();
        assert_eq!(ds.header, vec!["Source", "factbook"]);
        assert!(ds.rows.is_empty());

        assert!(matches!(
            read_xlsx_dataset(&path, Some("Sheet9")),
            Err(ClashError::MissingWorksheet { .. })
        ));
    }

    #[test]
    fn several_worksheets_need_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("countries.xlsx");
        write_workbook(&p, &[("Notes", NOTES), ("Stats", STATS)]);
        let res = read_xlsx_dataset(&p.display().to_string(), None);
        assert!(matches!(res, Err(ClashError::Whatever { .. })));
    }

    #[test]
    fn missing_workbook() {
        let res = read_xlsx_dataset("/nonexistent/countries.xlsx", None);
        assert!(matches!(res, Err(ClashError::OpeningExcel { .. })));
    }
}
