// Primitives for reading Excel workbooks, as exported by the online form services.

use calamine::DataType;

use crate::survey::{
    io_common::{CellValue, SurveyLayout},
    *,
};

pub fn read_xlsx_survey(path: String, source: &SurveySource) -> BSurveyResult<ParsedSurvey> {
    let wrange = get_range(&path, source)?;

    let mut rows = wrange.rows();
    let header: Vec<Option<String>> = rows
        .next()
        .context(EmptySurveySnafu { path: path.clone() })?
        .iter()
        .map(|dt| match dt {
            DataType::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect();
    debug!("read_xlsx_survey: header: {:?}", header);
    let layout = SurveyLayout::from_header(&header, source)?;

    let mut responses: Vec<ParsedResponse> = Vec::new();
    for (idx, row) in rows.enumerate() {
        // Same line numbers as the spreadsheet, the header being the first line.
        let lineno = idx + 2;
        debug!("read_xlsx_survey: lineno: {:?} row: {:?}", lineno, row);
        let mut cells: Vec<CellValue> = Vec::new();
        for dt in row.iter() {
            let cell = match dt {
                DataType::Empty => CellValue::Empty,
                DataType::String(s) if s.trim().is_empty() => CellValue::Empty,
                DataType::String(s) => CellValue::Text(s.clone()),
                DataType::Float(f) => CellValue::Number(*f),
                DataType::Int(i) => CellValue::Number(*i as f64),
                _ => {
                    return Err(Box::new(SurveyError::WrongCellType {
                        lineno,
                        content: format!("{:?} IN {:?}", dt, row),
                    }));
                }
            };
            cells.push(cell);
        }
        if let Some(r) = layout.read_response(&cells, lineno)? {
            responses.push(r);
        }
    }
    Ok(ParsedSurvey {
        ratees: layout.ratees.iter().map(|(_, n)| n.clone()).collect(),
        responses,
    })
}

fn get_range(path: &String, source: &SurveySource) -> BSurveyResult<calamine::Range<DataType>> {
    let worksheet_name_o = source.excel_worksheet_name.clone();
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> =
        open_workbook(path).context(OpeningExcelSnafu { path: path.clone() })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path: path.clone() })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => Err(Box::new(SurveyError::EmptySurvey { path: path.clone() })),
            [(worksheet_name, wrange)] => {
                debug!("get_range: path: {:?} worksheet: {:?}", &path, &worksheet_name);
                Ok(wrange.clone())
            }
            _ => Err(Box::new(SurveyError::AmbiguousWorksheet {
                path: path.clone(),
                count: all_worksheets.len(),
            })),
        }
    }
}
