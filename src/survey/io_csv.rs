// Primitives for reading CSV files.

use crate::survey::{
    io_common::{CellValue, SurveyLayout},
    *,
};

pub fn read_csv_survey(path: String, source: &SurveySource) -> BSurveyResult<ParsedSurvey> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&path)
        .context(CsvOpenSnafu { path: path.clone() })?;

    let header: Vec<Option<String>> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| {
            // Spreadsheet exports sometimes start with a byte order mark.
            let t = s.trim_start_matches('\u{feff}').trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .collect();
    debug!("read_csv_survey: header: {:?}", header);
    let layout = SurveyLayout::from_header(&header, source)?;

    let mut responses: Vec<ParsedResponse> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_survey: {:?} {:?}", lineno, line);
        let cells: Vec<CellValue> = line
            .iter()
            .map(|s| {
                if s.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(s.to_string())
                }
            })
            .collect();
        if let Some(r) = layout.read_response(&cells, lineno)? {
            responses.push(r);
        }
    }
    Ok(ParsedSurvey {
        ratees: layout.ratees.iter().map(|(_, n)| n.clone()).collect(),
        responses,
    })
}
