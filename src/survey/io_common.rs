// Primitives shared by the survey readers.

use std::path::Path;

use crate::survey::*;

/// The question identifying the respondent in the survey form.
pub const DEFAULT_RATER_COLUMN: &str = "Кто Вы?";
/// The text shared by all the rating questions.
pub const DEFAULT_RATING_MARKER: &str = "Поставьте оценку тому, с кем Вы работали в команде.";

/// A cell, as read by any of the providers.
#[derive(PartialEq, Debug, Clone)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

/// The name between square brackets in a rating question, if the header is one.
pub fn ratee_name(header: &str, marker: &str) -> Option<String> {
    if !header.contains(marker) {
        return None;
    }
    let start = header.rfind('[')?;
    let end = header[start..].find(']')? + start;
    let name = header[start + 1..end].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Where to find the respondent and the ratings in a row.
#[derive(PartialEq, Debug, Clone)]
pub struct SurveyLayout {
    pub rater_idx: usize,
    pub ratees: Vec<(usize, String)>,
}

impl SurveyLayout {
    pub fn from_header(header: &[Option<String>], source: &SurveySource) -> BSurveyResult<SurveyLayout> {
        let rater_column = source.rater_column();
        let marker = source.rating_column_marker();

        let rater_idx = header
            .iter()
            .position(|h| h.as_deref().map(|s| s.trim()) == Some(rater_column.as_str()))
            .context(MissingRaterColumnSnafu {
                column: rater_column.clone(),
            })?;

        let mut ratees: Vec<(usize, String)> = Vec::new();
        for (idx, h) in header.iter().enumerate() {
            if let Some(name) = h.as_deref().and_then(|s| ratee_name(s, marker.as_str())) {
                if ratees.iter().any(|(_, n)| *n == name) {
                    warn!("from_header: column {} repeats the ratee {}, skipping", idx, name);
                    continue;
                }
                ratees.push((idx, name));
            }
        }
        if ratees.is_empty() {
            return Err(Box::new(SurveyError::NoRatingColumns { marker }));
        }
        debug!("from_header: rater column {} ratees {:?}", rater_idx, ratees);
        Ok(SurveyLayout { rater_idx, ratees })
    }

    /// Reads one row. Rows without a respondent are skipped.
    pub fn read_response(&self, cells: &[CellValue], lineno: usize) -> BSurveyResult<Option<ParsedResponse>> {
        let rater = match cells.get(self.rater_idx) {
            Some(CellValue::Text(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(CellValue::Number(f)) => f.to_string(),
            _ => {
                warn!("read_response: line {}: no respondent, skipping", lineno);
                return Ok(None);
            }
        };

        let mut scores: Vec<(String, Option<f64>)> = Vec::new();
        for (idx, name) in self.ratees.iter() {
            let score = match cells.get(*idx) {
                None | Some(CellValue::Empty) => None,
                Some(CellValue::Number(f)) => Some(*f),
                Some(CellValue::Text(s)) => parse_score(s, lineno)?,
            };
            scores.push((name.clone(), score));
        }
        Ok(Some(ParsedResponse {
            lineno,
            rater,
            scores,
        }))
    }
}

/// Parses a score typed as text. Blank means no answer.
pub fn parse_score(s: &str, lineno: usize) -> BSurveyResult<Option<f64>> {
    let t = s.trim();
    if t.is_empty() {
        return Ok(None);
    }
    let x = t
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .context(InvalidScoreSnafu {
            lineno,
            content: t.to_string(),
        })?;
    Ok(Some(x))
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SurveySource {
        SurveySource {
            provider: "csv".to_string(),
            file_path: "survey.csv".to_string(),
            rater_column: None,
            rating_column_marker: None,
            excel_worksheet_name: None,
        }
    }

    fn header(xs: &[&str]) -> Vec<Option<String>> {
        xs.iter()
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect()
    }

    #[test]
    fn finds_ratee_names() {
        assert_eq!(
            ratee_name(
                "Поставьте оценку тому, с кем Вы работали в команде. [ Anna ]",
                DEFAULT_RATING_MARKER
            ),
            Some("Anna".to_string())
        );
        assert_eq!(ratee_name("Rate [Anna]", DEFAULT_RATING_MARKER), None);
        assert_eq!(ratee_name("Rate [Anna]", "Rate"), Some("Anna".to_string()));
        assert_eq!(ratee_name("Rate []", "Rate"), None);
        assert_eq!(ratee_name("Rate Anna", "Rate"), None);
    }

    #[test]
    fn layout_from_header() {
        let h = header(&[
            "Timestamp",
            "Кто Вы?",
            "",
            "Поставьте оценку тому, с кем Вы работали в команде. [Anna]",
            "Поставьте оценку тому, с кем Вы работали в команде. [Bob]",
        ]);
        let layout = SurveyLayout::from_header(&h, &source()).unwrap();
        assert_eq!(layout.rater_idx, 1);
        assert_eq!(
            layout.ratees,
            vec![(3, "Anna".to_string()), (4, "Bob".to_string())]
        );
    }

    #[test]
    fn layout_requires_the_columns() {
        let h = header(&["Who", "Rate [Anna]"]);
        assert!(matches!(
            *SurveyLayout::from_header(&h, &source()).unwrap_err(),
            SurveyError::MissingRaterColumn { .. }
        ));
        let mut s = source();
        s.rater_column = Some("Who".to_string());
        assert!(matches!(
            *SurveyLayout::from_header(&h, &s).unwrap_err(),
            SurveyError::NoRatingColumns { .. }
        ));
        s.rating_column_marker = Some("Rate".to_string());
        assert!(SurveyLayout::from_header(&h, &s).is_ok());
    }

    #[test]
    fn reads_responses() {
        let layout = SurveyLayout {
            rater_idx: 0,
            ratees: vec![(1, "Anna".to_string()), (2, "Bob".to_string()), (3, "Clara".to_string())],
        };
        let cells = vec![
            CellValue::Text(" Dan ".to_string()),
            CellValue::Text("4,5".to_string()),
            CellValue::Number(3.0),
            CellValue::Text(" ".to_string()),
        ];
        let r = layout.read_response(&cells, 2).unwrap().unwrap();
        assert_eq!(r.rater, "Dan");
        assert_eq!(
            r.scores,
            vec![
                ("Anna".to_string(), Some(4.5)),
                ("Bob".to_string(), Some(3.0)),
                ("Clara".to_string(), None),
            ]
        );

        let blank = vec![CellValue::Empty, CellValue::Number(3.0)];
        assert_eq!(layout.read_response(&blank, 3).unwrap(), None);

        let bad = vec![CellValue::Text("Dan".to_string()), CellValue::Text("great".to_string())];
        assert!(matches!(
            *layout.read_response(&bad, 4).unwrap_err(),
            SurveyError::InvalidScore { lineno: 4, .. }
        ));
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/tmp/data/survey.csv"), "survey");
    }
}
