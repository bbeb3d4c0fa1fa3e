//! CSV article reader.
//!
//! Reads labeled news datasets where the first row names the columns:
//! ```csv
//! title,text,subject,date
//! Senate passes budget,"WASHINGTON (Reuters) - The Senate ...",politicsNews,2017-12-01
//! ```
//!
//! Only the title and text columns are used; every other column is ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::corpus::RawArticle;
use crate::error::{Result, VerityError};

/// Names of the columns holding an article's title and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvColumns {
    pub title: String,
    pub text: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            text: "text".to_string(),
        }
    }
}

/// A reader that turns CSV rows into [`RawArticle`]s.
#[derive(Debug, Clone)]
pub struct CsvArticleReader {
    columns: CsvColumns,
    /// CSV delimiter character (default: ',')
    delimiter: u8,
}

impl Default for CsvArticleReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvArticleReader {
    /// Create a reader for comma-separated files with `title` and `text` columns.
    pub fn new() -> Self {
        CsvArticleReader {
            columns: CsvColumns::default(),
            delimiter: b',',
        }
    }

    /// Use custom column names.
    pub fn with_columns(mut self, columns: CsvColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Set a custom delimiter character.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn columns(&self) -> &CsvColumns {
        &self.columns
    }

    /// Read every article of the CSV file at `path`.
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<RawArticle>> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| VerityError::corpus(format!("cannot open {}: {e}", path.display())))?;
        let articles = self.read(file, &path.display().to_string())?;
        debug!("Read {} articles from {}", articles.len(), path.display());
        Ok(articles)
    }

    /// Read every article from `input`; `source` names it in error messages.
    pub fn read<R: Read>(&self, input: R, source: &str) -> Result<Vec<RawArticle>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(false)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|e| VerityError::corpus(format!("{source}: failed to read CSV header: {e}")))?
            .clone();

        let column_index = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or_else(|| {
                    VerityError::corpus(format!("{source}: missing required column `{name}`"))
                })
        };
        let title_index = column_index(&self.columns.title)?;
        let text_index = column_index(&self.columns.text)?;

        let mut articles = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                VerityError::corpus(format!("{source}: malformed row {}: {e}", row + 1))
            })?;

            articles.push(RawArticle::new(
                record.get(title_index).unwrap_or_default(),
                record.get(text_index).unwrap_or_default(),
            ));
        }

        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_articles() {
        let csv = "title,text,subject\nSenate passes budget,The Senate voted,politics\n\"Aliens, again\",\"They \"\"landed\"\"\",news\n";
        let articles = CsvArticleReader::new().read(csv.as_bytes(), "test").unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Senate passes budget");
        assert_eq!(articles[0].body, "The Senate voted");
        assert_eq!(articles[1].title, "Aliens, again");
        assert_eq!(articles[1].body, "They \"landed\"");
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let csv = "text,title\nbody here,title here\n";
        let articles = CsvArticleReader::new().read(csv.as_bytes(), "test").unwrap();
        assert_eq!(articles[0].title, "title here");
        assert_eq!(articles[0].body, "body here");
    }

    #[test]
    fn test_missing_column() {
        let csv = "headline,text\nA,B\n";
        let err = CsvArticleReader::new()
            .read(csv.as_bytes(), "fake.csv")
            .unwrap_err();
        assert!(matches!(err, VerityError::Corpus(_)));
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_ragged_row() {
        let csv = "title,text\nA,B\nC\n";
        let err = CsvArticleReader::new()
            .read(csv.as_bytes(), "fake.csv")
            .unwrap_err();
        assert!(matches!(err, VerityError::Corpus(_)));
    }

    #[test]
    fn test_custom_columns_and_delimiter() {
        let csv = "headline;content\nA;B\n";
        let reader = CsvArticleReader::new()
            .with_columns(CsvColumns {
                title: "headline".to_string(),
                text: "content".to_string(),
            })
            .with_delimiter(b';');
        let articles = reader.read(csv.as_bytes(), "test").unwrap();
        assert_eq!(articles, vec![RawArticle::new("A", "B")]);
    }

    #[test]
    fn test_header_only() {
        let articles = CsvArticleReader::new()
            .read("title,text\n".as_bytes(), "test")
            .unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = CsvArticleReader::new()
            .read_path("/nonexistent/verity/Fake.csv")
            .unwrap_err();
        assert!(matches!(err, VerityError::Corpus(_)));
    }
}
