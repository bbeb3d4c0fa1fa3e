//! Labeled training corpus.
//!
//! A corpus is assembled from two CSV datasets, one of fake and one of real
//! articles. The label of each article is the dataset it came from.
//!
//! # Examples
//!
//! ```
//! use verity::corpus::{Corpus, RawArticle};
//! use verity::ml::Label;
//!
//! let corpus = Corpus::from_sources(
//!     vec![RawArticle::new("Shocking secret", "insiders reveal")],
//!     vec![RawArticle::new("Senate votes", "according to officials")],
//! );
//!
//! assert_eq!(corpus.len(), 2);
//! assert_eq!(corpus.count(Label::Fake), 1);
//! assert_eq!(corpus.articles()[1].article.text(), "Senate votes according to officials");
//! ```

pub mod csv;
pub mod split;

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::corpus::csv::CsvArticleReader;
use crate::corpus::split::TrainTestSplit;
use crate::error::Result;
use crate::ml::types::Label;

/// An article as read from a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub body: String,
}

impl RawArticle {
    pub fn new<T: Into<String>, B: Into<String>>(title: T, body: B) -> Self {
        RawArticle {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Title and body joined by a single space.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }
}

/// An article together with its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledArticle {
    pub article: RawArticle,
    pub label: Label,
}

/// A collection of labeled articles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    articles: Vec<LabeledArticle>,
}

impl Corpus {
    /// Label the fake and real articles and concatenate them, fake first.
    pub fn from_sources(fake: Vec<RawArticle>, real: Vec<RawArticle>) -> Self {
        let articles = fake
            .into_iter()
            .map(|article| LabeledArticle {
                article,
                label: Label::Fake,
            })
            .chain(real.into_iter().map(|article| LabeledArticle {
                article,
                label: Label::Real,
            }))
            .collect();

        Corpus { articles }
    }

    /// Read and label the two CSV datasets.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        reader: &CsvArticleReader,
        fake_path: P,
        real_path: Q,
    ) -> Result<Self> {
        let fake = reader.read_path(fake_path)?;
        let real = reader.read_path(real_path)?;
        info!(
            "Loaded corpus: {} fake and {} real articles",
            fake.len(),
            real.len()
        );
        Ok(Self::from_sources(fake, real))
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn articles(&self) -> &[LabeledArticle] {
        &self.articles
    }

    pub fn into_articles(self) -> Vec<LabeledArticle> {
        self.articles
    }

    /// Number of articles with `label`.
    pub fn count(&self, label: Label) -> usize {
        self.articles.iter().filter(|a| a.label == label).count()
    }

    /// Shuffle the articles reproducibly.
    pub fn shuffle(&mut self, seed: u64) {
        split::shuffle(&mut self.articles, seed);
    }

    /// Partition into training and held-out test articles.
    pub fn split(self, test_size: f64, seed: u64) -> Result<TrainTestSplit<LabeledArticle>> {
        split::train_test_split(self.articles, test_size, seed)
    }
}

impl FromIterator<LabeledArticle> for Corpus {
    fn from_iter<I: IntoIterator<Item = LabeledArticle>>(iter: I) -> Self {
        Corpus {
            articles: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Corpus {
        Corpus::from_sources(
            (0..5)
                .map(|i| RawArticle::new(format!("fake {i}"), "body"))
                .collect(),
            (0..5)
                .map(|i| RawArticle::new(format!("real {i}"), "body"))
                .collect(),
        )
    }

    #[test]
    fn test_labels_follow_source() {
        let corpus = corpus();
        assert_eq!(corpus.len(), 10);
        assert_eq!(corpus.count(Label::Fake), 5);
        assert_eq!(corpus.count(Label::Real), 5);
        assert!(corpus.articles()[..5].iter().all(|a| a.label == Label::Fake));
        assert!(corpus.articles()[0].article.title.starts_with("fake"));
    }

    #[test]
    fn test_shuffle_keeps_labels_attached() {
        let mut corpus = corpus();
        corpus.shuffle(42);
        for article in corpus.articles() {
            let expected = if article.article.title.starts_with("fake") {
                Label::Fake
            } else {
                Label::Real
            };
            assert_eq!(article.label, expected);
        }
    }

    #[test]
    fn test_split() {
        let split = corpus().split(0.4, 42).unwrap();
        assert_eq!(split.test.len(), 4);
        assert_eq!(split.train.len(), 6);
    }

    #[test]
    fn test_text_joins_title_and_body() {
        assert_eq!(RawArticle::new("a", "b").text(), "a b");
        assert_eq!(RawArticle::new("", "").text(), " ");
    }
}
