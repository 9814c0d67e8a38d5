//! Okapi BM25 over pre-normalized term lists.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Ranking constants. The defaults are the usual Okapi values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Document-length normalization.
    pub b: f64,
    /// Floor for negative idf values, as a fraction of the average idf.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

/// Scorer state built once per corpus snapshot.
#[derive(Debug, Clone)]
pub struct Bm25 {
    params: Bm25Params,
    doc_freqs: Vec<HashMap<String, u32>>,
    doc_len: Vec<usize>,
    avgdl: f64,
    idf: HashMap<String, f64>,
}

impl Bm25 {
    #[must_use]
    pub fn new(corpus: &[Vec<String>], params: Bm25Params) -> Self {
        let mut doc_freqs = Vec::with_capacity(corpus.len());
        let mut doc_len = Vec::with_capacity(corpus.len());
        let mut containing: HashMap<String, usize> = HashMap::new();

        for terms in corpus {
            let mut freqs: HashMap<String, u32> = HashMap::new();
            for term in terms {
                *freqs.entry(term.clone()).or_default() += 1;
            }
            for term in freqs.keys() {
                *containing.entry(term.clone()).or_default() += 1;
            }
            doc_len.push(terms.len());
            doc_freqs.push(freqs);
        }

        let avgdl = if corpus.is_empty() {
            0.0
        } else {
            doc_len.iter().sum::<usize>() as f64 / corpus.len() as f64
        };
        let idf = compute_idf(&containing, corpus.len(), params.epsilon);

        Self {
            params,
            doc_freqs,
            doc_len,
            avgdl,
            idf,
        }
    }

    /// One score per corpus document, in corpus order.
    #[must_use]
    pub fn scores(&self, query: &[String]) -> Vec<f64> {
        let Bm25Params { k1, b, .. } = self.params;
        self.doc_freqs
            .par_iter()
            .zip(self.doc_len.par_iter())
            .map(|(freqs, &len)| {
                query
                    .iter()
                    .filter_map(|term| {
                        let tf = f64::from(*freqs.get(term)?);
                        let idf = self.idf.get(term).copied().unwrap_or_default();
                        let norm = k1 * (1.0 - b + b * len as f64 / self.avgdl);
                        Some(idf * tf * (k1 + 1.0) / (tf + norm))
                    })
                    .sum()
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.doc_len.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc_len.is_empty()
    }

    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }
}

/// `ln(N - n + 0.5) - ln(n + 0.5)`, with negative values raised to
/// `epsilon * average idf`.
fn compute_idf(
    containing: &HashMap<String, usize>,
    corpus_size: usize,
    epsilon: f64,
) -> HashMap<String, f64> {
    let n_docs = corpus_size as f64;
    let mut idf = HashMap::with_capacity(containing.len());
    let mut negative = Vec::new();
    let mut idf_sum = 0.0;

    for (term, &count) in containing {
        let count = count as f64;
        let value = (n_docs - count + 0.5).ln() - (count + 0.5).ln();
        idf_sum += value;
        if value < 0.0 {
            negative.push(term.clone());
        }
        idf.insert(term.clone(), value);
    }

    if !idf.is_empty() {
        let floor = epsilon * idf_sum / idf.len() as f64;
        for term in negative {
            idf.insert(term, floor);
        }
    }
    idf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(docs: &[&[&str]]) -> Vec<Vec<String>> {
        docs.iter()
            .map(|d| d.iter().map(ToString::to_string).collect())
            .collect()
    }

    fn query(terms: &[&str]) -> Vec<String> {
        terms.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn only_overlapping_documents_score() {
        let bm25 = Bm25::new(
            &corpus(&[&["rucio", "rule"], &["quota", "account"], &["transfer", "fail"]]),
            Bm25Params::default(),
        );
        let scores = bm25.scores(&query(&["quota", "limit"]));
        assert_eq!(scores.len(), 3);
        assert!(scores[1] > 0.0);
        assert!(scores[0].abs() < f64::EPSILON);
        assert!(scores[2].abs() < f64::EPSILON);
    }

    #[test]
    fn idf_matches_okapi_formula() {
        let bm25 = Bm25::new(
            &corpus(&[&["a"], &["b"], &["c"], &["d"]]),
            Bm25Params::default(),
        );
        let expected = 3.5_f64.ln() - 1.5_f64.ln();
        assert!((bm25.idf["a"] - expected).abs() < 1e-12);
    }

    #[test]
    fn negative_idf_is_floored() {
        // "common" is in 3 of 4 documents: ln(1.5) - ln(3.5) < 0.
        let bm25 = Bm25::new(
            &corpus(&[&["common", "x"], &["common", "y"], &["common", "z"], &["w"]]),
            Bm25Params::default(),
        );
        let raw_common = 1.5_f64.ln() - 3.5_f64.ln();
        let raw_rare = 3.5_f64.ln() - 1.5_f64.ln();
        let average = (raw_common + 4.0 * raw_rare) / 5.0;
        assert!((bm25.idf["common"] - 0.25 * average).abs() < 1e-12);
        assert!(bm25.idf["common"] > 0.0);
    }

    #[test]
    fn shorter_documents_win_ties_on_terms() {
        let bm25 = Bm25::new(
            &corpus(&[
                &["quota", "a", "b", "c"],
                &["quota"],
                &["other"],
                &["more"],
                &["extra"],
            ]),
            Bm25Params::default(),
        );
        let scores = bm25.scores(&query(&["quota"]));
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn empty_corpus_scores_nothing() {
        let bm25 = Bm25::new(&[], Bm25Params::default());
        assert!(bm25.is_empty());
        assert!(bm25.scores(&query(&["anything"])).is_empty());
    }

    #[test]
    fn unknown_terms_contribute_zero() {
        let bm25 = Bm25::new(&corpus(&[&["one"], &["two"]]), Bm25Params::default());
        assert!(bm25.scores(&query(&["three"])).iter().all(|s| s.abs() < f64::EPSILON));
    }
}
