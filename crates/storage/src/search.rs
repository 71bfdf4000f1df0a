//! Token-overlap text search
//!
//! A node's property value is split into words on [`WORD_SEPARATORS`]. A node is a
//! candidate when some search term is a (case-sensitive) substring of some
//! word. Candidates are scored:
//!
//! - 100 when the terms joined without separator equal the words joined
//!   without separator;
//! - otherwise, for every (term, word) pair: 4 for an exact match, 2 when the
//!   word contains the term, 0 otherwise, summed.
//!
//! Results are ordered by score, highest first. Ties keep database order.

use crate::cypher::{literal, property_access, Label};
use crate::pagination::{normalize, Page};
use crate::statement::{page_params, Statement, StatementKind, PROPS_COLUMN, SCORE_COLUMN};
use graphrepo_core::PropertyValue;
use serde::{Deserialize, Serialize};

/// Score given when the whole field equals the search terms
pub const FULL_MATCH_SCORE: i64 = 100;
/// Score per word equal to a term
pub const EXACT_WORD_SCORE: i64 = 4;
/// Score per word containing a term
pub const PARTIAL_WORD_SCORE: i64 = 2;

/// Characters that split a searched value into words
///
/// Both the in-database statement and [`tokenize`] use exactly this set, so
/// other whitespace (non-breaking space, form feed, ...) stays inside a word.
pub const WORD_SEPARATORS: [char; 4] = [' ', '\t', '\n', '\r'];

/// Search request for one property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub prop: String,
    pub terms: Vec<String>,
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl SearchParams {
    pub fn new<I, S>(prop: impl Into<String>, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prop: prop.into(),
            terms: terms.into_iter().map(Into::into).collect(),
            skip: None,
            limit: None,
        }
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page(&self) -> Page {
        normalize(self.skip, self.limit)
    }
}

/// A mapped search hit and its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult<T> {
    pub object: T,
    pub score: i64,
}

/// Split a field value into words on [`WORD_SEPARATORS`], dropping empty pieces
pub fn tokenize(value: &str) -> Vec<&str> {
    value
        .split(WORD_SEPARATORS)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Text searched for a stored value: strings as-is, other scalars as Cypher's
/// `toString` renders them, lists and nulls as empty
pub fn searchable_text(value: Option<&PropertyValue>) -> String {
    match value {
        Some(PropertyValue::String(s)) => s.clone(),
        Some(PropertyValue::Integer(i)) => i.to_string(),
        Some(PropertyValue::Float(x)) => float_text(*x),
        Some(PropertyValue::Bool(b)) => b.to_string(),
        Some(PropertyValue::List(_)) | Some(PropertyValue::Null) | None => String::new(),
    }
}

/// Float text in Cypher's form: `1.5`, `1.0E20`, `1.5E-7`, `NaN`, `Infinity`
fn float_text(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = x.abs();
    if x == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{x:?}");
    }

    let exp = format!("{x:e}");
    let (mantissa, exponent) = exp.split_once('e').unwrap_or((exp.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}

/// Cypher list of the words in `field`, split exactly like [`tokenize`]
fn words_expression(field: &str) -> String {
    let mut text = format!("coalesce(toStringOrNull({field}), '')");
    for separator in WORD_SEPARATORS.iter().filter(|c| **c != ' ') {
        let separator = literal(&PropertyValue::String(separator.to_string()));
        text = format!("replace({text}, {separator}, ' ')");
    }
    format!("[w IN split({text}, ' ') WHERE w <> '']")
}

/// Whether any term occurs inside any word
pub fn is_candidate<S: AsRef<str>>(words: &[&str], terms: &[S]) -> bool {
    terms
        .iter()
        .any(|t| words.iter().any(|w| w.contains(t.as_ref())))
}

/// Relevance score of `words` against `terms`
pub fn score<S: AsRef<str>>(words: &[&str], terms: &[S]) -> i64 {
    let joined_terms: String = terms.iter().map(AsRef::as_ref).collect();
    let joined_words: String = words.concat();
    if joined_terms == joined_words {
        return FULL_MATCH_SCORE;
    }

    terms
        .iter()
        .map(|t| {
            let t = t.as_ref();
            words
                .iter()
                .map(|w| {
                    if *w == t {
                        EXACT_WORD_SCORE
                    } else if w.contains(t) {
                        PARTIAL_WORD_SCORE
                    } else {
                        0
                    }
                })
                .sum::<i64>()
        })
        .sum()
}

/// Build the search statement; the scoring runs inside the database
pub(crate) fn build_statement(label: &Label, params: &SearchParams) -> Statement {
    let page = params.page();
    let words = words_expression(&property_access("n", &params.prop));

    let text = format!(
        "MATCH (n:{label}) \
         WITH n, {words} AS words \
         WHERE any(t IN $terms WHERE any(w IN words WHERE w CONTAINS t)) \
         WITH n, CASE WHEN reduce(acc = '', t IN $terms | acc + t) = reduce(acc = '', w IN words | acc + w) THEN {FULL_MATCH_SCORE} \
         ELSE reduce(total = 0, t IN $terms | total + reduce(sub = 0, w IN words | sub + \
         CASE WHEN w = t THEN {EXACT_WORD_SCORE} WHEN w CONTAINS t THEN {PARTIAL_WORD_SCORE} ELSE 0 END)) END AS {SCORE_COLUMN} \
         RETURN properties(n) AS {PROPS_COLUMN}, {SCORE_COLUMN} \
         ORDER BY {SCORE_COLUMN} DESC \
         SKIP $skip LIMIT $limit",
        label = label.quoted(),
    );

    let mut bound = page_params(page);
    bound.insert(
        "terms".to_string(),
        PropertyValue::List(
            params
                .terms
                .iter()
                .map(|t| PropertyValue::String(t.clone()))
                .collect(),
        ),
    );

    Statement::new(
        text,
        bound,
        &[PROPS_COLUMN, SCORE_COLUMN],
        false,
        StatementKind::Search {
            label: label.clone(),
            property: params.prop.clone(),
            terms: params.terms.clone(),
            page,
        },
    )
}
