//! TF-IDF feature vectorization for catalog items.
//!
//! This module turns item content text into sparse, L2-normalized term
//! vectors:
//! - Tokenization with Unicode support
//! - Locale-specific stop word removal (Portuguese by default)
//! - Smoothed TF-IDF weighting over a fitted corpus
//! - Cosine similarity for vector comparison
//!
//! The implementation uses basic string operations and hash maps rather
//! than an external NLP library.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Portuguese stop words filtered from item text by default.
pub const PORTUGUESE_STOP_WORDS: &[&str] = &[
    "a", "ao", "aos", "aquela", "aquelas", "aquele", "aqueles", "aquilo", "as", "às", "até",
    "com", "como", "da", "das", "de", "dela", "delas", "dele", "deles", "depois", "do", "dos",
    "e", "é", "ela", "elas", "ele", "eles", "em", "entre", "era", "eram", "essa", "essas",
    "esse", "esses", "esta", "estas", "este", "estes", "eu", "foi", "fomos", "for", "foram",
    "fosse", "fossem", "fui", "há", "isso", "isto", "já", "lhe", "lhes", "mais", "mas", "me",
    "mesmo", "meu", "meus", "minha", "minhas", "muito", "na", "nas", "nem", "no", "nos",
    "nossa", "nossas", "nosso", "nossos", "num", "numa", "o", "os", "ou", "para", "pela",
    "pelas", "pelo", "pelos", "por", "qual", "quando", "que", "quem", "se", "sem", "ser",
    "será", "serão", "seria", "seriam", "seu", "seus", "só", "somos", "sua", "suas", "também",
    "te", "tem", "têm", "temos", "tenho", "ter", "terá", "terão", "teria", "teriam", "teu",
    "teus", "ti", "tinha", "tinham", "tínhamos", "tive", "tivera", "tiveram", "tivesse",
    "tivessem", "tu", "tua", "tuas", "um", "uma", "uns", "você", "vocês", "vos", "esteja",
    "estejam", "estejamos", "estava", "estávamos", "esteve", "estive", "estivemos", "estivera",
    "estiverem", "estivermos", "estivessem", "estivessemos", "estou", "fôramos", "fôssemos",
    "haja", "hajam", "hajamos", "havei", "havemos", "haver", "haverá", "haverão", "haverei",
    "haveremos", "haveria", "haveriam", "houvera", "houvéramos", "houver", "houverá",
    "houverão", "houverei", "houveremos", "houveria", "houveriam", "houvesse", "houvéssemos",
    "ia", "íamos", "iam", "ida", "idas", "ido", "idos", "indo", "ir", "irei", "iremos", "iria",
    "iriam", "lugar", "mim", "mundo", "naquele", "naquela", "naqueles", "naquelas", "pode",
    "podia", "podeis", "podem", "podemos", "poder", "poderá", "poderão", "poderei",
    "poderemos", "poderia", "poderiam", "podias", "porém", "pra", "quais", "quanto", "quantos",
    "quantas", "quer", "queira", "queiram", "queremos", "quero", "quis", "quise", "quiseram",
    "quiserem", "quiséssemos", "sempre", "serei", "seremos", "si", "sido", "sou", "talvez",
    "tende", "tenha", "tenham", "tenhamos", "terei", "teremos", "vendo", "vir", "virá",
    "virão", "virei", "viremos", "viria", "viriam", "viu", "tudo", "umas", "vai", "vamos",
];

/// Common English stop words, available through [`StopWordLocale::English`].
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself",
    "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Minimum token length in characters (shorter tokens are filtered).
const MIN_TOKEN_LENGTH: usize = 2;

/// Which built-in stop word list the vectorizer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWordLocale {
    #[default]
    Portuguese,
    English,
    /// No stop word filtering.
    None,
}

impl StopWordLocale {
    /// Returns the stop word set for this locale.
    pub fn words(self) -> HashSet<String> {
        let list: &[&str] = match self {
            Self::Portuguese => PORTUGUESE_STOP_WORDS,
            Self::English => ENGLISH_STOP_WORDS,
            Self::None => &[],
        };
        list.iter().map(|w| (*w).to_string()).collect()
    }
}

impl std::str::FromStr for StopWordLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pt" | "portuguese" => Ok(Self::Portuguese),
            "en" | "english" => Ok(Self::English),
            "none" | "off" => Ok(Self::None),
            other => Err(format!("unknown stop word locale '{other}' (expected pt, en or none)")),
        }
    }
}

/// Tokenizes text into a list of normalized tokens.
///
/// Processing steps:
/// 1. Split on Unicode word boundaries
/// 2. Convert to lowercase
/// 3. Remove punctuation (keep alphanumeric and hyphens)
/// 4. Filter by minimum length
/// 5. Remove stop words
pub fn tokenize(text: &str, stop_words: &HashSet<String>) -> Vec<String> {
    text.unicode_words()
        .map(normalize_token)
        .filter(|token| {
            token.chars().count() >= MIN_TOKEN_LENGTH && !stop_words.contains(token.as_str())
        })
        .collect()
}

/// Normalizes a single token by lowercasing and removing non-alphanumeric characters.
fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_lowercase()
}

/// Computes term frequency for a document.
///
/// Term frequency is calculated as: count(term) / total_terms. Vectors are
/// L2-normalized afterwards, so this is equivalent to raw counts.
pub fn term_frequency(tokens: &[String]) -> HashMap<String, f64> {
    if tokens.is_empty() {
        return HashMap::new();
    }

    let total = tokens.len() as f64;
    let mut counts: HashMap<String, usize> = HashMap::new();

    for token in tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(term, count)| (term, count as f64 / total))
        .collect()
}

/// Statistics about a corpus of documents for IDF computation.
#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    /// Number of documents in the corpus
    pub document_count: usize,
    /// Number of documents containing each term
    pub document_frequencies: HashMap<String, usize>,
}

impl CorpusStats {
    /// Creates a new empty corpus stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document's tokens to the corpus statistics.
    ///
    /// Updates document count and document frequencies for each unique term.
    pub fn add_document(&mut self, tokens: &[String]) {
        self.document_count += 1;

        // Count each unique term once per document
        let unique_terms: HashSet<&String> = tokens.iter().collect();
        for term in unique_terms {
            *self.document_frequencies.entry(term.clone()).or_insert(0) += 1;
        }
    }

    /// Computes the smoothed inverse document frequency for a term.
    ///
    /// IDF = ln((1 + N) / (1 + df)) + 1, strictly decreasing in df.
    /// Returns `None` for terms outside the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f64> {
        let df = *self.document_frequencies.get(term)?;
        let n = self.document_count as f64;
        Some(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
    }

    /// Returns true if no documents have been added.
    pub fn is_empty(&self) -> bool {
        self.document_count == 0
    }
}

/// A sparse TF-IDF weighted term vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
    /// Map from term to TF-IDF weight
    pub weights: HashMap<String, f64>,
}

impl TermVector {
    /// Computes an L2-normalized vector from tokens and corpus statistics.
    ///
    /// Tokens unknown to the corpus contribute nothing.
    pub fn from_tokens(tokens: &[String], corpus: &CorpusStats) -> Self {
        let tf = term_frequency(tokens);
        let weights = tf
            .into_iter()
            .filter_map(|(term, freq)| corpus.idf(&term).map(|idf| (term, freq * idf)))
            .filter(|(_, weight)| *weight > 0.0)
            .collect();

        Self { weights }.normalized()
    }

    /// Computes the L2 norm (magnitude) of the vector.
    pub fn magnitude(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    /// Returns a copy scaled to unit length. A zero vector stays zero.
    pub fn normalized(mut self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            for weight in self.weights.values_mut() {
                *weight /= mag;
            }
        }
        self
    }

    /// Computes the dot product with another term vector.
    pub fn dot(&self, other: &TermVector) -> f64 {
        // Iterate over the smaller map
        let (small, large) = if self.weights.len() <= other.weights.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .weights
            .iter()
            .filter_map(|(term, weight)| large.weights.get(term).map(|w| weight * w))
            .sum()
    }

    /// Computes cosine similarity with another term vector.
    ///
    /// Returns 0.0 if either vector has zero magnitude.
    pub fn cosine_similarity(&self, other: &TermVector) -> f64 {
        let mag_self = self.magnitude();
        let mag_other = other.magnitude();

        if mag_self == 0.0 || mag_other == 0.0 {
            return 0.0;
        }

        self.dot(other) / (mag_self * mag_other)
    }

    /// Checks if the vector carries no signal (no terms with positive weight).
    pub fn is_zero(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Merges multiple term vectors by summing their weights.
///
/// Used to build a query profile from several items; normalize the result
/// before comparing.
pub fn merge_vectors(vectors: &[&TermVector]) -> TermVector {
    let mut merged = HashMap::new();

    for vector in vectors {
        for (term, weight) in &vector.weights {
            *merged.entry(term.clone()).or_insert(0.0) += weight;
        }
    }

    TermVector { weights: merged }
}

/// Fits a vocabulary and IDF table over a corpus of content strings.
///
/// # Example
///
/// ```rust,ignore
/// use recomenda_engine::tfidf::{FeatureVectorizer, StopWordLocale};
///
/// let mut vectorizer = FeatureVectorizer::with_locale(StopWordLocale::Portuguese);
/// let matrix = vectorizer.fit_transform(&["tênis casual", "livro de ficção"]);
/// let query = vectorizer.transform("tênis");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FeatureVectorizer {
    stop_words: HashSet<String>,
    corpus: CorpusStats,
}

impl FeatureVectorizer {
    /// Creates an unfitted vectorizer with an explicit stop word set.
    pub fn new(stop_words: HashSet<String>) -> Self {
        Self {
            stop_words,
            corpus: CorpusStats::new(),
        }
    }

    /// Creates an unfitted vectorizer using a built-in stop word list.
    pub fn with_locale(locale: StopWordLocale) -> Self {
        Self::new(locale.words())
    }

    /// Fits the vocabulary over `corpus` and returns one vector per
    /// document, in corpus order.
    ///
    /// Refitting discards any previous vocabulary; there is no incremental
    /// update.
    pub fn fit_transform<S: AsRef<str>>(&mut self, corpus: &[S]) -> Vec<TermVector> {
        let tokenized: Vec<Vec<String>> = corpus
            .iter()
            .map(|doc| tokenize(doc.as_ref(), &self.stop_words))
            .collect();

        self.corpus = CorpusStats::new();
        for tokens in &tokenized {
            self.corpus.add_document(tokens);
        }

        if self.corpus.is_empty() {
            warn!("fitting vectorizer on an empty corpus; no content signal available");
        }
        debug!(
            documents = self.corpus.document_count,
            vocabulary = self.corpus.document_frequencies.len(),
            "fitted TF-IDF vocabulary"
        );

        tokenized
            .iter()
            .map(|tokens| TermVector::from_tokens(tokens, &self.corpus))
            .collect()
    }

    /// Vectorizes arbitrary text with the fitted vocabulary.
    ///
    /// Terms outside the vocabulary are dropped. On an unfitted or empty
    /// corpus this yields a zero vector.
    pub fn transform(&self, text: &str) -> TermVector {
        let tokens = tokenize(text, &self.stop_words);
        TermVector::from_tokens(&tokens, &self.corpus)
    }

    /// Returns the fitted vocabulary, sorted.
    pub fn vocabulary(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self
            .corpus
            .document_frequencies
            .keys()
            .map(String::as_str)
            .collect();
        terms.sort_unstable();
        terms
    }

    /// Returns the corpus statistics backing the IDF table.
    pub fn corpus(&self) -> &CorpusStats {
        &self.corpus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_stop_words() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn tokenize_basic() {
        let tokens = tokenize("Hello, world! This is a test.", &StopWordLocale::English.words());
        assert!(tokens.contains(&"hello".to_string()));
        assert!(tokens.contains(&"world".to_string()));
        assert!(tokens.contains(&"test".to_string()));
        assert!(!tokens.contains(&"a".to_string()));
        assert!(!tokens.contains(&"is".to_string()));
    }

    #[test]
    fn tokenize_portuguese_stop_words() {
        let tokens = tokenize("Tênis para corrida com amortecimento", &StopWordLocale::Portuguese.words());
        assert_eq!(tokens, vec!["tênis", "corrida", "amortecimento"]);
    }

    #[test]
    fn tokenize_counts_characters_not_bytes() {
        // "é" is two bytes but one character and is not a stop word here
        let tokens = tokenize("é ok", &no_stop_words());
        assert_eq!(tokens, vec!["ok"]);
    }

    #[test]
    fn tokenize_only_punctuation() {
        let tokens = tokenize("... ??? !!!", &no_stop_words());
        assert!(tokens.is_empty());
    }

    #[test]
    fn term_frequency_basic() {
        let tokens = vec!["cat".into(), "dog".into(), "cat".into(), "bird".into()];
        let tf = term_frequency(&tokens);

        assert!((tf["cat"] - 0.5).abs() < 0.001);
        assert!((tf["dog"] - 0.25).abs() < 0.001);
        assert!((tf["bird"] - 0.25).abs() < 0.001);
    }

    #[test]
    fn smoothed_idf_is_monotonic_in_document_frequency() {
        let mut corpus = CorpusStats::new();
        corpus.add_document(&["cat".into(), "dog".into()]);
        corpus.add_document(&["cat".into(), "bird".into()]);
        corpus.add_document(&["cat".into(), "fish".into()]);

        // cat in 3 of 3: ln(4/4) + 1 = 1.0
        assert!((corpus.idf("cat").unwrap() - 1.0).abs() < 1e-9);
        // dog in 1 of 3: ln(4/2) + 1 ~ 1.693
        assert!((corpus.idf("dog").unwrap() - 1.693).abs() < 0.001);
        assert!(corpus.idf("dog").unwrap() > corpus.idf("cat").unwrap());
        assert_eq!(corpus.idf("unknown"), None);
    }

    #[test]
    fn vectors_are_unit_length() {
        let mut vectorizer = FeatureVectorizer::new(no_stop_words());
        let matrix = vectorizer.fit_transform(&["electronics fast laptop", "books fiction"]);

        for v in &matrix {
            assert!((v.magnitude() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn cosine_self_similarity_is_one() {
        let mut vectorizer = FeatureVectorizer::new(no_stop_words());
        let matrix = vectorizer.fit_transform(&["red shoe", "blue shoe", "green hat"]);

        for v in &matrix {
            assert!((v.cosine_similarity(v) - 1.0).abs() < 1e-9);
            assert!((v.dot(v) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn cosine_similarity_orthogonal() {
        let mut vectorizer = FeatureVectorizer::new(no_stop_words());
        let matrix = vectorizer.fit_transform(&["cat", "dog"]);
        assert!(matrix[0].cosine_similarity(&matrix[1]).abs() < 1e-9);
    }

    #[test]
    fn transform_drops_unknown_terms() {
        let mut vectorizer = FeatureVectorizer::new(no_stop_words());
        vectorizer.fit_transform(&["running shoe", "reading lamp"]);

        let v = vectorizer.transform("shoe spaceship");
        assert_eq!(v.weights.len(), 1);
        assert!(v.weights.contains_key("shoe"));
        assert!((v.magnitude() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn transform_on_empty_corpus_is_zero() {
        let mut vectorizer = FeatureVectorizer::with_locale(StopWordLocale::Portuguese);
        let matrix = vectorizer.fit_transform::<&str>(&[]);

        assert!(matrix.is_empty());
        assert!(vectorizer.vocabulary().is_empty());
        let v = vectorizer.transform("qualquer texto");
        assert!(v.is_zero());
        assert_eq!(v.magnitude(), 0.0);
    }

    #[test]
    fn transform_on_unfitted_vectorizer_is_zero() {
        let vectorizer = FeatureVectorizer::default();
        assert!(vectorizer.transform("anything").is_zero());
    }

    #[test]
    fn refit_replaces_vocabulary() {
        let mut vectorizer = FeatureVectorizer::new(no_stop_words());
        vectorizer.fit_transform(&["alpha beta"]);
        vectorizer.fit_transform(&["gamma"]);
        assert_eq!(vectorizer.vocabulary(), vec!["gamma"]);
    }

    #[test]
    fn rarer_terms_weigh_more() {
        let mut vectorizer = FeatureVectorizer::new(no_stop_words());
        let matrix = vectorizer.fit_transform(&["shoe red", "shoe blue", "shoe green"]);
        let v = &matrix[0];
        assert!(v.weights["red"] > v.weights["shoe"]);
    }

    #[test]
    fn merge_vectors_basic() {
        let mut w1 = HashMap::new();
        w1.insert("cat".into(), 0.5);
        w1.insert("dog".into(), 0.3);
        let v1 = TermVector { weights: w1 };

        let mut w2 = HashMap::new();
        w2.insert("cat".into(), 0.2);
        w2.insert("bird".into(), 0.4);
        let v2 = TermVector { weights: w2 };

        let merged = merge_vectors(&[&v1, &v2]);

        assert!((merged.weights["cat"] - 0.7).abs() < 0.001);
        assert!((merged.weights["dog"] - 0.3).abs() < 0.001);
        assert!((merged.weights["bird"] - 0.4).abs() < 0.001);
    }

    #[test]
    fn stop_word_locale_parses() {
        assert_eq!("pt".parse::<StopWordLocale>().unwrap(), StopWordLocale::Portuguese);
        assert_eq!("EN".parse::<StopWordLocale>().unwrap(), StopWordLocale::English);
        assert_eq!("none".parse::<StopWordLocale>().unwrap(), StopWordLocale::None);
        assert!("fr".parse::<StopWordLocale>().is_err());
        assert!(StopWordLocale::None.words().is_empty());
    }
}
