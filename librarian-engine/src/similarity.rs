use std::collections::HashSet;

use crate::types::BookRecord;

/// Jaccard index of two label sets. Returns 0.0 when either side is empty.
pub fn jaccard_similarity(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
	if a.is_empty() || b.is_empty() {
		return 0.0;
	}
	let intersection = a.intersection(b).count();
	let union = a.len() + b.len() - intersection;
	intersection as f64 / union as f64
}

/// Genre and shelf labels of a book, merged.
pub fn feature_set(book: &BookRecord) -> HashSet<&str> {
	book.genres
		.iter()
		.chain(book.tags.iter())
		.map(String::as_str)
		.collect()
}

/// Jaccard similarity over the union of each book's genres and tags.
pub fn similarity(a: &BookRecord, b: &BookRecord) -> f64 {
	jaccard_similarity(&feature_set(a), &feature_set(b))
}

/// Feature sets of a reference list, built once and scored against any
/// number of books.
pub struct ReferenceFeatures<'a> {
	entries: Vec<(&'a BookRecord, HashSet<&'a str>)>,
}

impl<'a> ReferenceFeatures<'a> {
	pub fn new(reference: &[&'a BookRecord]) -> Self {
		Self {
			entries: reference.iter().map(|&b| (b, feature_set(b))).collect(),
		}
	}

	/// Mean similarity of `book` against every other record in the
	/// reference. The record itself is skipped if present; records are
	/// matched by identity, so a different record sharing its book id still
	/// counts. Returns 0.0 when nothing is left to compare against.
	pub fn average(&self, book: &BookRecord) -> f64 {
		let features = feature_set(book);
		let mut total = 0.0;
		let mut count = 0usize;
		for (other, other_features) in &self.entries {
			if std::ptr::eq(*other, book) {
				continue;
			}
			total += jaccard_similarity(&features, other_features);
			count += 1;
		}
		if count == 0 { 0.0 } else { total / count as f64 }
	}
}

/// Mean similarity of `book` against every other record in `reference`.
/// See [`ReferenceFeatures::average`].
pub fn average_similarity(book: &BookRecord, reference: &[&BookRecord]) -> f64 {
	ReferenceFeatures::new(reference).average(book)
}
