// ---------------------------------------------------------------------------
// Sequencer -- book attributes to catalog index key paths
// ---------------------------------------------------------------------------
//
// A key sequence is `[rating, length, genre_0, ..., genre_{k-1}]` followed by
// the book itself. The genre bits follow the `GenreOrder` fixed at load time;
// that ordering is also what a filter bit-vector is decoded against.
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use crate::tree::NodeValue;
use crate::types::{BookId, BookRecord};

/// Width of the rating group at the front of a filter bit-vector.
pub const RATING_BITS: usize = 5;
/// Width of the length group that follows the rating group.
pub const LENGTH_BITS: usize = 3;

/// Full width of a filter bit-vector over `genre_count` genres.
pub fn filter_width(genre_count: usize) -> usize {
	RATING_BITS + LENGTH_BITS + genre_count
}

// ---------------------------------------------------------------------------
// GenreOrder
// ---------------------------------------------------------------------------

/// Genre label to bit position, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct GenreOrder {
	labels: Vec<String>,
	positions: HashMap<String, usize>,
}

impl GenreOrder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `label` if unseen and return its position.
	pub fn register(&mut self, label: &str) -> usize {
		if let Some(&pos) = self.positions.get(label) {
			return pos;
		}
		let pos = self.labels.len();
		self.labels.push(label.to_string());
		self.positions.insert(label.to_string(), pos);
		pos
	}

	pub fn position(&self, label: &str) -> Option<usize> {
		self.positions.get(label).copied()
	}

	pub fn label(&self, position: usize) -> Option<&str> {
		self.labels.get(position).map(String::as_str)
	}

	pub fn labels(&self) -> &[String] {
		&self.labels
	}

	pub fn len(&self) -> usize {
		self.labels.len()
	}

	pub fn is_empty(&self) -> bool {
		self.labels.is_empty()
	}

	/// Full width of a filter bit-vector for this ordering.
	pub fn filter_width(&self) -> usize {
		filter_width(self.len())
	}
}

impl<S: AsRef<str>> FromIterator<S> for GenreOrder {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		let mut order = GenreOrder::new();
		for label in iter {
			order.register(label.as_ref());
		}
		order
	}
}

// ---------------------------------------------------------------------------
// Sequencing
// ---------------------------------------------------------------------------

/// Attribute keys of `book`: rating bucket, length bucket, one bit per genre.
pub fn attribute_keys(book: &BookRecord, order: &GenreOrder) -> Vec<i32> {
	let mut keys = Vec::with_capacity(2 + order.len());
	keys.push(book.rating_bucket());
	keys.push(book.length.key());
	for label in order.labels() {
		keys.push(i32::from(book.genres.contains(label)));
	}
	keys
}

/// Insertion path for `book`: its attribute keys with the book appended as
/// the final value.
pub fn sequence(book: &BookRecord, id: BookId, order: &GenreOrder) -> Vec<NodeValue> {
	let mut path: Vec<NodeValue> = attribute_keys(book, order)
		.into_iter()
		.map(NodeValue::Key)
		.collect();
	path.push(NodeValue::Book(id));
	path
}

/// The filter bit-vector that selects exactly `book`'s rating, length and
/// genres.
pub fn filter_bits_for(book: &BookRecord, order: &GenreOrder) -> Vec<u8> {
	let mut bits = vec![0u8; order.filter_width()];
	let rating = book.rating_bucket();
	if rating >= 1 {
		bits[rating as usize - 1] = 1;
	}
	let length = book.length.key();
	if length >= 1 {
		bits[RATING_BITS + length as usize - 1] = 1;
	}
	for (i, label) in order.labels().iter().enumerate() {
		if book.genres.contains(label) {
			bits[RATING_BITS + LENGTH_BITS + i] = 1;
		}
	}
	bits
}
