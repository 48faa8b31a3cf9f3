use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Placeholder isbn for records that carry none.
pub const NO_INFORMATION: &str = "no information";

/// Position of a book inside its [`Catalog`](crate::catalog::Catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub usize);

/// Page-count bucket. The discriminant is the key used on the length
/// level of the catalog index; `Unknown` is never selected by a length bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthBucket {
	Unknown = 0,
	Short = 1,
	Medium = 2,
	Long = 3,
}

impl LengthBucket {
	/// 0-200 pages is short, 201-500 medium, anything above long.
	pub fn from_pages(pages: Option<u32>) -> Self {
		match pages {
			None => Self::Unknown,
			Some(0..=200) => Self::Short,
			Some(201..=500) => Self::Medium,
			Some(_) => Self::Long,
		}
	}

	pub fn key(self) -> i32 {
		self as i32
	}
}

/// One catalog entry. Built once by the loader and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
	pub book_id: String,
	pub isbn: String,
	pub title: String,
	/// Never empty; holds a single `""` when the source lists no author.
	pub authors: Vec<String>,
	pub genres: BTreeSet<String>,
	/// Free-text shelf names.
	pub tags: BTreeSet<String>,
	pub average_rating: Option<f64>,
	pub ratings_count: Option<u64>,
	pub length: LengthBucket,
	pub description: String,
	pub pub_year: String,
	pub book_url: String,
	pub image_url: String,
}

impl BookRecord {
	/// First listed author, used for author ordering.
	pub fn primary_author(&self) -> &str {
		self.authors.first().map(String::as_str).unwrap_or("")
	}

	/// Rating bucket 1-5, or 0 when the rating is unknown or rounds
	/// outside that range.
	pub fn rating_bucket(&self) -> i32 {
		match self.average_rating {
			Some(r) if r.is_finite() => {
				let rounded = r.round() as i32;
				if (1..=5).contains(&rounded) { rounded } else { 0 }
			}
			_ => 0,
		}
	}
}

/// Named orderings a result list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortCriterion {
	#[default]
	Similarity,
	Popularity,
	AverageRating,
	Author,
	PublicationYear,
	Title,
}

#[cfg(test)]
pub(crate) fn test_book(book_id: &str, rating: f64, genres: &[&str]) -> BookRecord {
	BookRecord {
		book_id: book_id.to_string(),
		isbn: NO_INFORMATION.to_string(),
		title: format!("Book {}", book_id),
		authors: vec![String::new()],
		genres: genres.iter().map(|g| g.to_string()).collect(),
		tags: BTreeSet::new(),
		average_rating: Some(rating),
		ratings_count: None,
		length: LengthBucket::Medium,
		description: String::new(),
		pub_year: String::new(),
		book_url: String::new(),
		image_url: String::new(),
	}
}
