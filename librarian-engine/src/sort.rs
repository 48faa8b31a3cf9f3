// ---------------------------------------------------------------------------
// Sorter -- orders result lists by a named criterion
// ---------------------------------------------------------------------------
//
// All orderings are stable. Unknown values (missing rating, missing ratings
// count, non-numeric publication year) compare as lower than any known
// value: they come last under the descending criteria and first under the
// ascending ones.
// ---------------------------------------------------------------------------

use std::cmp::Ordering;

use crate::similarity::ReferenceFeatures;
use crate::types::{BookRecord, SortCriterion};

/// Sort `books` in place. `reference` is the saved-books library, only
/// consulted for [`SortCriterion::Similarity`].
pub fn sort_books(books: &mut Vec<&BookRecord>, criterion: SortCriterion, reference: &[&BookRecord]) {
	tracing::debug!(?criterion, count = books.len(), "sorting books");
	match criterion {
		SortCriterion::Similarity => sort_by_similarity(books, reference),
		SortCriterion::Popularity => books.sort_by(|a, b| b.ratings_count.cmp(&a.ratings_count)),
		SortCriterion::AverageRating => {
			books.sort_by(|a, b| compare_rating(b.average_rating, a.average_rating))
		}
		SortCriterion::Author => books.sort_by(|a, b| a.primary_author().cmp(b.primary_author())),
		SortCriterion::PublicationYear => books.sort_by(|a, b| compare_year(&a.pub_year, &b.pub_year)),
		SortCriterion::Title => books.sort_by(|a, b| a.title.cmp(&b.title)),
	}
}

/// Descending average similarity to `reference`. Reference feature sets are
/// built once and each book is scored once.
fn sort_by_similarity(books: &mut Vec<&BookRecord>, reference: &[&BookRecord]) {
	let reference = ReferenceFeatures::new(reference);
	let mut scored: Vec<(f64, &BookRecord)> = books
		.iter()
		.map(|&book| (reference.average(book), book))
		.collect();
	scored.sort_by(|a, b| b.0.total_cmp(&a.0));
	books.clear();
	books.extend(scored.into_iter().map(|(_, book)| book));
}

fn compare_rating(a: Option<f64>, b: Option<f64>) -> Ordering {
	match (a, b) {
		(Some(x), Some(y)) => x.total_cmp(&y),
		(a, b) => a.is_some().cmp(&b.is_some()),
	}
}

fn compare_year(a: &str, b: &str) -> Ordering {
	match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
		(Ok(x), Ok(y)) => x.cmp(&y),
		(Ok(_), Err(_)) => Ordering::Greater,
		(Err(_), Ok(_)) => Ordering::Less,
		(Err(_), Err(_)) => a.cmp(b),
	}
}
