// ---------------------------------------------------------------------------
// Catalog -- loaded books, their genre ordering and the index over them
// ---------------------------------------------------------------------------
//
// Built once, read-only afterwards. Every query hands back borrowed
// `BookRecord`s in the order the caller asked for.
// ---------------------------------------------------------------------------

use std::collections::HashMap;
use std::path::Path;

use crate::error::LibrarianError;
use crate::library::Library;
use crate::loader::{load_authors, load_books, load_genres, open_source};
use crate::sequence::{sequence, GenreOrder};
use crate::similarity::similarity;
use crate::sort::sort_books;
use crate::tree::CatalogIndex;
use crate::types::{BookId, BookRecord, SortCriterion};

/// Insert every book's key path into a fresh index.
pub fn build_index(books: &[BookRecord], order: &GenreOrder) -> CatalogIndex {
	let mut index = CatalogIndex::new(order.len());
	for (pos, book) in books.iter().enumerate() {
		index.insert(&sequence(book, BookId(pos), order));
	}
	index
}

pub struct Catalog {
	books: Vec<BookRecord>,
	order: GenreOrder,
	index: CatalogIndex,
	/// GoodReads book id -> position. First occurrence wins.
	by_book_id: HashMap<String, BookId>,
}

impl Catalog {
	/// Index `books` under `order`.
	pub fn new(books: Vec<BookRecord>, order: GenreOrder) -> Self {
		let index = build_index(&books, &order);
		let mut by_book_id = HashMap::with_capacity(books.len());
		for (pos, book) in books.iter().enumerate() {
			if by_book_id.contains_key(&book.book_id) {
				tracing::warn!(book_id = %book.book_id, "duplicate book id in catalog");
				continue;
			}
			by_book_id.insert(book.book_id.clone(), BookId(pos));
		}
		tracing::info!(
			books = books.len(),
			genres = order.len(),
			nodes = index.node_count(),
			"catalog indexed"
		);
		Self {
			books,
			order,
			index,
			by_book_id,
		}
	}

	/// Load and index the three GoodReads sources.
	pub fn load(genres: &Path, authors: &Path, books: &Path) -> Result<Self, LibrarianError> {
		let genre_source = load_genres(open_source(genres)?)?;
		let author_names = load_authors(open_source(authors)?)?;
		tracing::info!(
			genres = genre_source.order.len(),
			authors = author_names.len(),
			"catalog sources read"
		);
		let records = load_books(open_source(books)?, &genre_source, &author_names)?;
		Ok(Self::new(records, genre_source.order))
	}

	pub fn len(&self) -> usize {
		self.books.len()
	}

	pub fn is_empty(&self) -> bool {
		self.books.is_empty()
	}

	pub fn genre_order(&self) -> &GenreOrder {
		&self.order
	}

	pub fn index(&self) -> &CatalogIndex {
		&self.index
	}

	pub fn get(&self, id: BookId) -> Option<&BookRecord> {
		self.books.get(id.0)
	}

	pub fn find_by_book_id(&self, book_id: &str) -> Option<BookId> {
		self.by_book_id.get(book_id).copied()
	}

	/// Like [`find_by_book_id`](Self::find_by_book_id), failing with
	/// `BookNotFound`.
	pub fn require(&self, book_id: &str) -> Result<BookId, LibrarianError> {
		self.find_by_book_id(book_id)
			.ok_or_else(|| LibrarianError::BookNotFound(book_id.to_string()))
	}

	/// Books of `library`, in saved order.
	pub fn saved_books(&self, library: &Library) -> Vec<&BookRecord> {
		self.resolve(library.iter())
	}

	fn resolve(&self, ids: impl IntoIterator<Item = BookId>) -> Vec<&BookRecord> {
		ids.into_iter().filter_map(|id| self.get(id)).collect()
	}

	/// Filter through the index, then order the matches by `criterion`
	/// with `library` as the similarity reference.
	pub fn filter_and_collect(
		&self,
		bits: &[u8],
		criterion: SortCriterion,
		library: &Library,
	) -> Result<Vec<&BookRecord>, LibrarianError> {
		let mut matches = self.resolve(self.index.filter(bits)?);
		sort_books(&mut matches, criterion, &self.saved_books(library));
		Ok(matches)
	}

	/// Exact attribute-key lookup.
	pub fn lookup(&self, keys: &[i32]) -> Vec<&BookRecord> {
		self.resolve(self.index.get(keys))
	}

	/// Attribute-key lookup tolerating up to `n` mismatched levels.
	pub fn lookup_near(&self, keys: &[i32], n: usize) -> Vec<&BookRecord> {
		self.resolve(self.index.get_differ_by(keys, n))
	}

	/// Books whose title contains `query`, ignoring case, in catalog order.
	pub fn search_title(&self, query: &str) -> Vec<&BookRecord> {
		let needle = query.to_lowercase();
		self.books
			.iter()
			.filter(|b| b.title.to_lowercase().contains(&needle))
			.collect()
	}

	/// Every other book, most similar to `id` first, at most `limit`.
	pub fn similar_to(&self, id: BookId, limit: usize) -> Result<Vec<&BookRecord>, LibrarianError> {
		let target = self
			.get(id)
			.ok_or_else(|| LibrarianError::BookNotFound(id.0.to_string()))?;
		let mut scored: Vec<(f64, &BookRecord)> = self
			.books
			.iter()
			.enumerate()
			.filter(|&(pos, _)| pos != id.0)
			.map(|(_, book)| (similarity(target, book), book))
			.collect();
		scored.sort_by(|a, b| b.0.total_cmp(&a.0));
		Ok(scored.into_iter().take(limit).map(|(_, book)| book).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sequence::{attribute_keys, filter_bits_for};
	use crate::types::test_book;

	/// A(5, fantasy), B(3, fantasy+scifi), C(1, romance).
	fn three_books() -> Catalog {
		let books = vec![
			test_book("A", 5.0, &["fantasy"]),
			test_book("B", 3.0, &["fantasy", "scifi"]),
			test_book("C", 1.0, &["romance"]),
		];
		let order: GenreOrder = ["fantasy", "scifi", "romance"].into_iter().collect();
		Catalog::new(books, order)
	}

	fn ids(books: &[&BookRecord]) -> Vec<String> {
		books.iter().map(|b| b.book_id.clone()).collect()
	}

	#[test]
	fn rating_five_or_three_with_fantasy_sorted_by_rating() {
		let catalog = three_books();
		let bits = [0, 0, 1, 0, 1, 0, 0, 0, 1, 0, 0];
		let result = catalog
			.filter_and_collect(&bits, SortCriterion::AverageRating, &Library::new())
			.unwrap();
		assert_eq!(ids(&result), vec!["A", "B"]);
	}

	#[test]
	fn empty_filter_returns_whole_catalog() {
		let catalog = three_books();
		let result = catalog
			.filter_and_collect(&[0; 11], SortCriterion::Title, &Library::new())
			.unwrap();
		assert_eq!(ids(&result), vec!["A", "B", "C"]);
	}

	#[test]
	fn every_book_round_trips_through_its_own_filter() {
		let catalog = three_books();
		for pos in 0..catalog.len() {
			let book = catalog.get(BookId(pos)).unwrap();
			let bits = filter_bits_for(book, catalog.genre_order());
			let hits = catalog
				.filter_and_collect(&bits, SortCriterion::Popularity, &Library::new())
				.unwrap();
			assert!(hits.iter().any(|b| b.book_id == book.book_id));
		}
	}

	#[test]
	fn two_required_genres_need_both() {
		let catalog = three_books();
		let bits = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0];
		let result = catalog
			.filter_and_collect(&bits, SortCriterion::Title, &Library::new())
			.unwrap();
		assert_eq!(ids(&result), vec!["B"]);
	}

	#[test]
	fn similarity_sort_uses_saved_library() {
		let catalog = three_books();
		let mut library = Library::new();
		library.add(catalog.require("A").unwrap());
		let result = catalog
			.filter_and_collect(&[], SortCriterion::Similarity, &library)
			.unwrap();
		// B shares fantasy with A; A itself is skipped and scores 0
		assert_eq!(ids(&result), vec!["B", "A", "C"]);
	}

	#[test]
	fn duplicate_book_id_is_still_compared_against_library() {
		let mut second = test_book("A", 2.0, &["fantasy"]);
		second.title = "Second A".into();
		let books = vec![test_book("A", 5.0, &["fantasy"]), second, test_book("C", 1.0, &["romance"])];
		let order: GenreOrder = ["fantasy", "romance"].into_iter().collect();
		let catalog = Catalog::new(books, order);
		let mut library = Library::new();
		library.add(BookId(0));
		let result = catalog
			.filter_and_collect(&[], SortCriterion::Similarity, &library)
			.unwrap();
		assert_eq!(result[0].title, "Second A");
	}

	#[test]
	fn lookup_by_attribute_keys() {
		let catalog = three_books();
		let b = catalog.get(BookId(1)).unwrap();
		let keys = attribute_keys(b, catalog.genre_order());
		assert_eq!(ids(&catalog.lookup(&keys)), vec!["B"]);
		// A differs from B on rating and scifi only
		assert_eq!(ids(&catalog.lookup_near(&keys, 2)), vec!["A", "B"]);
	}

	#[test]
	fn search_title_ignores_case() {
		let catalog = three_books();
		assert_eq!(ids(&catalog.search_title("book b")), vec!["B"]);
		assert_eq!(catalog.search_title("BOOK").len(), 3);
		assert!(catalog.search_title("dune").is_empty());
	}

	#[test]
	fn similar_to_excludes_itself() {
		let catalog = three_books();
		let a = catalog.require("A").unwrap();
		let similar = catalog.similar_to(a, 5).unwrap();
		assert_eq!(ids(&similar), vec!["B", "C"]);
		assert_eq!(catalog.similar_to(a, 1).unwrap().len(), 1);
	}

	#[test]
	fn unknown_book_id_is_not_found() {
		let catalog = three_books();
		assert!(matches!(catalog.require("Z"), Err(LibrarianError::BookNotFound(_))));
		assert!(catalog.similar_to(BookId(40), 3).is_err());
	}

	#[test]
	fn duplicate_book_ids_resolve_to_first() {
		let books = vec![test_book("A", 5.0, &[]), test_book("A", 2.0, &[])];
		let catalog = Catalog::new(books, GenreOrder::new());
		assert_eq!(catalog.find_by_book_id("A"), Some(BookId(0)));
		assert_eq!(catalog.len(), 2);
	}

	#[test]
	fn load_reads_all_three_sources() {
		let dir = tempfile::tempdir().unwrap();
		let genres = dir.path().join("genres.json");
		let authors = dir.path().join("authors.json");
		let books = dir.path().join("books.json");
		std::fs::write(&genres, "{\"book_id\": \"1\", \"genres\": {\"poetry\": 3}}\n").unwrap();
		std::fs::write(&authors, "{\"author_id\": \"5\", \"name\": \"Mary Oliver\"}\n").unwrap();
		std::fs::write(
			&books,
			"{\"book_id\": \"1\", \"title\": \"Devotions\", \"authors\": [{\"author_id\": \"5\"}], \"average_rating\": \"4.6\", \"num_pages\": \"480\"}\n",
		)
		.unwrap();
		let catalog = Catalog::load(&genres, &authors, &books).unwrap();
		assert_eq!(catalog.len(), 1);
		assert_eq!(catalog.genre_order().labels(), &["poetry".to_string()]);
		assert_eq!(catalog.index().book_count(), 1);
	}
}
