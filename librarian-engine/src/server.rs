// ---------------------------------------------------------------------------
// LibrarianServer -- JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Routes incoming JSON-RPC 2.0 requests (NDJSON over stdin) to catalog,
// similarity and saved-library operations. A `run()` loop, a `dispatch()`
// match, `with_catalog` accessors, and free-standing handler functions for
// each method.
// ---------------------------------------------------------------------------

use std::io::{self, BufRead};
use std::path::PathBuf;

use serde::Deserialize;

use crate::catalog::Catalog;
use crate::config::CatalogSources;
use crate::error::LibrarianError;
use crate::library::Library;
use crate::protocol::*;
use crate::similarity::{average_similarity, similarity};
use crate::sort::sort_books;
use crate::transport::NdjsonTransport;
use crate::types::{BookRecord, SortCriterion};

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// JSON-RPC server over one [`Catalog`] and the user's saved [`Library`].
pub struct LibrarianServer {
	transport: NdjsonTransport,
	catalog: Option<Catalog>,
	library: Library,
	similar_limit: usize,
}

impl LibrarianServer {
	/// Create a server with no catalog; one is loaded by `catalog/load` or
	/// [`load_catalog`](Self::load_catalog).
	pub fn new(transport: NdjsonTransport, similar_limit: usize) -> Self {
		Self {
			transport,
			catalog: None,
			library: Library::new(),
			similar_limit,
		}
	}

	/// Replace the catalog. Saved books refer to the old catalog and are
	/// dropped.
	pub fn load_catalog(&mut self, sources: &CatalogSources) -> Result<&Catalog, LibrarianError> {
		let catalog = Catalog::load(&sources.genres, &sources.authors, &sources.books)?;
		self.library.clear();
		Ok(self.catalog.insert(catalog))
	}

	/// Main loop: read JSON-RPC messages from stdin, dispatch to handlers.
	pub fn run(&mut self) -> Result<(), LibrarianError> {
		let stdin = io::stdin();
		let reader = stdin.lock();

		for line_result in reader.lines() {
			let line = line_result?;
			if line.trim().is_empty() {
				continue;
			}

			let request: JsonRpcRequest = match serde_json::from_str(&line) {
				Ok(r) => r,
				Err(e) => {
					tracing::error!("Failed to parse request: {}", e);
					continue;
				}
			};

			self.dispatch(request);
		}

		Ok(())
	}

	// ── Dispatch ──────────────────────────────────────────────────────────

	fn dispatch(&mut self, req: JsonRpcRequest) {
		let id = req.id;
		let result = match req.method.as_str() {
			// -- Catalog -------------------------------------------------
			"catalog/load" => self.handle_load(req.params),
			"catalog/size" => self.with_catalog(|c| Ok(serde_json::json!({ "count": c.len() }))),
			"catalog/genres" => self.with_catalog(|c| {
				Ok(serde_json::json!({
					"genres": c.genre_order().labels(),
					"filterWidth": c.index().filter_width(),
				}))
			}),
			"catalog/getBook" => self.with_catalog(|c| handle_get_book(c, req.params)),
			"catalog/filter" => {
				let library = &self.library;
				self.with_catalog(|c| handle_filter(c, library, req.params))
			}
			"catalog/sort" => {
				let library = &self.library;
				self.with_catalog(|c| handle_sort(c, library, req.params))
			}
			"catalog/searchTitle" => self.with_catalog(|c| handle_search_title(c, req.params)),
			"catalog/similar" => {
				let limit = self.similar_limit;
				self.with_catalog(|c| handle_similar(c, limit, req.params))
			}
			"catalog/lookup" => self.with_catalog(|c| handle_lookup(c, req.params)),
			"catalog/lookupNear" => self.with_catalog(|c| handle_lookup_near(c, req.params)),

			// -- Similarity ----------------------------------------------
			"similarity/score" => self.with_catalog(|c| handle_score(c, req.params)),
			"similarity/average" => {
				let library = &self.library;
				self.with_catalog(|c| handle_average(c, library, req.params))
			}

			// -- Saved library -------------------------------------------
			"library/add" => match &self.catalog {
				Some(c) => handle_library_add(c, &mut self.library, req.params),
				None => Err(LibrarianError::NotLoaded),
			},
			"library/remove" => match &self.catalog {
				Some(c) => handle_library_remove(c, &mut self.library, req.params),
				None => Err(LibrarianError::NotLoaded),
			},
			"library/list" => {
				let library = &self.library;
				self.with_catalog(|c| Ok(serde_json::json!({ "books": c.saved_books(library) })))
			}
			"library/clear" => {
				self.library.clear();
				Ok(serde_json::json!({}))
			}

			// -- Unknown -------------------------------------------------
			_ => {
				tracing::warn!(method = %req.method, "unknown method");
				self.transport.write_error(
					id,
					METHOD_NOT_FOUND,
					format!("Unknown method: {}", req.method),
					None,
				);
				return;
			}
		};

		match result {
			Ok(value) => self.transport.write_response(id, value),
			Err(e) => self.transport.write_error(
				id,
				LIBRARIAN_ERROR,
				e.to_string(),
				Some(e.to_json_rpc_error()),
			),
		}
	}

	// ── Catalog accessor ──────────────────────────────────────────────────

	fn with_catalog<F>(&self, f: F) -> Result<serde_json::Value, LibrarianError>
	where
		F: FnOnce(&Catalog) -> Result<serde_json::Value, LibrarianError>,
	{
		match &self.catalog {
			Some(c) => f(c),
			None => Err(LibrarianError::NotLoaded),
		}
	}

	// ── Load ──────────────────────────────────────────────────────────────

	fn handle_load(&mut self, params: serde_json::Value) -> Result<serde_json::Value, LibrarianError> {
		let p: LoadParams = parse_params(params)?;
		let sources = CatalogSources {
			genres: p.genres_path,
			authors: p.authors_path,
			books: p.books_path,
		};
		let catalog = self.load_catalog(&sources)?;
		Ok(serde_json::json!({
			"books": catalog.len(),
			"genres": catalog.genre_order().len(),
		}))
	}
}

// ---------------------------------------------------------------------------
// Param types
// ---------------------------------------------------------------------------

fn parse_params<T: serde::de::DeserializeOwned>(
	params: serde_json::Value,
) -> Result<T, LibrarianError> {
	serde_json::from_value(params)
		.map_err(|e| LibrarianError::Serialization(format!("Invalid params: {}", e)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadParams {
	genres_path: PathBuf,
	authors_path: PathBuf,
	books_path: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookIdParams {
	book_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterParams {
	bits: Vec<u8>,
	#[serde(default)]
	sort_by: SortCriterion,
	max_results: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SortParams {
	book_ids: Vec<String>,
	sort_by: SortCriterion,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchTitleParams {
	query: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimilarParams {
	book_id: String,
	max_results: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupParams {
	keys: Vec<i32>,
	#[serde(default)]
	max_diff: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreParams {
	book_id: String,
	other_id: String,
}

// ---------------------------------------------------------------------------
// Free-standing handler functions
// ---------------------------------------------------------------------------

fn books_json(books: &[&BookRecord]) -> serde_json::Value {
	serde_json::json!({ "books": books })
}

fn handle_get_book(
	catalog: &Catalog,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: BookIdParams = parse_params(params)?;
	let book = catalog.get(catalog.require(&p.book_id)?);
	Ok(serde_json::json!({ "book": book }))
}

fn handle_filter(
	catalog: &Catalog,
	library: &Library,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: FilterParams = parse_params(params)?;
	let mut books = catalog.filter_and_collect(&p.bits, p.sort_by, library)?;
	let total = books.len();
	if let Some(max) = p.max_results {
		books.truncate(max);
	}
	Ok(serde_json::json!({ "total": total, "books": books }))
}

fn handle_sort(
	catalog: &Catalog,
	library: &Library,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: SortParams = parse_params(params)?;
	let mut books = Vec::with_capacity(p.book_ids.len());
	for book_id in &p.book_ids {
		if let Some(book) = catalog.get(catalog.require(book_id)?) {
			books.push(book);
		}
	}
	sort_books(&mut books, p.sort_by, &catalog.saved_books(library));
	Ok(books_json(&books))
}

fn handle_search_title(
	catalog: &Catalog,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: SearchTitleParams = parse_params(params)?;
	Ok(books_json(&catalog.search_title(&p.query)))
}

fn handle_similar(
	catalog: &Catalog,
	default_limit: usize,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: SimilarParams = parse_params(params)?;
	let id = catalog.require(&p.book_id)?;
	let books = catalog.similar_to(id, p.max_results.unwrap_or(default_limit))?;
	Ok(books_json(&books))
}

fn handle_lookup(
	catalog: &Catalog,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: LookupParams = parse_params(params)?;
	Ok(books_json(&catalog.lookup(&p.keys)))
}

fn handle_lookup_near(
	catalog: &Catalog,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: LookupParams = parse_params(params)?;
	Ok(books_json(&catalog.lookup_near(&p.keys, p.max_diff)))
}

fn handle_score(
	catalog: &Catalog,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: ScoreParams = parse_params(params)?;
	let a = catalog.get(catalog.require(&p.book_id)?);
	let b = catalog.get(catalog.require(&p.other_id)?);
	let score = match (a, b) {
		(Some(a), Some(b)) => similarity(a, b),
		_ => 0.0,
	};
	Ok(serde_json::json!({ "score": score }))
}

fn handle_average(
	catalog: &Catalog,
	library: &Library,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: BookIdParams = parse_params(params)?;
	let score = match catalog.get(catalog.require(&p.book_id)?) {
		Some(book) => average_similarity(book, &catalog.saved_books(library)),
		None => 0.0,
	};
	Ok(serde_json::json!({ "score": score }))
}

fn handle_library_add(
	catalog: &Catalog,
	library: &mut Library,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: BookIdParams = parse_params(params)?;
	let added = library.add(catalog.require(&p.book_id)?);
	Ok(serde_json::json!({ "added": added }))
}

fn handle_library_remove(
	catalog: &Catalog,
	library: &mut Library,
	params: serde_json::Value,
) -> Result<serde_json::Value, LibrarianError> {
	let p: BookIdParams = parse_params(params)?;
	library.remove(catalog.require(&p.book_id)?, &p.book_id)?;
	Ok(serde_json::json!({}))
}
