// ---------------------------------------------------------------------------
// Loader -- GoodReads JSON-lines dumps into BookRecords
// ---------------------------------------------------------------------------
//
// Three sources are read: genres per book, author names, and the books
// themselves. Each is newline-delimited JSON, optionally gzipped (detected
// by magic bytes). Blank optional fields become explicit unknowns; a book
// that references a missing genre entry or author id fails the whole load.
// ---------------------------------------------------------------------------

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use flate2::read::MultiGzDecoder;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::LibrarianError;
use crate::sequence::GenreOrder;
use crate::types::{BookRecord, LengthBucket, NO_INFORMATION};

// ---------------------------------------------------------------------------
// Raw line formats
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawGenreEntry {
	book_id: String,
	/// genre -> shelving count; only the keys are kept.
	#[serde(default)]
	genres: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawAuthor {
	author_id: String,
	#[serde(default)]
	name: String,
}

#[derive(Deserialize)]
struct RawAuthorRef {
	author_id: String,
}

#[derive(Deserialize)]
struct RawShelf {
	name: String,
}

#[derive(Deserialize)]
struct RawBook {
	book_id: String,
	#[serde(default)]
	isbn: String,
	#[serde(default)]
	title: String,
	#[serde(default)]
	authors: Vec<RawAuthorRef>,
	#[serde(default)]
	average_rating: String,
	#[serde(default)]
	ratings_count: String,
	#[serde(default)]
	num_pages: String,
	#[serde(default)]
	description: String,
	#[serde(default)]
	publication_year: String,
	#[serde(default)]
	url: String,
	#[serde(default)]
	image_url: String,
	#[serde(default)]
	popular_shelves: Vec<RawShelf>,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Genre ordering plus the genres of every book id.
#[derive(Debug, Default)]
pub struct GenreSource {
	pub order: GenreOrder,
	pub book_genres: HashMap<String, BTreeSet<String>>,
}

/// Check if data starts with gzip magic bytes (0x1f, 0x8b).
pub fn is_gzipped(data: &[u8]) -> bool {
	data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

/// Open a data file, transparently gunzipping it.
pub fn open_source(path: &Path) -> Result<Box<dyn BufRead>, LibrarianError> {
	let mut reader = BufReader::new(File::open(path)?);
	let gzipped = is_gzipped(reader.fill_buf()?);
	if gzipped {
		Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
	} else {
		Ok(Box::new(reader))
	}
}

/// Parse every non-blank line of `reader` as `T`, passing the 1-based line
/// number along.
fn for_each_record<T, R, F>(reader: R, mut f: F) -> Result<(), LibrarianError>
where
	T: DeserializeOwned,
	R: BufRead,
	F: FnMut(usize, T) -> Result<(), LibrarianError>,
{
	for (idx, line) in reader.lines().enumerate() {
		let line = line?;
		if line.trim().is_empty() {
			continue;
		}
		let record: T = serde_json::from_str(&line).map_err(|e| LibrarianError::InvalidRecord {
			line: idx + 1,
			reason: e.to_string(),
		})?;
		f(idx + 1, record)?;
	}
	Ok(())
}

/// Read the genre source. Genres get positions in first-seen order across
/// lines, and in sorted order within a line.
pub fn load_genres<R: BufRead>(reader: R) -> Result<GenreSource, LibrarianError> {
	let mut source = GenreSource::default();
	for_each_record(reader, |_, entry: RawGenreEntry| {
		let genres: BTreeSet<String> = entry.genres.keys().cloned().collect();
		for genre in &genres {
			source.order.register(genre);
		}
		source.book_genres.insert(entry.book_id, genres);
		Ok(())
	})?;
	Ok(source)
}

/// Read the author source into an id -> name map.
pub fn load_authors<R: BufRead>(reader: R) -> Result<HashMap<String, String>, LibrarianError> {
	let mut authors = HashMap::new();
	for_each_record(reader, |_, entry: RawAuthor| {
		authors.insert(entry.author_id, entry.name);
		Ok(())
	})?;
	Ok(authors)
}

/// Read the book source, resolving genres and author names.
pub fn load_books<R: BufRead>(
	reader: R,
	genres: &GenreSource,
	authors: &HashMap<String, String>,
) -> Result<Vec<BookRecord>, LibrarianError> {
	let mut books = Vec::new();
	for_each_record(reader, |line, raw: RawBook| {
		books.push(build_record(line, raw, genres, authors)?);
		Ok(())
	})?;
	Ok(books)
}

fn build_record(
	line: usize,
	raw: RawBook,
	genres: &GenreSource,
	authors: &HashMap<String, String>,
) -> Result<BookRecord, LibrarianError> {
	let book_genres = genres
		.book_genres
		.get(&raw.book_id)
		.cloned()
		.ok_or_else(|| LibrarianError::MissingGenres(raw.book_id.clone()))?;

	let mut names = Vec::with_capacity(raw.authors.len().max(1));
	for author in &raw.authors {
		let name = authors
			.get(&author.author_id)
			.ok_or_else(|| LibrarianError::MissingAuthor(author.author_id.clone()))?;
		names.push(name.clone());
	}
	if names.is_empty() {
		names.push(String::new());
	}

	let average_rating = parse_rating(&raw.average_rating, line)?;
	let ratings_count = parse_optional::<u64>(&raw.ratings_count, "ratings_count", line)?;
	let pages = parse_optional::<u32>(&raw.num_pages, "num_pages", line)?;

	let isbn = if raw.isbn.trim().is_empty() {
		NO_INFORMATION.to_string()
	} else {
		raw.isbn
	};

	Ok(BookRecord {
		book_id: raw.book_id,
		isbn,
		title: raw.title,
		authors: names,
		genres: book_genres,
		tags: raw.popular_shelves.into_iter().map(|s| s.name).collect(),
		average_rating,
		ratings_count,
		length: LengthBucket::from_pages(pages),
		description: raw.description,
		pub_year: raw.publication_year,
		book_url: raw.url,
		image_url: raw.image_url,
	})
}

/// Blank means unknown; anything else must parse.
fn parse_optional<T: FromStr>(raw: &str, field: &str, line: usize) -> Result<Option<T>, LibrarianError> {
	let trimmed = raw.trim();
	if trimmed.is_empty() {
		return Ok(None);
	}
	trimmed.parse::<T>().map(Some).map_err(|_| LibrarianError::InvalidRecord {
		line,
		reason: format!("{} is not a number: {:?}", field, trimmed),
	})
}

/// Like [`parse_optional`], but "NaN" and the infinities are rejected too.
fn parse_rating(raw: &str, line: usize) -> Result<Option<f64>, LibrarianError> {
	match parse_optional::<f64>(raw, "average_rating", line)? {
		Some(r) if !r.is_finite() => Err(LibrarianError::InvalidRecord {
			line,
			reason: format!("average_rating is not finite: {:?}", raw.trim()),
		}),
		rating => Ok(rating),
	}
}
