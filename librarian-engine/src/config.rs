use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
	name = "librarian-engine",
	about = "GoodReads catalog filter and recommendation server over JSON-RPC 2.0 / NDJSON stdio"
)]
pub struct CliArgs {
	/// Genre source: JSON lines of {book_id, genres}, optionally gzipped
	#[arg(long, env = "LIBRARIAN_GENRES")]
	pub genres: Option<PathBuf>,

	/// Author source: JSON lines of {author_id, name}, optionally gzipped
	#[arg(long, env = "LIBRARIAN_AUTHORS")]
	pub authors: Option<PathBuf>,

	/// Book source: GoodReads book records, optionally gzipped
	#[arg(long, env = "LIBRARIAN_BOOKS")]
	pub books: Option<PathBuf>,

	/// Default size of the similar-books panel
	#[arg(long, default_value = "5")]
	pub similar_limit: usize,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, default_value = "info", env = "LIBRARIAN_LOG_LEVEL")]
	pub log_level: String,
}

impl CliArgs {
	/// The three source paths, when all of them were given.
	pub fn sources(&self) -> Option<CatalogSources> {
		Some(CatalogSources {
			genres: self.genres.clone()?,
			authors: self.authors.clone()?,
			books: self.books.clone()?,
		})
	}
}

/// Paths of the files a catalog is loaded from.
#[derive(Debug, Clone)]
pub struct CatalogSources {
	pub genres: PathBuf,
	pub authors: PathBuf,
	pub books: PathBuf,
}
