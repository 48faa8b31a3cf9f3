use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibrarianError {
	#[error("Catalog not loaded: call catalog/load first")]
	NotLoaded,
	#[error("No genre entry for book: {0}")]
	MissingGenres(String),
	#[error("Unknown author id: {0}")]
	MissingAuthor(String),
	#[error("Invalid record on line {line}: {reason}")]
	InvalidRecord { line: usize, reason: String },
	#[error("Invalid filter: {0}")]
	InvalidFilter(String),
	#[error("Book not found: {0}")]
	BookNotFound(String),
	#[error("Book is not in the library: {0}")]
	NotInLibrary(String),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Serialization error: {0}")]
	Serialization(String),
}

impl LibrarianError {
	pub fn code(&self) -> &str {
		match self {
			Self::NotLoaded => "LIBRARIAN_NOT_LOADED",
			Self::MissingGenres(_) => "LIBRARIAN_MISSING_GENRES",
			Self::MissingAuthor(_) => "LIBRARIAN_MISSING_AUTHOR",
			Self::InvalidRecord { .. } => "LIBRARIAN_INVALID_RECORD",
			Self::InvalidFilter(_) => "LIBRARIAN_INVALID_FILTER",
			Self::BookNotFound(_) => "LIBRARIAN_BOOK_NOT_FOUND",
			Self::NotInLibrary(_) => "LIBRARIAN_NOT_IN_LIBRARY",
			Self::Io(_) => "LIBRARIAN_IO",
			Self::Serialization(_) => "LIBRARIAN_SERIALIZATION",
		}
	}

	pub fn to_json_rpc_error(&self) -> serde_json::Value {
		serde_json::json!({
			"librarianCode": self.code(),
			"message": self.to_string(),
		})
	}
}
