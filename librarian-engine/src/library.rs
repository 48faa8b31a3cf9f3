use std::collections::HashSet;

use crate::error::LibrarianError;
use crate::types::BookId;

/// The user's saved books, in the order they were saved.
#[derive(Debug, Default)]
pub struct Library {
	order: Vec<BookId>,
	members: HashSet<BookId>,
}

impl Library {
	pub fn new() -> Self {
		Self::default()
	}

	/// Save a book. Returns false if it was already saved.
	pub fn add(&mut self, id: BookId) -> bool {
		if !self.members.insert(id) {
			return false;
		}
		self.order.push(id);
		true
	}

	/// Remove a saved book. `label` names the book in the error when it is
	/// not saved.
	pub fn remove(&mut self, id: BookId, label: &str) -> Result<(), LibrarianError> {
		if !self.members.remove(&id) {
			return Err(LibrarianError::NotInLibrary(label.to_string()));
		}
		self.order.retain(|&saved| saved != id);
		Ok(())
	}

	pub fn contains(&self, id: BookId) -> bool {
		self.members.contains(&id)
	}

	pub fn iter(&self) -> impl Iterator<Item = BookId> + '_ {
		self.order.iter().copied()
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	pub fn clear(&mut self) {
		self.order.clear();
		self.members.clear();
	}
}
