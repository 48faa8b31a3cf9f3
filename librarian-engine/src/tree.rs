// ---------------------------------------------------------------------------
// CatalogIndex -- fixed-depth discrete trie over book attributes
// ---------------------------------------------------------------------------
//
// Level 0 is the root (value 0), level 1 holds rating buckets, level 2
// length buckets, and each following level one genre bit in `GenreOrder`
// order. Books hang one level below the last genre bit as childless nodes.
//
// Nodes live in an arena and refer to children by index. Every node keeps
// its children in creation order plus a value -> child map for descent.
// ---------------------------------------------------------------------------

use std::collections::HashMap;
use std::fmt;

use crate::error::LibrarianError;
use crate::sequence::{self, LENGTH_BITS, RATING_BITS};
use crate::types::BookId;

/// Value stored at a node: an attribute key on inner levels, a book on
/// the leaf level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeValue {
	Key(i32),
	Book(BookId),
}

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug)]
struct Node {
	value: NodeValue,
	children: Vec<NodeId>,
	by_value: HashMap<NodeValue, NodeId>,
}

impl Node {
	fn new(value: NodeValue) -> Self {
		Self {
			value,
			children: Vec::new(),
			by_value: HashMap::new(),
		}
	}
}

// ---------------------------------------------------------------------------
// CatalogIndex
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CatalogIndex {
	nodes: Vec<Node>,
	genre_count: usize,
	book_count: usize,
}

impl CatalogIndex {
	/// Create an index holding only the root, for sequences carrying
	/// `genre_count` genre bits.
	pub fn new(genre_count: usize) -> Self {
		Self {
			nodes: vec![Node::new(NodeValue::Key(0))],
			genre_count,
			book_count: 0,
		}
	}

	/// True when nothing has been inserted.
	pub fn is_empty(&self) -> bool {
		self.nodes[ROOT].children.is_empty()
	}

	pub fn genre_count(&self) -> usize {
		self.genre_count
	}

	/// Number of book leaves.
	pub fn book_count(&self) -> usize {
		self.book_count
	}

	/// Number of nodes, root included.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Full width of a filter bit-vector accepted by [`filter`](Self::filter).
	pub fn filter_width(&self) -> usize {
		sequence::filter_width(self.genre_count)
	}

	/// Walk `sequence` from the root, reusing the child that carries each
	/// value and creating it when absent.
	pub fn insert(&mut self, sequence: &[NodeValue]) {
		let mut current = ROOT;
		for &value in sequence {
			let existing = self.nodes[current].by_value.get(&value).copied();
			current = match existing {
				Some(child) => child,
				None => self.attach(current, value),
			};
		}
	}

	fn attach(&mut self, parent: NodeId, value: NodeValue) -> NodeId {
		let child = self.nodes.len();
		self.nodes.push(Node::new(value));
		let node = &mut self.nodes[parent];
		node.children.push(child);
		node.by_value.insert(value, child);
		if matches!(value, NodeValue::Book(_)) {
			self.book_count += 1;
		}
		child
	}

	// ── Exact and near-match lookup ───────────────────────────────────────

	/// Books whose attribute keys equal `keys` exactly. A partial path
	/// yields nothing since only the last genre level holds books.
	pub fn get(&self, keys: &[i32]) -> Vec<BookId> {
		let mut current = ROOT;
		for &key in keys {
			match self.nodes[current].by_value.get(&NodeValue::Key(key)) {
				Some(&child) => current = child,
				None => return Vec::new(),
			}
		}
		self.books_under(current)
	}

	/// Books whose attribute keys differ from `keys` on at most `n` levels.
	pub fn get_differ_by(&self, keys: &[i32], n: usize) -> Vec<BookId> {
		let mut out = Vec::new();
		self.collect_differ_by(ROOT, keys, n, &mut out);
		out
	}

	fn collect_differ_by(&self, node: NodeId, keys: &[i32], n: usize, out: &mut Vec<BookId>) {
		let Some((&key, rest)) = keys.split_first() else {
			out.extend(self.books_under(node));
			return;
		};
		for &child in &self.nodes[node].children {
			if self.nodes[child].value == NodeValue::Key(key) {
				self.collect_differ_by(child, rest, n, out);
			} else if n > 0 {
				self.collect_differ_by(child, rest, n - 1, out);
			}
		}
	}

	// ── Filter ────────────────────────────────────────────────────────────

	/// Collect books matching a filter bit-vector laid out as
	/// `[rating 1..=5][length 1..=3][genre 0..k]`.
	///
	/// Rating and length bits are OR-ed within their group, with an empty
	/// group accepting everything. Genre bits are AND-ed: a set bit
	/// requires the genre, a clear bit accepts either. A vector shorter than
	/// [`filter_width`](Self::filter_width) is zero-padded.
	pub fn filter(&self, bits: &[u8]) -> Result<Vec<BookId>, LibrarianError> {
		let width = self.filter_width();
		if bits.len() > width {
			return Err(LibrarianError::InvalidFilter(format!(
				"expected at most {} bits, got {}",
				width,
				bits.len()
			)));
		}
		if let Some(bad) = bits.iter().find(|&&b| b > 1) {
			return Err(LibrarianError::InvalidFilter(format!(
				"bit values must be 0 or 1, got {}",
				bad
			)));
		}

		let mut padded = bits.to_vec();
		padded.resize(width, 0);

		let mut out = Vec::new();
		self.collect_filtered(ROOT, 0, &padded, &mut out);
		tracing::debug!(width, matched = out.len(), "catalog filter");
		Ok(out)
	}

	fn collect_filtered(&self, node: NodeId, height: usize, bits: &[u8], out: &mut Vec<BookId>) {
		match height {
			0 => self.collect_group(node, height, bits, RATING_BITS, out),
			1 => self.collect_group(node, height, bits, LENGTH_BITS, out),
			_ => {
				let Some((&required, rest)) = bits.split_first() else {
					out.extend(self.books_under(node));
					return;
				};
				for &child in &self.nodes[node].children {
					if required == 0 || self.nodes[child].value == NodeValue::Key(1) {
						self.collect_filtered(child, height + 1, rest, out);
					}
				}
			}
		}
	}

	/// Rating or length level: `width` leading bits form an acceptance set
	/// where bit `i - 1` admits key `i`.
	fn collect_group(
		&self,
		node: NodeId,
		height: usize,
		bits: &[u8],
		width: usize,
		out: &mut Vec<BookId>,
	) {
		let (group, rest) = bits.split_at(width);
		let accept_all = group.iter().all(|&b| b == 0);
		for &child in &self.nodes[node].children {
			let accepted = accept_all
				|| match self.nodes[child].value {
					NodeValue::Key(k) if k >= 1 && (k as usize) <= width => {
						group[k as usize - 1] == 1
					}
					_ => false,
				};
			if accepted {
				self.collect_filtered(child, height + 1, rest, out);
			}
		}
	}

	fn books_under(&self, node: NodeId) -> Vec<BookId> {
		self.nodes[node]
			.children
			.iter()
			.filter_map(|&child| match self.nodes[child].value {
				NodeValue::Book(id) => Some(id),
				NodeValue::Key(_) => None,
			})
			.collect()
	}

	fn fmt_node(&self, f: &mut fmt::Formatter<'_>, node: NodeId, depth: usize) -> fmt::Result {
		match self.nodes[node].value {
			NodeValue::Key(k) => writeln!(f, "{}{}", "  ".repeat(depth), k)?,
			NodeValue::Book(id) => writeln!(f, "{}#{}", "  ".repeat(depth), id.0)?,
		}
		for &child in &self.nodes[node].children {
			self.fmt_node(f, child, depth + 1)?;
		}
		Ok(())
	}
}

/// Indented dump, one node per line, children below their parent.
impl fmt::Display for CatalogIndex {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.fmt_node(f, ROOT, 0)
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	fn path(keys: &[i32], book: usize) -> Vec<NodeValue> {
		let mut p: Vec<NodeValue> = keys.iter().map(|&k| NodeValue::Key(k)).collect();
		p.push(NodeValue::Book(BookId(book)));
		p
	}

	/// Two genres: [fantasy, scifi].
	fn sample_index() -> CatalogIndex {
		let mut index = CatalogIndex::new(2);
		index.insert(&path(&[5, 2, 1, 0], 0));
		index.insert(&path(&[3, 2, 1, 1], 1));
		index.insert(&path(&[1, 1, 0, 0], 2));
		index.insert(&path(&[3, 3, 0, 1], 3));
		index
	}

	fn sorted(mut ids: Vec<BookId>) -> Vec<usize> {
		ids.sort();
		ids.into_iter().map(|id| id.0).collect()
	}

	#[test]
	fn new_index_is_empty() {
		let index = CatalogIndex::new(3);
		assert!(index.is_empty());
		assert_eq!(index.node_count(), 1);
		assert_eq!(index.filter(&[]).unwrap(), Vec::<BookId>::new());
	}

	#[test]
	fn insert_shares_common_prefixes() {
		let mut index = CatalogIndex::new(1);
		index.insert(&path(&[4, 2, 1], 0));
		index.insert(&path(&[4, 2, 1], 1));
		// root, 4, 2, 1, and two book leaves
		assert_eq!(index.node_count(), 6);
		assert_eq!(index.book_count(), 2);
		assert_eq!(sorted(index.get(&[4, 2, 1])), vec![0, 1]);
	}

	#[test]
	fn get_requires_full_path() {
		let index = sample_index();
		assert_eq!(sorted(index.get(&[3, 2, 1, 1])), vec![1]);
		assert!(index.get(&[3, 2]).is_empty());
		assert!(index.get(&[2, 2, 1, 1]).is_empty());
	}

	#[test]
	fn get_differ_by_allows_mismatched_levels() {
		let index = sample_index();
		assert_eq!(sorted(index.get_differ_by(&[3, 2, 1, 1], 0)), vec![1]);
		assert_eq!(sorted(index.get_differ_by(&[3, 2, 1, 1], 1)), vec![1]);
		// book 0 differs on rating and scifi, book 3 on length and fantasy
		assert_eq!(sorted(index.get_differ_by(&[3, 2, 1, 1], 2)), vec![0, 1, 3]);
		assert_eq!(sorted(index.get_differ_by(&[3, 2, 1, 1], 4)), vec![0, 1, 2, 3]);
	}

	#[test]
	fn all_zero_filter_returns_every_book() {
		let index = sample_index();
		let all = index.filter(&[0; 10]).unwrap();
		assert_eq!(sorted(all), vec![0, 1, 2, 3]);
	}

	#[test]
	fn rating_bits_are_or_semantics() {
		let index = sample_index();
		let hits = index.filter(&[1, 0, 1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
		assert_eq!(sorted(hits), vec![1, 2, 3]);
	}

	#[test]
	fn length_bits_are_or_semantics() {
		let index = sample_index();
		let hits = index.filter(&[0, 0, 0, 0, 0, 1, 0, 1, 0, 0]).unwrap();
		assert_eq!(sorted(hits), vec![2, 3]);
	}

	#[test]
	fn genre_bits_are_and_semantics() {
		let index = sample_index();
		let fantasy = index.filter(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 0]).unwrap();
		assert_eq!(sorted(fantasy), vec![0, 1]);
		let both = index.filter(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 1]).unwrap();
		assert_eq!(sorted(both), vec![1]);
	}

	#[test]
	fn groups_combine_as_conjunction() {
		let index = sample_index();
		// rating 3, length long, scifi required
		let hits = index.filter(&[0, 0, 1, 0, 0, 0, 0, 1, 0, 1]).unwrap();
		assert_eq!(sorted(hits), vec![3]);
	}

	#[test]
	fn short_filter_is_zero_padded() {
		let index = sample_index();
		let hits = index.filter(&[0, 0, 0, 0, 1]).unwrap();
		assert_eq!(sorted(hits), vec![0]);
		assert_eq!(sorted(index.filter(&[]).unwrap()), vec![0, 1, 2, 3]);
	}

	#[test]
	fn long_filter_is_rejected() {
		let index = sample_index();
		let err = index.filter(&[0; 11]).unwrap_err();
		assert!(matches!(err, LibrarianError::InvalidFilter(_)));
	}

	#[test]
	fn non_binary_bit_is_rejected() {
		let index = sample_index();
		let err = index.filter(&[2]).unwrap_err();
		assert!(matches!(err, LibrarianError::InvalidFilter(_)));
	}

	#[test]
	fn unknown_buckets_only_match_without_group_filter() {
		let mut index = CatalogIndex::new(0);
		index.insert(&path(&[0, 0], 7));
		assert_eq!(sorted(index.filter(&[]).unwrap()), vec![7]);
		assert!(index.filter(&[1, 1, 1, 1, 1]).unwrap().is_empty());
		assert!(index.filter(&[0, 0, 0, 0, 0, 1, 1, 1]).unwrap().is_empty());
	}

	#[test]
	fn display_indents_by_depth() {
		let mut index = CatalogIndex::new(0);
		index.insert(&path(&[4, 1], 0));
		assert_eq!(index.to_string(), "0\n  4\n    1\n      #0\n");
	}
}
