//! The Meta Context (§3): per-session dedup table for `ClassDefinition`s, so
//! a COMPATIBLE-mode stream transmits each distinct schema at most once.

use fxhash::FxHashMap;

use crate::class::definition::ClassDefinition;

#[derive(Debug, Default)]
pub struct MetaContext {
	by_index: Vec<ClassDefinition>,
	index_by_id: FxHashMap<u64, u32>,
}

impl MetaContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reset(&mut self) {
		self.by_index.clear();
		self.index_by_id.clear();
	}

	/// Returns the session-local index for `definition`, transmitting the
	/// full blob only the first time a given content hash is seen.
	pub fn intern(&mut self, definition: ClassDefinition) -> (u32, bool) {
		if let Some(&idx) = self.index_by_id.get(&definition.id) {
			return (idx, false);
		}
		let idx = self.by_index.len() as u32;
		self.index_by_id.insert(definition.id, idx);
		self.by_index.push(definition);
		(idx, true)
	}

	pub fn register_received(&mut self, definition: ClassDefinition) -> u32 {
		let idx = self.by_index.len() as u32;
		self.index_by_id.insert(definition.id, idx);
		self.by_index.push(definition);
		idx
	}

	pub fn get(&self, index: u32) -> Option<&ClassDefinition> {
		self.by_index.get(index as usize)
	}
}
