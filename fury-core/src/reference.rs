//! The reference-tracking resolver (§4.3): assigns stable integer ids to
//! already-seen objects within one session so cycles and shared subobjects
//! round-trip.
//!
//! Object identity on the write side is a raw pointer address, the same
//! technique the teacher's `TypePool` uses for its `HashMap<*const Type, ...,
//! BuildNoHashHasher<usize>>` caches: addresses are already well-distributed,
//! so hashing them again would be wasted work.

use nohash_hasher::BuildNoHashHasher;
use std::collections::HashMap;

use crate::buffer::Buffer;
use crate::error::{Error, Result};

pub const NULL_FLAG: i8 = -3;
pub const REF_FLAG: i8 = -2;
pub const NOT_NULL_VALUE_FLAG: i8 = -1;
pub const REF_VALUE_FLAG: i8 = 0;

fn write_flag(buf: &mut Buffer, flag: i8) {
	buf.write_byte(flag as u8);
}

fn read_flag(buf: &mut Buffer) -> Result<i8> {
	Ok(buf.read_byte()? as i8)
}

/// Object identity for the write-side table: the address of the allocation
/// backing a heap value (`Rc::as_ptr`/`Arc::as_ptr` cast to `usize`), never
/// value equality.
pub type ObjectIdentity = usize;

#[derive(Debug, Default)]
pub struct WriteRefResolver {
	ids: HashMap<ObjectIdentity, u32, BuildNoHashHasher<ObjectIdentity>>,
	next_id: u32,
}

/// What the caller must do after `write_ref_or_null` returns.
#[derive(Debug, Eq, PartialEq)]
pub enum WriteOutcome {
	/// The flag byte alone fully describes the value; nothing more to write.
	Complete,
	/// A new object was assigned this id; the caller must now write its body.
	WriteBody,
}

impl WriteRefResolver {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reset(&mut self) {
		self.ids.clear();
		self.next_id = 0;
	}

	/// Ref-tracked path (§4.3, `write_ref_or_null`).
	pub fn write_ref_or_null(&mut self, buf: &mut Buffer, identity: Option<ObjectIdentity>) -> WriteOutcome {
		let Some(identity) = identity else {
			write_flag(buf, NULL_FLAG);
			return WriteOutcome::Complete;
		};
		if let Some(&id) = self.ids.get(&identity) {
			write_flag(buf, REF_FLAG);
			buf.write_varuint32(id);
			return WriteOutcome::Complete;
		}
		let id = self.next_id;
		self.next_id += 1;
		self.ids.insert(identity, id);
		write_flag(buf, REF_VALUE_FLAG);
		WriteOutcome::WriteBody
	}

	/// Untracked path for types excluded from ref tracking (`write_null_flag`):
	/// never records identity, so back-references to these values are
	/// impossible — callers must fully inline the value every time.
	pub fn write_null_flag(buf: &mut Buffer, is_null: bool) -> WriteOutcome {
		if is_null {
			write_flag(buf, NULL_FLAG);
			WriteOutcome::Complete
		} else {
			write_flag(buf, NOT_NULL_VALUE_FLAG);
			WriteOutcome::WriteBody
		}
	}
}

/// Reader counterpart of `write_null_flag`, for values excluded from ref
/// tracking: no table to consult, just the two flags an untracked writer
/// ever emits.
pub fn read_null_flag(buf: &mut Buffer) -> Result<bool> {
	let offset = buf.reader_index();
	match read_flag(buf)? {
		NULL_FLAG => Ok(true),
		NOT_NULL_VALUE_FLAG => Ok(false),
		_ => Err(Error::MalformedVarint { offset }),
	}
}

/// What the caller must do after `try_preserve_ref_id` returns.
#[derive(Debug, Eq, PartialEq)]
pub enum ReadSignal {
	Null,
	/// A new, ref-tracked object follows; decode it then call
	/// `set_read_object(id, ..)` with this id.
	Tracked(u32),
	/// A new, untracked object follows; decode it and discard the id.
	Untracked,
	/// A back-reference; resolve via `get_read_object(id)`.
	BackReference(u32),
}

#[derive(Debug, Default)]
pub struct ReadRefResolver<T> {
	table: Vec<Option<T>>,
}

impl<T: Clone> ReadRefResolver<T> {
	pub fn new() -> Self {
		Self { table: Vec::new() }
	}

	pub fn reset(&mut self) {
		self.table.clear();
	}

	pub fn try_preserve_ref_id(&mut self, buf: &mut Buffer) -> Result<ReadSignal> {
		let offset = buf.reader_index();
		match read_flag(buf)? {
			NULL_FLAG => Ok(ReadSignal::Null),
			REF_FLAG => {
				let id = buf.read_varuint32()?;
				Ok(ReadSignal::BackReference(id))
			}
			NOT_NULL_VALUE_FLAG => Ok(ReadSignal::Untracked),
			REF_VALUE_FLAG => {
				let id = self.table.len() as u32;
				self.table.push(None);
				Ok(ReadSignal::Tracked(id))
			}
			_ => Err(Error::MalformedVarint { offset }),
		}
	}

	/// Fill in a previously-reserved slot. Called after the body of a
	/// `Tracked` object has been decoded, so a self-reference reached while
	/// decoding that very body already resolves to the finished value.
	pub fn set_read_object(&mut self, id: u32, value: T) {
		self.table[id as usize] = Some(value);
	}

	pub fn get_read_object(&self, id: u32) -> Option<T> {
		self.table.get(id as usize).and_then(|slot| slot.clone())
	}
}
