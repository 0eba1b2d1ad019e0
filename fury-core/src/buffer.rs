//! A growable byte window with independent read and write cursors.
//!
//! This mirrors the teacher's `Cursor<&[u8]>` + `FromByteStream` reading
//! idiom, generalized to an owned, growable, write-capable buffer: fixed-size
//! scalars are read and written as raw little-endian bytes via
//! `to_le_bytes`/`from_le_bytes`, the same mechanism `impl_from_le_byte_stream`
//! used for `u16`/`u32`/`u64`.

use crate::error::{Error, Result};

/// Invariant: `0 <= read_index <= write_index <= data.len()`.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
	data: Vec<u8>,
	read_index: usize,
	write_index: usize,
}

impl Buffer {
	pub fn new() -> Self {
		Self::with_capacity(64)
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self { data: Vec::with_capacity(capacity), read_index: 0, write_index: 0 }
	}

	/// Wrap an already-populated byte slice for reading only; `writer_index`
	/// is set to the slice length so writes would grow past it exactly like
	/// a buffer built by this same type.
	pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
		let data = bytes.into();
		let write_index = data.len();
		Self { data, read_index: 0, write_index }
	}

	#[inline]
	pub fn reader_index(&self) -> usize {
		self.read_index
	}

	#[inline]
	pub fn writer_index(&self) -> usize {
		self.write_index
	}

	#[inline]
	pub fn set_reader_index(&mut self, index: usize) {
		self.read_index = index;
	}

	#[inline]
	pub fn remaining(&self) -> usize {
		self.write_index - self.read_index
	}

	pub fn as_slice(&self) -> &[u8] {
		&self.data[..self.write_index]
	}

	pub fn into_vec(self) -> Vec<u8> {
		let mut data = self.data;
		data.truncate(self.write_index);
		data
	}

	/// Amortized-doubling growth, matching §4.1: writes past capacity grow
	/// the region rather than failing.
	pub fn reserve(&mut self, additional: usize) {
		let required = self.write_index + additional;
		if required <= self.data.len() {
			return;
		}
		let mut new_capacity = self.data.len().max(16);
		while new_capacity < required {
			new_capacity *= 2;
		}
		self.data.resize(new_capacity, 0);
	}

	fn take_read_slice(&mut self, len: usize) -> Result<&[u8]> {
		if self.read_index + len > self.write_index {
			return Err(Error::UnexpectedEndOfBuffer {
				offset: self.read_index,
				requested: len,
				available: self.write_index - self.read_index,
			});
		}
		let slice = &self.data[self.read_index..self.read_index + len];
		self.read_index += len;
		Ok(slice)
	}

	pub fn write_bytes(&mut self, bytes: &[u8]) {
		self.reserve(bytes.len());
		let end = self.write_index + bytes.len();
		self.data[self.write_index..end].copy_from_slice(bytes);
		self.write_index = end;
	}

	pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
		Ok(self.take_read_slice(len)?.to_vec())
	}

	pub fn write_bool(&mut self, value: bool) {
		self.write_byte(value as u8);
	}

	pub fn read_bool(&mut self) -> Result<bool> {
		Ok(self.read_byte()? != 0)
	}

	pub fn write_byte(&mut self, value: u8) {
		self.write_bytes(&[value]);
	}

	pub fn read_byte(&mut self) -> Result<u8> {
		Ok(self.take_read_slice(1)?[0])
	}
}

macro_rules! impl_fixed_width {
	($write:ident, $read:ident, $ty:ty) => {
		impl Buffer {
			pub fn $write(&mut self, value: $ty) {
				self.write_bytes(&value.to_le_bytes());
			}

			pub fn $read(&mut self) -> Result<$ty> {
				let bytes = self.take_read_slice(std::mem::size_of::<$ty>())?;
				Ok(<$ty>::from_le_bytes(bytes.try_into().unwrap()))
			}
		}
	};
}

impl_fixed_width!(write_i16, read_i16, i16);
impl_fixed_width!(write_u16, read_u16, u16);
impl_fixed_width!(write_i32, read_i32, i32);
impl_fixed_width!(write_u32, read_u32, u32);
impl_fixed_width!(write_i64, read_i64, i64);
impl_fixed_width!(write_u64, read_u64, u64);
impl_fixed_width!(write_f32, read_f32, f32);
impl_fixed_width!(write_f64, read_f64, f64);
