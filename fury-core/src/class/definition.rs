//! `ClassDefinition` (§4.5): the portable schema record exchanged in
//! COMPATIBLE mode so two peers with different field sets can still share
//! the fields they have in common.

use std::hash::Hasher;

use crate::buffer::Buffer;
use crate::class::grouping::{group_and_sort, GroupableField};
use crate::class::info::ClassInfo;
use crate::descriptor::OwnedFieldShape;
use crate::error::{Error, Result};

const HEADER_SCHEMA_COMPATIBLE: u8 = 1 << 0;
const HEADER_HAS_EXT_META: u8 = 1 << 1;

/// The four-variant wire tag of §3/§4.5. Unlike [`OwnedFieldShape`], which
/// the host uses to describe its *declared* Rust type, this is the schema
/// vocabulary actually transmitted: primitives and final reference types are
/// both folded into `Registered(class_id)` since on the wire they're just "a
/// known, monomorphic class with this id".
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum WireFieldType {
	/// `nullable` distinguishes a bare primitive slot (never null, no
	/// nullability byte on the wire) from a boxed one (`Option`-wrapped,
	/// one nullability byte precedes the body) — the one bit the host-level
	/// `FieldShape` carries that the four-variant schema vocabulary would
	/// otherwise lose on the way to the wire.
	Registered { class_id: u32, is_monomorphic: bool, nullable: bool },
	Collection { element: Box<WireFieldType>, is_monomorphic: bool },
	Map { key: Box<WireFieldType>, value: Box<WireFieldType>, is_monomorphic: bool },
	Object { is_monomorphic: bool },
}

impl WireFieldType {
	pub fn is_monomorphic(&self) -> bool {
		match self {
			WireFieldType::Registered { is_monomorphic, .. }
			| WireFieldType::Collection { is_monomorphic, .. }
			| WireFieldType::Map { is_monomorphic, .. }
			| WireFieldType::Object { is_monomorphic } => *is_monomorphic,
		}
	}

	pub fn is_nullable(&self) -> bool {
		match self {
			WireFieldType::Registered { nullable, .. } => *nullable,
			_ => true,
		}
	}

	fn write(&self, buf: &mut Buffer) {
		let mono = self.is_monomorphic() as u32;
		let nullable = self.is_nullable() as u32;
		let pack = |variant: u32| (variant << 2) | (nullable << 1) | mono;
		match self {
			WireFieldType::Object { .. } => buf.write_varuint32(pack(0)),
			WireFieldType::Map { key, value, .. } => {
				buf.write_varuint32(pack(1));
				key.write(buf);
				value.write(buf);
			}
			WireFieldType::Collection { element, .. } => {
				buf.write_varuint32(pack(2));
				element.write(buf);
			}
			WireFieldType::Registered { class_id, .. } => {
				buf.write_varuint32(pack(3 + class_id));
			}
		}
	}

	fn read(buf: &mut Buffer) -> Result<Self> {
		let offset = buf.reader_index();
		let tag = buf.read_varuint32()?;
		let is_monomorphic = tag & 1 != 0;
		let nullable = tag & 2 != 0;
		let variant = tag >> 2;
		Ok(match variant {
			0 => WireFieldType::Object { is_monomorphic },
			1 => {
				let key = Box::new(WireFieldType::read(buf)?);
				let value = Box::new(WireFieldType::read(buf)?);
				WireFieldType::Map { key, value, is_monomorphic }
			}
			2 => {
				let element = Box::new(WireFieldType::read(buf)?);
				WireFieldType::Collection { element, is_monomorphic }
			}
			n if n >= 3 => WireFieldType::Registered { class_id: n - 3, is_monomorphic, nullable },
			_ => return Err(Error::MalformedVarint { offset }),
		})
	}

	/// Built-in ids for the eight primitive kinds plus strings, assigned
	/// low so user registrations never collide with them (§4.4 registration).
	pub fn primitive_class_id(shape: crate::descriptor::PrimitiveShape) -> u32 {
		use crate::descriptor::PrimitiveShape::*;
		match shape {
			Bool => 0,
			I8 => 1,
			I16 => 2,
			Char => 3,
			I32 => 4,
			I64 => 5,
			F32 => 6,
			F64 => 7,
		}
	}

	pub const STRING_CLASS_ID: u32 = 8;
	pub const FIRST_USER_CLASS_ID: u32 = 9;

	/// Maps a host-declared [`OwnedFieldShape`] onto the wire vocabulary.
	/// `resolve_final` supplies the class id for a named final-reference
	/// type (looked up in the resolver's registration table).
	pub fn from_owned_shape(shape: &OwnedFieldShape, resolve_final: &impl Fn(&str) -> Option<u32>) -> Self {
		match shape {
			OwnedFieldShape::Primitive(p) => WireFieldType::Registered { class_id: Self::primitive_class_id(*p), is_monomorphic: true, nullable: false },
			OwnedFieldShape::BoxedPrimitive(p) => WireFieldType::Registered { class_id: Self::primitive_class_id(*p), is_monomorphic: true, nullable: true },
			OwnedFieldShape::FinalReference { type_name } => {
				let class_id = if *type_name == "String" { Self::STRING_CLASS_ID } else { resolve_final(type_name).unwrap_or(Self::FIRST_USER_CLASS_ID) };
				WireFieldType::Registered { class_id, is_monomorphic: true, nullable: true }
			}
			OwnedFieldShape::Object => WireFieldType::Object { is_monomorphic: false },
			OwnedFieldShape::Collection { element, monomorphic } => WireFieldType::Collection {
				element: Box::new(WireFieldType::from_owned_shape(element, resolve_final)),
				is_monomorphic: *monomorphic,
			},
			OwnedFieldShape::Map { key, value, monomorphic } => WireFieldType::Map {
				key: Box::new(WireFieldType::from_owned_shape(key, resolve_final)),
				value: Box::new(WireFieldType::from_owned_shape(value, resolve_final)),
				is_monomorphic: *monomorphic,
			},
		}
	}

	/// Inverse of `from_owned_shape`, reconstructed from wire-level
	/// information alone — used to decode COMPATIBLE-mode fields whose
	/// sender may be running a schema this reader never declared.
	pub fn to_owned_shape(&self) -> OwnedFieldShape {
		match self {
			WireFieldType::Registered { class_id, nullable, .. } if *class_id < Self::STRING_CLASS_ID => {
				let shape = primitive_shape_from_id(*class_id);
				if *nullable { OwnedFieldShape::BoxedPrimitive(shape) } else { OwnedFieldShape::Primitive(shape) }
			}
			WireFieldType::Registered { class_id, .. } if *class_id == Self::STRING_CLASS_ID => {
				OwnedFieldShape::FinalReference { type_name: "String" }
			}
			WireFieldType::Registered { is_monomorphic, .. } => {
				let _ = is_monomorphic;
				OwnedFieldShape::Object
			}
			WireFieldType::Object { .. } => OwnedFieldShape::Object,
			WireFieldType::Collection { element, is_monomorphic } => {
				OwnedFieldShape::Collection { element: Box::new(element.to_owned_shape()), monomorphic: *is_monomorphic }
			}
			WireFieldType::Map { key, value, is_monomorphic } => OwnedFieldShape::Map {
				key: Box::new(key.to_owned_shape()),
				value: Box::new(value.to_owned_shape()),
				monomorphic: *is_monomorphic,
			},
		}
	}
}

fn primitive_shape_from_id(id: u32) -> crate::descriptor::PrimitiveShape {
	use crate::descriptor::PrimitiveShape::*;
	match id {
		0 => Bool,
		1 => I8,
		2 => I16,
		3 => Char,
		4 => I32,
		5 => I64,
		6 => F32,
		_ => F64,
	}
}

#[derive(Debug, Clone)]
pub struct ClassDefinitionField {
	pub declaring_class: String,
	pub field_name: String,
	pub field_type: WireFieldType,
}

#[derive(Debug, Clone)]
pub struct ClassDefinition {
	pub class_name: String,
	pub fields: Vec<ClassDefinitionField>,
	pub ext_meta: Vec<u8>,
	/// Content hash of the encoded blob; identical schemas on both peers
	/// collapse to the same id without coordination.
	pub id: u64,
}

impl ClassDefinition {
	pub fn build(info: &ClassInfo, resolve_final: impl Fn(&str) -> Option<u32>) -> Self {
		let grouped: Vec<GroupableField> = group_and_sort(info.fields.to_vec());
		let fields: Vec<ClassDefinitionField> = grouped
			.into_iter()
			.map(|f| ClassDefinitionField {
				declaring_class: f.declaring_class.to_string(),
				field_name: f.name.to_string(),
				field_type: WireFieldType::from_owned_shape(&f.shape, &resolve_final),
			})
			.collect();

		let mut def = ClassDefinition { class_name: info.type_name.to_string(), fields, ext_meta: Vec::new(), id: 0 };
		def.id = def.content_hash();
		def
	}

	fn encode_body(&self, buf: &mut Buffer) {
		let mut header = HEADER_SCHEMA_COMPATIBLE;
		if !self.ext_meta.is_empty() {
			header |= HEADER_HAS_EXT_META;
		}
		buf.write_byte(header);
		buf.write_string(&self.class_name, true);
		buf.write_varuint32(self.fields.len() as u32);
		for field in &self.fields {
			buf.write_string(&field.declaring_class, true);
			buf.write_string(&field.field_name, true);
			field.field_type.write(buf);
		}
		if header & HEADER_HAS_EXT_META != 0 {
			buf.write_varuint32(self.ext_meta.len() as u32);
			buf.write_bytes(&self.ext_meta);
		}
	}

	pub fn encode(&self) -> Vec<u8> {
		let mut buf = Buffer::new();
		self.encode_body(&mut buf);
		buf.into_vec()
	}

	pub fn decode(buf: &mut Buffer) -> Result<Self> {
		let header = buf.read_byte()?;
		let class_name = buf.read_string()?;
		let field_count = buf.read_varuint32()? as usize;
		let mut fields = Vec::with_capacity(field_count);
		for _ in 0..field_count {
			let declaring_class = buf.read_string()?;
			let field_name = buf.read_string()?;
			let field_type = WireFieldType::read(buf)?;
			fields.push(ClassDefinitionField { declaring_class, field_name, field_type });
		}
		let ext_meta = if header & HEADER_HAS_EXT_META != 0 {
			let len = buf.read_varuint32()? as usize;
			buf.read_bytes(len)?
		} else {
			Vec::new()
		};
		let mut def = ClassDefinition { class_name, fields, ext_meta, id: 0 };
		def.id = def.content_hash();
		Ok(def)
	}

	fn content_hash(&self) -> u64 {
		let mut buf = Buffer::new();
		self.encode_body(&mut buf);
		let mut hasher = fxhash::FxHasher::default();
		hasher.write(buf.as_slice());
		hasher.finish()
	}

	/// Looks up a field shared with `other` by `(declaring_class, field_name)`.
	pub fn find_shared<'a>(&'a self, declaring_class: &str, field_name: &str) -> Option<&'a ClassDefinitionField> {
		self.fields.iter().find(|f| f.declaring_class == declaring_class && f.field_name == field_name)
	}
}
