//! The Type Descriptor API (§4.11): the reflective surface the core consumes
//! instead of inspecting Rust's (nonexistent) runtime type information. A
//! hand implementation or `#[derive(FuryClass)]` from `fury-derive` both
//! produce the same four pieces of data; everything downstream of this file
//! — grouping, ordering, ref-tracking, wire encoding — belongs to the core.

use std::any::Any;
use std::fmt::Debug;
use std::rc::Rc;

use crate::error::{Error, Result};

/// The eight primitive kinds, ordered here by descending fixed wire width and
/// then declaration order, which is the tiebreak §4.6 asks for before name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveShape {
	I64,
	F64,
	I32,
	F32,
	I16,
	Char,
	I8,
	Bool,
}

impl PrimitiveShape {
	/// Fixed wire width in bytes, used as the primary §4.6 sort key.
	pub fn width(self) -> u8 {
		match self {
			PrimitiveShape::I64 | PrimitiveShape::F64 => 8,
			PrimitiveShape::I32 | PrimitiveShape::F32 => 4,
			PrimitiveShape::Char => 4,
			PrimitiveShape::I16 => 2,
			PrimitiveShape::I8 | PrimitiveShape::Bool => 1,
		}
	}
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PrimitiveValue {
	Bool(bool),
	I8(i8),
	I16(i16),
	Char(char),
	I32(i32),
	I64(i64),
	F32(f32),
	F64(f64),
}

impl PrimitiveValue {
	pub fn shape(&self) -> PrimitiveShape {
		match self {
			PrimitiveValue::Bool(_) => PrimitiveShape::Bool,
			PrimitiveValue::I8(_) => PrimitiveShape::I8,
			PrimitiveValue::I16(_) => PrimitiveShape::I16,
			PrimitiveValue::Char(_) => PrimitiveShape::Char,
			PrimitiveValue::I32(_) => PrimitiveShape::I32,
			PrimitiveValue::I64(_) => PrimitiveShape::I64,
			PrimitiveValue::F32(_) => PrimitiveShape::F32,
			PrimitiveValue::F64(_) => PrimitiveShape::F64,
		}
	}
}

/// The declared static type of a field slot, interned behind `&'static`
/// references so the whole shape tree stays `Copy` and a derived impl can
/// publish its table as a plain `&'static [FieldDescriptor]` — the same way
/// the teacher's `TypeData::Init` borrows everything from its bump arena
/// instead of owning it.
///
/// Rust has no boxed-primitive distinction the way the JVM does; the engine
/// represents that distinction with `Option<_>`-ness instead — a `Primitive`
/// slot is never null, a `BoxedPrimitive` slot always carries nullability on
/// the wire.
#[derive(Debug, Clone, Copy)]
pub enum FieldShape {
	Primitive(PrimitiveShape),
	BoxedPrimitive(PrimitiveShape),
	/// A reference type known at registration time to have no subtypes.
	FinalReference { type_name: &'static str },
	/// A reference type that may be overridden by a runtime subtype.
	Object,
	Collection { element: &'static FieldShape, monomorphic: bool },
	Map { key: &'static FieldShape, value: &'static FieldShape, monomorphic: bool },
}

impl FieldShape {
	/// `FieldShape` for a `String`-typed field: the one built-in final
	/// reference type every derive-generated impl can reach for directly.
	pub const STRING: FieldShape = FieldShape::FinalReference { type_name: "String" };

	pub fn is_monomorphic(&self) -> bool {
		match self {
			FieldShape::Primitive(_) | FieldShape::BoxedPrimitive(_) | FieldShape::FinalReference { .. } => true,
			FieldShape::Object => false,
			FieldShape::Collection { monomorphic, .. } | FieldShape::Map { monomorphic, .. } => *monomorphic,
		}
	}

	pub fn to_owned_shape(&self) -> OwnedFieldShape {
		match self {
			FieldShape::Primitive(p) => OwnedFieldShape::Primitive(*p),
			FieldShape::BoxedPrimitive(p) => OwnedFieldShape::BoxedPrimitive(*p),
			FieldShape::FinalReference { type_name } => OwnedFieldShape::FinalReference { type_name },
			FieldShape::Object => OwnedFieldShape::Object,
			FieldShape::Collection { element, monomorphic } => {
				OwnedFieldShape::Collection { element: Box::new(element.to_owned_shape()), monomorphic: *monomorphic }
			}
			FieldShape::Map { key, value, monomorphic } => OwnedFieldShape::Map {
				key: Box::new(key.to_owned_shape()),
				value: Box::new(value.to_owned_shape()),
				monomorphic: *monomorphic,
			},
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
	pub declaring_class: &'static str,
	pub name: &'static str,
	pub shape: FieldShape,
}

/// An owned mirror of [`FieldShape`], used by the class resolver to describe
/// field shapes reconstructed at runtime from a wire-received class
/// definition, which has no `'static` backing storage to borrow from.
#[derive(Debug, Clone)]
pub enum OwnedFieldShape {
	Primitive(PrimitiveShape),
	BoxedPrimitive(PrimitiveShape),
	FinalReference { type_name: &'static str },
	Object,
	Collection { element: Box<OwnedFieldShape>, monomorphic: bool },
	Map { key: Box<OwnedFieldShape>, value: Box<OwnedFieldShape>, monomorphic: bool },
}

impl OwnedFieldShape {
	pub fn is_monomorphic(&self) -> bool {
		match self {
			OwnedFieldShape::Primitive(_) | OwnedFieldShape::BoxedPrimitive(_) | OwnedFieldShape::FinalReference { .. } => true,
			OwnedFieldShape::Object => false,
			OwnedFieldShape::Collection { monomorphic, .. } | OwnedFieldShape::Map { monomorphic, .. } => *monomorphic,
		}
	}
}

/// A dynamically-typed field slot value: the interpreter's currency. Every
/// `FuryClass` impl boxes and unboxes its fields through this type instead of
/// generated per-field typed code.
#[derive(Debug, Clone)]
pub enum FieldValue {
	Primitive(PrimitiveValue),
	Boxed(Option<PrimitiveValue>),
	/// Backed by `Rc<str>`, not `String`: strings participate in the same
	/// identity-based reference tracking as other heap values (§8 S3), which
	/// requires a sharable allocation to key on.
	String(Option<Rc<str>>),
	Object(Option<Rc<dyn FuryObject>>),
	List(Option<Vec<FieldValue>>),
	Map(Option<Vec<(FieldValue, FieldValue)>>),
}

/// The Type Provider contract (§4.11). Implemented by hand or via
/// `#[derive(FuryClass)]`.
pub trait FuryClass: 'static + Sized {
	fn type_name() -> &'static str;
	fn declared_fields() -> &'static [FieldDescriptor];
	/// Field values in declaration order, matching `declared_fields()`.
	fn field_values(&self) -> Vec<FieldValue>;
	/// Inverse of `field_values`: reconstructs `Self` from values in
	/// declaration order. Returns `ConstructionFailure` if the count or
	/// shapes don't line up (e.g. after an incompatible schema change that
	/// the caller failed to plug defaults into first).
	fn construct(values: Vec<FieldValue>) -> Result<Self>;
}

/// Object-safe façade over `FuryClass`, used wherever the core needs to hold
/// a value of statically-unknown (but dynamically class-resolved) type: the
/// "other reference" field group, polymorphic collection/map elements, and
/// the top-level `serialize_dyn`/`deserialize_dyn` entry points. This is the
/// generalization of the teacher's `Table: 'static + Debug + Send + Sync`
/// trait dispatched on by `TypeId` in `TableHeap::get_table`.
pub trait FuryObject: Debug {
	fn fury_type_name(&self) -> &'static str;
	fn fury_field_values(&self) -> Vec<FieldValue>;
	fn as_any(&self) -> &dyn Any;
	/// Lets a caller holding only `Rc<dyn FuryObject>` recover an owned,
	/// concrete `T` via `Rc<dyn Any>::downcast`, which needs ownership of the
	/// allocation rather than a borrow.
	fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: FuryClass + Debug> FuryObject for T {
	fn fury_type_name(&self) -> &'static str {
		T::type_name()
	}

	fn fury_field_values(&self) -> Vec<FieldValue> {
		self.field_values()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
		self
	}
}

pub fn downcast<T: FuryClass>(object: &dyn FuryObject) -> Result<&T> {
	object.as_any().downcast_ref::<T>().ok_or(Error::ConstructionFailure { type_name: T::type_name() })
}
