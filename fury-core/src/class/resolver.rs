//! The Class Resolver (§4.4): registration, on-the-wire class reference
//! encoding, and lazily-built, cached `ClassInfo`.
//!
//! Dynamic dispatch for unregistered-at-compile-time types (the "other
//! reference" field group, polymorphic collection/map elements) is a
//! `TypeId`-keyed registry of function-pointer pairs, a direct generalization
//! of the teacher's `TableHeap::get_table::<T>()` (design note 9).

use std::any::TypeId;
use std::fmt::Debug;
use std::rc::Rc;
use std::sync::Arc;

use fxhash::FxHashMap;

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::buffer::Buffer;
use crate::class::definition::WireFieldType;
use crate::class::grouping::{group_and_sort, GroupableField};
use crate::class::info::ClassInfo;
use crate::descriptor::{FieldDescriptor, FuryClass, FuryObject};
use crate::error::{Error, Result};
use crate::session::Session;

pub type WriteFn = fn(&dyn FuryObject, &mut Buffer, &mut Session) -> Result<()>;
pub type ReadFn = fn(&mut Buffer, &mut Session) -> Result<Rc<dyn FuryObject>>;

#[derive(Debug, Clone, Copy)]
pub struct ClassHandlers {
	pub write: WriteFn,
	pub read: ReadFn,
}

#[derive(Debug)]
struct Registration {
	type_id: TypeId,
	info: ClassInfo,
	handlers: ClassHandlers,
	declared_order_indices: Arc<[usize]>,
}

/// Resolution of a class reference read off the wire.
#[derive(Debug, Clone)]
pub enum ClassRef {
	Registered(TypeId),
	/// A name this resolver has no Rust type for; caller decides (per
	/// `deserialize_unknown_class_enabled`) whether that's fatal.
	Unknown(Arc<str>),
}

#[derive(Debug, Default)]
pub struct ClassResolver {
	by_type: FxHashMap<TypeId, Registration>,
	by_id: FxHashMap<u32, TypeId>,
	by_name: FxHashMap<Arc<str>, TypeId>,
	next_class_id: u32,
	session_names: Vec<Arc<str>>,
	session_name_index: FxHashMap<Arc<str>, u32>,
}

impl ClassResolver {
	pub fn new() -> Self {
		Self { next_class_id: WireFieldType::FIRST_USER_CLASS_ID, ..Default::default() }
	}

	/// Registers `T` against an explicit class id (secure-mode friendly) or,
	/// if `None`, an id assigned in registration order. Builds and caches its
	/// `ClassInfo` immediately — field grouping never changes for a `'static`
	/// Rust type, so there's nothing to recompute lazily here; the "built on
	/// demand" half of §4.4 applies to dynamically-discovered classes instead.
	pub fn register<T: FuryClass + Debug>(&mut self, class_id: Option<u32>) {
		let type_id = TypeId::of::<T>();
		let class_id = class_id.unwrap_or_else(|| {
			let id = self.next_class_id;
			self.next_class_id += 1;
			id
		});

		let declared: &'static [FieldDescriptor] = T::declared_fields();
		let groupable: Vec<GroupableField> = declared.iter().map(GroupableField::from).collect();
		let sorted = group_and_sort(groupable);
		let declared_order_indices: Vec<usize> = sorted
			.iter()
			.map(|sorted_field| {
				declared
					.iter()
					.position(|d| d.declaring_class == sorted_field.declaring_class && d.name == sorted_field.name)
					.expect("grouped field must come from the declared set")
			})
			.collect();

		let info = ClassInfo::new(Some(class_id), T::type_name(), true, sorted, true);

		fn write_adapter<T: FuryClass + Debug>(object: &dyn FuryObject, buf: &mut Buffer, session: &mut Session) -> Result<()> {
			let concrete = crate::descriptor::downcast::<T>(object)?;
			let type_id = TypeId::of::<T>();
			let info = session.resolver().class_info_by_type(type_id).unwrap().clone();
			let indices = session.resolver().declared_order_indices(type_id).unwrap().to_vec();
			crate::object::write_fields(&info, &indices, &concrete.field_values(), buf, session)
		}

		fn read_adapter<T: FuryClass + Debug>(buf: &mut Buffer, session: &mut Session) -> Result<Rc<dyn FuryObject>> {
			let type_id = TypeId::of::<T>();
			let info = session.resolver().class_info_by_type(type_id).unwrap().clone();
			let indices = session.resolver().declared_order_indices(type_id).unwrap().to_vec();
			let values = crate::object::read_fields(&info, &indices, buf, session)?;
			let value = T::construct(values)?;
			Ok(Rc::new(value) as Rc<dyn FuryObject>)
		}

		let handlers = ClassHandlers { write: write_adapter::<T>, read: read_adapter::<T> };

		#[cfg(feature = "tracing")]
		debug!(type_name = T::type_name(), class_id, "registered class");

		self.by_id.insert(class_id, type_id);
		self.by_name.insert(Arc::from(T::type_name()), type_id);
		self.by_type.insert(type_id, Registration { type_id, info, handlers, declared_order_indices: declared_order_indices.into() });
	}

	/// Registers `T` under an auto-assigned id if it has no registration yet;
	/// a no-op otherwise. Lets `Fury::serialize`/`deserialize` work without
	/// requiring an explicit `register` call first.
	pub fn ensure_registered<T: FuryClass + Debug>(&mut self) {
		if !self.by_type.contains_key(&TypeId::of::<T>()) {
			self.register::<T>(None);
		}
	}

	pub fn reset_session(&mut self) {
		self.session_names.clear();
		self.session_name_index.clear();
	}

	pub fn class_info_by_type(&self, type_id: TypeId) -> Option<&ClassInfo> {
		self.by_type.get(&type_id).map(|r| &r.info)
	}

	pub fn class_info_by_id(&self, class_id: u32) -> Option<&ClassInfo> {
		let type_id = self.by_id.get(&class_id)?;
		self.class_info_by_type(*type_id)
	}

	pub fn class_info_by_name(&self, name: &str) -> Option<&ClassInfo> {
		let type_id = self.by_name.get(name)?;
		self.class_info_by_type(*type_id)
	}

	pub fn declared_order_indices(&self, type_id: TypeId) -> Option<&[usize]> {
		self.by_type.get(&type_id).map(|r| r.declared_order_indices.as_ref())
	}

	pub fn handlers_by_type(&self, type_id: TypeId) -> Option<ClassHandlers> {
		self.by_type.get(&type_id).map(|r| r.handlers)
	}

	pub fn handlers_by_id(&self, class_id: u32) -> Option<ClassHandlers> {
		let type_id = self.by_id.get(&class_id)?;
		self.handlers_by_type(*type_id)
	}

	pub fn class_id_of(&self, type_id: TypeId) -> Option<u32> {
		self.by_type.get(&type_id).and_then(|r| r.info.class_id)
	}

	pub fn resolve_final_reference(&self, type_name: &str) -> Option<u32> {
		let type_id = self.by_name.get(type_name)?;
		self.class_id_of(*type_id)
	}

	pub fn type_id_by_name(&self, type_name: &str) -> Option<TypeId> {
		self.by_name.get(type_name).copied()
	}

	/// Writes a class reference for a value whose declared type is erased
	/// (the "other reference" field group): registered id if `T` has one,
	/// otherwise a dynamic name, deduplicated per session by a low-bit
	/// discriminator (`0` = registered id, `1` = dynamic name/index).
	///
	/// `registration_required` is the caller's `class_registration_required`
	/// flag: with no class id to write and that flag set, a dynamic name
	/// reference would let an unregistered type onto the wire, exactly what
	/// that flag exists to forbid, so this refuses with `InsecureType` instead.
	pub fn write_class_ref(&mut self, buf: &mut Buffer, type_id: TypeId, type_name: &str, registration_required: bool) -> Result<()> {
		if let Some(class_id) = self.class_id_of(type_id) {
			buf.write_varuint32(class_id << 1);
			return Ok(());
		}
		if registration_required {
			return Err(Error::InsecureType { offset: buf.writer_index(), type_name: type_name.to_string() });
		}
		if let Some(&idx) = self.session_name_index.get(type_name) {
			buf.write_varuint32(((idx + 1) << 1) | 1);
			return Ok(());
		}
		let idx = self.session_names.len() as u32;
		self.session_names.push(Arc::from(type_name));
		self.session_name_index.insert(Arc::from(type_name), idx);
		buf.write_varuint32(1); // (0 << 1) | 1: first sight marker
		let (package, name) = split_qualified_name(type_name);
		buf.write_string(package, true);
		buf.write_string(name, true);
		Ok(())
	}

	pub fn read_class_ref(&mut self, buf: &mut Buffer) -> Result<ClassRef> {
		let offset = buf.reader_index();
		let tag = buf.read_varuint32()?;
		if tag & 1 == 0 {
			let class_id = tag >> 1;
			let type_id = self.by_id.get(&class_id).copied().ok_or(Error::ClassNotRegistered { offset, class_id })?;
			return Ok(ClassRef::Registered(type_id));
		}
		let payload = tag >> 1;
		if payload == 0 {
			let package = buf.read_string()?;
			let name = buf.read_string()?;
			let qualified: Arc<str> = if package.is_empty() { Arc::from(name.as_str()) } else { Arc::from(format!("{package}.{name}")) };
			let idx = self.session_names.len() as u32;
			self.session_names.push(qualified.clone());
			self.session_name_index.insert(qualified.clone(), idx);
			if let Some(&type_id) = self.by_name.get(&qualified) {
				return Ok(ClassRef::Registered(type_id));
			}
			return Ok(ClassRef::Unknown(qualified));
		}
		let idx = payload - 1;
		let name = self.session_names.get(idx as usize).cloned().ok_or(Error::UnknownClassName { offset, name: String::new() })?;
		if let Some(&type_id) = self.by_name.get(&name) {
			return Ok(ClassRef::Registered(type_id));
		}
		Ok(ClassRef::Unknown(name))
	}
}

/// Splits `a.b.Name` into `("a.b", "Name")`, matching §6's
/// package/name split for compressibility; types with no package component
/// yield an empty package string.
fn split_qualified_name(type_name: &str) -> (&str, &str) {
	match type_name.rfind('.') {
		Some(idx) => (&type_name[..idx], &type_name[idx + 1..]),
		None => ("", type_name),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn qualified_name_splits_on_last_dot() {
		assert_eq!(split_qualified_name("demo.shapes.Circle"), ("demo.shapes", "Circle"));
		assert_eq!(split_qualified_name("Circle"), ("", "Circle"));
	}
}
