//! The Generic Object Serializer (§4.7): walks a class's grouped field list
//! by value rather than by generated per-field code, and the COMPATIBLE-mode
//! variant (§4.5/§8 S6) that trades the grouped list for a wire-transmitted
//! `ClassDefinition` so two schema versions can still share the fields they
//! agree on.

use std::any::Any;
use std::fmt::Debug;
use std::rc::Rc;
use std::sync::Arc;

use crate::buffer::Buffer;
use crate::class::definition::ClassDefinition;
use crate::class::info::ClassInfo;
use crate::class::resolver::ClassRef;
use crate::config::CompatibilityMode;
use crate::descriptor::{FieldValue, FuryObject, OwnedFieldShape, PrimitiveShape, PrimitiveValue};
use crate::error::{Error, Result};
use crate::reference::{read_null_flag, ReadSignal, WriteOutcome};
use crate::session::{Session, TrackedValue};

fn write_primitive(value: PrimitiveValue, buf: &mut Buffer, compress_number: bool) {
	match value {
		PrimitiveValue::Bool(v) => buf.write_bool(v),
		PrimitiveValue::I8(v) => buf.write_byte(v as u8),
		PrimitiveValue::I16(v) => buf.write_i16(v),
		PrimitiveValue::Char(v) => buf.write_u32(v as u32),
		PrimitiveValue::I32(v) => {
			if compress_number {
				buf.write_varint32(v)
			} else {
				buf.write_i32(v)
			}
		}
		PrimitiveValue::I64(v) => {
			if compress_number {
				buf.write_varint64(v)
			} else {
				buf.write_i64(v)
			}
		}
		PrimitiveValue::F32(v) => buf.write_f32(v),
		PrimitiveValue::F64(v) => buf.write_f64(v),
	}
}

fn read_primitive(shape: PrimitiveShape, buf: &mut Buffer, compress_number: bool) -> Result<PrimitiveValue> {
	Ok(match shape {
		PrimitiveShape::Bool => PrimitiveValue::Bool(buf.read_bool()?),
		PrimitiveShape::I8 => PrimitiveValue::I8(buf.read_byte()? as i8),
		PrimitiveShape::I16 => PrimitiveValue::I16(buf.read_i16()?),
		PrimitiveShape::Char => PrimitiveValue::Char(char::from_u32(buf.read_u32()?).unwrap_or(char::REPLACEMENT_CHARACTER)),
		PrimitiveShape::I32 => PrimitiveValue::I32(if compress_number { buf.read_varint32()? } else { buf.read_i32()? }),
		PrimitiveShape::I64 => PrimitiveValue::I64(if compress_number { buf.read_varint64()? } else { buf.read_i64()? }),
		PrimitiveShape::F32 => PrimitiveValue::F32(buf.read_f32()?),
		PrimitiveShape::F64 => PrimitiveValue::F64(buf.read_f64()?),
	})
}

/// A `PrimitiveValue` is always `Copy`, never `Rc`-backed, so it has no
/// pointer identity to track; `basic_types_ref_ignored` has nothing left to
/// switch off in this host and a boxed primitive always takes the untracked
/// null-flag path.
fn write_boxed_primitive(value: Option<PrimitiveValue>, buf: &mut Buffer, compress_number: bool) {
	match crate::reference::WriteRefResolver::write_null_flag(buf, value.is_none()) {
		WriteOutcome::Complete => {}
		WriteOutcome::WriteBody => write_primitive(value.expect("WriteBody implies a value"), buf, compress_number),
	}
}

fn read_boxed_primitive(shape: PrimitiveShape, buf: &mut Buffer, compress_number: bool) -> Result<Option<PrimitiveValue>> {
	if read_null_flag(buf)? {
		Ok(None)
	} else {
		Ok(Some(read_primitive(shape, buf, compress_number)?))
	}
}

fn string_identity(s: &Rc<str>) -> usize {
	Rc::as_ptr(s).cast::<u8>() as usize
}

fn write_optional_string(value: Option<Rc<str>>, buf: &mut Buffer, session: &mut Session) -> Result<()> {
	let prefer_latin1 = session.config().compress_string();
	if session.config().string_ref_ignored() {
		match crate::reference::WriteRefResolver::write_null_flag(buf, value.is_none()) {
			WriteOutcome::Complete => return Ok(()),
			WriteOutcome::WriteBody => {
				buf.write_string(&value.expect("WriteBody implies a value"), prefer_latin1);
				return Ok(());
			}
		}
	}
	let identity = value.as_ref().map(string_identity);
	match session.write_refs().write_ref_or_null(buf, identity) {
		WriteOutcome::Complete => Ok(()),
		WriteOutcome::WriteBody => {
			buf.write_string(&value.expect("WriteBody implies a value"), prefer_latin1);
			Ok(())
		}
	}
}

fn read_optional_string(buf: &mut Buffer, session: &mut Session) -> Result<Option<Rc<str>>> {
	if session.config().string_ref_ignored() {
		return if read_null_flag(buf)? { Ok(None) } else { Ok(Some(Rc::from(buf.read_string()?.as_str()))) };
	}
	let offset = buf.reader_index();
	match session.read_refs().try_preserve_ref_id(buf)? {
		ReadSignal::Null => Ok(None),
		ReadSignal::Untracked => Ok(Some(Rc::from(buf.read_string()?.as_str()))),
		ReadSignal::Tracked(id) => {
			let value: Rc<str> = Rc::from(buf.read_string()?.as_str());
			session.read_refs().set_read_object(id, TrackedValue::Str(value.clone()));
			Ok(Some(value))
		}
		ReadSignal::BackReference(id) => {
			let tracked = session.read_refs().get_read_object(id).ok_or(Error::DanglingReference { offset, id })?;
			Ok(tracked.as_str())
		}
	}
}

/// Writes a reference-typed field slot. `type_name` fixes the class for a
/// final-reference field so no class id is written; `None` means the runtime
/// type must be announced (the `Object`-shaped, possibly-polymorphic group).
fn write_object_slot(value: Option<Rc<dyn crate::descriptor::FuryObject>>, type_name: Option<&'static str>, buf: &mut Buffer, session: &mut Session) -> Result<()> {
	let identity = value.as_ref().map(|o| Rc::as_ptr(o) as *const () as usize);
	match session.write_refs().write_ref_or_null(buf, identity) {
		WriteOutcome::Complete => Ok(()),
		WriteOutcome::WriteBody => {
			let object = value.expect("WriteBody implies a value");
			let type_id = object.as_any().type_id();
			if type_name.is_none() {
				let registration_required = session.config().class_registration_required();
				session.resolver_mut().write_class_ref(buf, type_id, object.fury_type_name(), registration_required)?;
			}
			let handlers = session
				.resolver()
				.handlers_by_type(type_id)
				.ok_or_else(|| Error::UnregisteredRuntimeType { offset: buf.writer_index(), type_name: object.fury_type_name().to_string() })?;
			(handlers.write)(object.as_ref(), buf, session)
		}
	}
}

fn read_object_slot(type_name: Option<&'static str>, buf: &mut Buffer, session: &mut Session) -> Result<Option<Rc<dyn crate::descriptor::FuryObject>>> {
	let offset = buf.reader_index();
	let signal = session.read_refs().try_preserve_ref_id(buf)?;
	let tracked_id = match signal {
		ReadSignal::Null => return Ok(None),
		ReadSignal::BackReference(id) => {
			let tracked = session.read_refs().get_read_object(id).ok_or(Error::DanglingReference { offset, id })?;
			return Ok(tracked.as_object());
		}
		ReadSignal::Tracked(id) => Some(id),
		ReadSignal::Untracked => None,
	};

	let type_id = if let Some(name) = type_name {
		session.resolver().type_id_by_name(name).ok_or_else(|| Error::UnknownClassName { offset, name: name.to_string() })?
	} else {
		match session.resolver_mut().read_class_ref(buf)? {
			ClassRef::Registered(type_id) => type_id,
			ClassRef::Unknown(name) => {
				if session.config().secure_mode_enabled() || !session.config().deserialize_unknown_class_enabled() {
					return Err(Error::UnknownClassName { offset, name: name.to_string() });
				}
				let placeholder = read_unknown_object(name, buf, session)?;
				if let Some(id) = tracked_id {
					session.read_refs().set_read_object(id, TrackedValue::Object(placeholder.clone()));
				}
				return Ok(Some(placeholder));
			}
		}
	};

	let handlers = session.resolver().handlers_by_type(type_id).ok_or(Error::ClassNotRegistered { offset, class_id: 0 })?;
	let value = (handlers.read)(buf, session)?;
	if let Some(id) = tracked_id {
		session.read_refs().set_read_object(id, TrackedValue::Object(value.clone()));
	}
	Ok(Some(value))
}

/// Stand-in for a value of a class this resolver has no Rust type for,
/// produced only when `deserialize_unknown_class_enabled` lets a caller keep
/// going instead of failing outright. Carries every field the sender's
/// `ClassDefinition` declared, in that declaration's order, since there is no
/// local struct to reorder them against.
#[derive(Debug, Clone)]
pub struct PlaceholderObject {
	pub type_name: Rc<str>,
	pub fields: Vec<FieldValue>,
}

impl FuryObject for PlaceholderObject {
	fn fury_type_name(&self) -> &'static str {
		"<unknown>"
	}

	fn fury_field_values(&self) -> Vec<FieldValue> {
		self.fields.clone()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
		self
	}
}

/// Reads the body of a class this resolver has no Rust type for, when the
/// caller has opted in to tolerating that (§4.4/§7). Only possible in
/// `Compatible` mode: the sender's `ClassDefinition` self-describes the field
/// list there, so the remote fields can be read in full and kept on the
/// placeholder without a local schema to match them against. `SchemaConsistent`
/// mode transmits no such description, so an unknown class there has no
/// self-describing length to skip by and still has to be fatal.
pub fn read_unknown_object(name: Arc<str>, buf: &mut Buffer, session: &mut Session) -> Result<Rc<dyn FuryObject>> {
	let offset = buf.reader_index();
	if session.config().compatible_mode() != CompatibilityMode::Compatible {
		return Err(Error::UnknownClassName { offset, name: name.to_string() });
	}

	let index = buf.read_varuint32()?;
	let is_new = buf.read_bool()?;
	let definition = if is_new {
		let len = buf.read_varuint32()? as usize;
		let bytes = buf.read_bytes(len)?;
		let mut inner = Buffer::from_bytes(bytes);
		let definition = ClassDefinition::decode(&mut inner)?;
		session.meta_context().register_received(definition.clone());
		definition
	} else {
		session.meta_context().get(index).cloned().ok_or(Error::IncompatibleSchema { offset, reason: "meta context index not found" })?
	};

	let mut fields = Vec::with_capacity(definition.fields.len());
	for remote_field in &definition.fields {
		fields.push(read_value(&remote_field.field_type.to_owned_shape(), buf, session)?);
	}
	Ok(Rc::new(PlaceholderObject { type_name: Rc::from(name.as_ref()), fields }) as Rc<dyn FuryObject>)
}

/// Top dispatcher for a single field (or element, or key, or value) by its
/// declared shape. Collections and maps delegate back into this for each
/// member instead of special-casing their own primitive/object split.
pub fn write_value(value: &FieldValue, shape: &OwnedFieldShape, buf: &mut Buffer, session: &mut Session) -> Result<()> {
	match (shape, value) {
		(OwnedFieldShape::Primitive(_), FieldValue::Primitive(p)) => {
			write_primitive(*p, buf, session.config().compress_number());
			Ok(())
		}
		(OwnedFieldShape::BoxedPrimitive(_), FieldValue::Boxed(opt)) => {
			write_boxed_primitive(*opt, buf, session.config().compress_number());
			Ok(())
		}
		(OwnedFieldShape::FinalReference { type_name }, FieldValue::String(opt)) if *type_name == "String" => {
			write_optional_string(opt.clone(), buf, session)
		}
		(OwnedFieldShape::FinalReference { type_name }, FieldValue::Object(opt)) => write_object_slot(opt.clone(), Some(type_name), buf, session),
		(OwnedFieldShape::Object, FieldValue::Object(opt)) => write_object_slot(opt.clone(), None, buf, session),
		(OwnedFieldShape::Collection { element, monomorphic }, FieldValue::List(opt)) => {
			crate::collection::write_collection(opt.as_deref(), element, *monomorphic, buf, session)
		}
		(OwnedFieldShape::Map { key, value: value_shape, monomorphic }, FieldValue::Map(opt)) => {
			crate::map::write_map(opt.as_deref(), key, value_shape, *monomorphic, buf, session)
		}
		_ => Err(Error::ConstructionFailure { type_name: "<field value does not match its declared shape>" }),
	}
}

pub fn read_value(shape: &OwnedFieldShape, buf: &mut Buffer, session: &mut Session) -> Result<FieldValue> {
	Ok(match shape {
		OwnedFieldShape::Primitive(p) => FieldValue::Primitive(read_primitive(*p, buf, session.config().compress_number())?),
		OwnedFieldShape::BoxedPrimitive(p) => FieldValue::Boxed(read_boxed_primitive(*p, buf, session.config().compress_number())?),
		OwnedFieldShape::FinalReference { type_name } if *type_name == "String" => FieldValue::String(read_optional_string(buf, session)?),
		OwnedFieldShape::FinalReference { type_name } => FieldValue::Object(read_object_slot(Some(type_name), buf, session)?),
		OwnedFieldShape::Object => FieldValue::Object(read_object_slot(None, buf, session)?),
		OwnedFieldShape::Collection { element, monomorphic } => FieldValue::List(crate::collection::read_collection(element, *monomorphic, buf, session)?),
		OwnedFieldShape::Map { key, value, monomorphic } => FieldValue::Map(crate::map::read_map(key, value, *monomorphic, buf, session)?),
	})
}

/// Default value plugged into a local field a COMPATIBLE-mode sender never
/// transmitted (§8 S6): the receiver's added field is left at its zero value
/// rather than failing construction outright.
fn default_value_for(shape: &OwnedFieldShape) -> FieldValue {
	match shape {
		OwnedFieldShape::Primitive(p) => FieldValue::Primitive(zero_primitive(*p)),
		OwnedFieldShape::BoxedPrimitive(_) => FieldValue::Boxed(None),
		OwnedFieldShape::FinalReference { type_name } if *type_name == "String" => FieldValue::String(None),
		OwnedFieldShape::FinalReference { .. } | OwnedFieldShape::Object => FieldValue::Object(None),
		OwnedFieldShape::Collection { .. } => FieldValue::List(None),
		OwnedFieldShape::Map { .. } => FieldValue::Map(None),
	}
}

fn zero_primitive(shape: PrimitiveShape) -> PrimitiveValue {
	match shape {
		PrimitiveShape::Bool => PrimitiveValue::Bool(false),
		PrimitiveShape::I8 => PrimitiveValue::I8(0),
		PrimitiveShape::I16 => PrimitiveValue::I16(0),
		PrimitiveShape::Char => PrimitiveValue::Char('\0'),
		PrimitiveShape::I32 => PrimitiveValue::I32(0),
		PrimitiveShape::I64 => PrimitiveValue::I64(0),
		PrimitiveShape::F32 => PrimitiveValue::F32(0.0),
		PrimitiveShape::F64 => PrimitiveValue::F64(0.0),
	}
}

/// Un-permutes a grouped-order vector back to declaration order via the
/// resolver's precomputed index table (§4.7): `indices[grouped_pos]` names
/// the declared-order slot that field belongs in.
fn into_declared_order(grouped: Vec<FieldValue>, indices: &[usize]) -> Vec<FieldValue> {
	let mut out: Vec<Option<FieldValue>> = (0..indices.len()).map(|_| None).collect();
	for (grouped_pos, value) in grouped.into_iter().enumerate() {
		out[indices[grouped_pos]] = Some(value);
	}
	out.into_iter().map(|v| v.expect("declared_order_indices must be a permutation of 0..len")).collect()
}

/// Truncates the COMPATIBLE-mode `ClassDefinition` content hash (§4.5/design
/// note 9) to the 4 bytes SCHEMA_CONSISTENT mode spends on a version check —
/// two peers that agree on field names and shapes always compute the same
/// value, so reusing the existing content hash costs nothing extra to derive.
fn class_version_hash(info: &ClassInfo, session: &Session) -> u32 {
	let definition = ClassDefinition::build(info, |name| session.resolver().resolve_final_reference(name));
	definition.id as u32
}

fn write_fields_schema_consistent(info: &ClassInfo, indices: &[usize], values: &[FieldValue], buf: &mut Buffer, session: &mut Session) -> Result<()> {
	if session.config().should_check_class_version() {
		buf.write_u32(class_version_hash(info, session));
	}
	for (grouped_pos, field) in info.fields.iter().enumerate() {
		write_value(&values[indices[grouped_pos]], &field.shape, buf, session)?;
	}
	Ok(())
}

fn read_fields_schema_consistent(info: &ClassInfo, indices: &[usize], buf: &mut Buffer, session: &mut Session) -> Result<Vec<FieldValue>> {
	if session.config().should_check_class_version() {
		let offset = buf.reader_index();
		let expected = class_version_hash(info, session);
		let found = buf.read_u32()?;
		if found != expected {
			return Err(Error::ClassVersionMismatch { offset, expected, found });
		}
	}
	let mut grouped = Vec::with_capacity(info.fields.len());
	for field in info.fields.iter() {
		grouped.push(read_value(&field.shape, buf, session)?);
	}
	Ok(into_declared_order(grouped, indices))
}

fn write_fields_compatible(info: &ClassInfo, indices: &[usize], values: &[FieldValue], buf: &mut Buffer, session: &mut Session) -> Result<()> {
	let definition = ClassDefinition::build(info, |name| session.resolver().resolve_final_reference(name));
	let (index, is_new) = session.meta_context().intern(definition.clone());
	buf.write_varuint32(index);
	buf.write_bool(is_new);
	if is_new {
		let encoded = definition.encode();
		buf.write_varuint32(encoded.len() as u32);
		buf.write_bytes(&encoded);
	}
	for (grouped_pos, field) in definition.fields.iter().enumerate() {
		write_value(&values[indices[grouped_pos]], &field.field_type.to_owned_shape(), buf, session)?;
	}
	Ok(())
}

fn read_fields_compatible(info: &ClassInfo, indices: &[usize], buf: &mut Buffer, session: &mut Session) -> Result<Vec<FieldValue>> {
	let offset = buf.reader_index();
	let index = buf.read_varuint32()?;
	let is_new = buf.read_bool()?;
	let definition = if is_new {
		let len = buf.read_varuint32()? as usize;
		let bytes = buf.read_bytes(len)?;
		let mut inner = Buffer::from_bytes(bytes);
		let definition = ClassDefinition::decode(&mut inner)?;
		session.meta_context().register_received(definition.clone());
		definition
	} else {
		session.meta_context().get(index).cloned().ok_or(Error::IncompatibleSchema { offset, reason: "meta context index not found" })?
	};

	let mut local_values: Vec<Option<FieldValue>> = (0..info.fields.len()).map(|_| None).collect();
	for remote_field in &definition.fields {
		let shape = remote_field.field_type.to_owned_shape();
		let value = read_value(&shape, buf, session)?;
		if let Some(local_pos) = info.fields.iter().position(|f| f.declaring_class == remote_field.declaring_class && f.name == remote_field.field_name) {
			local_values[local_pos] = Some(value);
		}
	}

	let grouped: Vec<FieldValue> = info
		.fields
		.iter()
		.zip(local_values)
		.map(|(field, value)| value.unwrap_or_else(|| default_value_for(&field.shape)))
		.collect();
	Ok(into_declared_order(grouped, indices))
}

/// Writes `values` (declaration order) as `info`'s field group, in whichever
/// wire shape the session's compatibility mode calls for.
pub fn write_fields(info: &ClassInfo, indices: &[usize], values: &[FieldValue], buf: &mut Buffer, session: &mut Session) -> Result<()> {
	match session.config().compatible_mode() {
		CompatibilityMode::SchemaConsistent => write_fields_schema_consistent(info, indices, values, buf, session),
		CompatibilityMode::Compatible => write_fields_compatible(info, indices, values, buf, session),
	}
}

/// Reads a field group back into declaration order, ready for `T::construct`.
pub fn read_fields(info: &ClassInfo, indices: &[usize], buf: &mut Buffer, session: &mut Session) -> Result<Vec<FieldValue>> {
	match session.config().compatible_mode() {
		CompatibilityMode::SchemaConsistent => read_fields_schema_consistent(info, indices, buf, session),
		CompatibilityMode::Compatible => read_fields_compatible(info, indices, buf, session),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::class::grouping::GroupableField;
	use crate::class::resolver::ClassResolver;
	use crate::config::Config;

	fn sample_info() -> ClassInfo {
		ClassInfo::new(
			Some(100),
			"demo.Point",
			true,
			vec![
				GroupableField { declaring_class: "Point", name: "x", shape: OwnedFieldShape::Primitive(PrimitiveShape::I32) },
				GroupableField { declaring_class: "Point", name: "y", shape: OwnedFieldShape::Primitive(PrimitiveShape::I32) },
			],
			true,
		)
	}

	#[test]
	fn schema_consistent_fields_round_trip_in_declared_order() {
		let config = Config::default();
		let mut resolver = ClassResolver::new();
		let mut session = Session::new(&config, &mut resolver);
		let info = sample_info();
		let indices = [0usize, 1usize];
		let values = vec![FieldValue::Primitive(PrimitiveValue::I32(3)), FieldValue::Primitive(PrimitiveValue::I32(7))];

		let mut buf = Buffer::new();
		write_fields_schema_consistent(&info, &indices, &values, &mut buf, &mut session).unwrap();
		buf.set_reader_index(0);
		let decoded = read_fields_schema_consistent(&info, &indices, &mut buf, &mut session).unwrap();
		match (&decoded[0], &decoded[1]) {
			(FieldValue::Primitive(PrimitiveValue::I32(x)), FieldValue::Primitive(PrimitiveValue::I32(y))) => {
				assert_eq!(*x, 3);
				assert_eq!(*y, 7);
			}
			other => panic!("unexpected decode {other:?}"),
		}
	}

	#[test]
	fn repeated_string_reference_is_a_back_reference() {
		let config = Config::default();
		let mut resolver = ClassResolver::new();
		let mut session = Session::new(&config, &mut resolver);
		let shared: Rc<str> = Rc::from("shared");

		let mut buf = Buffer::new();
		write_optional_string(Some(shared.clone()), &mut buf, &mut session).unwrap();
		let first_len = buf.writer_index();
		write_optional_string(Some(shared.clone()), &mut buf, &mut session).unwrap();
		let second_len = buf.writer_index() - first_len;
		assert!(second_len < first_len, "back-reference ({second_len}B) should be shorter than the first write ({first_len}B)");

		buf.set_reader_index(0);
		let first = read_optional_string(&mut buf, &mut session).unwrap().unwrap();
		let second = read_optional_string(&mut buf, &mut session).unwrap().unwrap();
		assert_eq!(first.as_ref(), "shared");
		assert!(Rc::ptr_eq(&first, &second));
	}

	#[test]
	fn boxed_primitive_null_round_trips() {
		let mut buf = Buffer::new();
		write_boxed_primitive(None, &mut buf, true);
		buf.set_reader_index(0);
		assert_eq!(read_boxed_primitive(PrimitiveShape::I32, &mut buf, true).unwrap(), None);
	}

	#[test]
	fn class_version_hash_round_trips_when_schemas_match() {
		let config = Config::builder().check_class_version(true).build();
		let mut resolver = ClassResolver::new();
		let mut session = Session::new(&config, &mut resolver);
		let info = sample_info();
		let indices = [0usize, 1usize];
		let values = vec![FieldValue::Primitive(PrimitiveValue::I32(3)), FieldValue::Primitive(PrimitiveValue::I32(7))];

		let mut buf = Buffer::new();
		write_fields_schema_consistent(&info, &indices, &values, &mut buf, &mut session).unwrap();
		buf.set_reader_index(0);
		let decoded = read_fields_schema_consistent(&info, &indices, &mut buf, &mut session).unwrap();
		match (&decoded[0], &decoded[1]) {
			(FieldValue::Primitive(PrimitiveValue::I32(x)), FieldValue::Primitive(PrimitiveValue::I32(y))) => {
				assert_eq!(*x, 3);
				assert_eq!(*y, 7);
			}
			other => panic!("unexpected decode {other:?}"),
		}
	}

	#[test]
	fn class_version_mismatch_is_rejected() {
		let config = Config::builder().check_class_version(true).build();
		let mut resolver = ClassResolver::new();
		let mut session = Session::new(&config, &mut resolver);

		let sender_info = sample_info();
		let indices = [0usize, 1usize];
		let values = vec![FieldValue::Primitive(PrimitiveValue::I32(3)), FieldValue::Primitive(PrimitiveValue::I32(7))];
		let mut buf = Buffer::new();
		write_fields_schema_consistent(&sender_info, &indices, &values, &mut buf, &mut session).unwrap();
		buf.set_reader_index(0);

		let receiver_info = ClassInfo::new(
			Some(100),
			"demo.Point",
			true,
			vec![GroupableField { declaring_class: "Point", name: "x", shape: OwnedFieldShape::Primitive(PrimitiveShape::I32) }],
			true,
		);
		let receiver_indices = [0usize];
		let err = read_fields_schema_consistent(&receiver_info, &receiver_indices, &mut buf, &mut session).unwrap_err();
		assert!(matches!(err, Error::ClassVersionMismatch { .. }));
	}
}
