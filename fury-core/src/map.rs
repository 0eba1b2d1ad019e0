//! The Map Serializer (§4.9): a length-prefixed codec over `(key, value)`
//! pairs. The four "final/final, final/poly, poly/final, poly/poly" fast
//! paths the original format calls out need no dedicated code here — each
//! key and each value independently goes through `write_value`/`read_value`,
//! which already skips the class id for a monomorphic shape and writes one
//! for a polymorphic `Object` shape, so the fast paths fall out of the
//! generic per-entry dispatch rather than needing four key/value-shape
//! combinations spelled out by hand.

use crate::buffer::Buffer;
use crate::descriptor::{FieldValue, OwnedFieldShape};
use crate::error::Result;
use crate::reference::read_null_flag;
use crate::session::Session;

pub fn write_map(
	entries: Option<&[(FieldValue, FieldValue)]>,
	key_shape: &OwnedFieldShape,
	value_shape: &OwnedFieldShape,
	_monomorphic: bool,
	buf: &mut Buffer,
	session: &mut Session,
) -> Result<()> {
	let is_null = entries.is_none();
	match crate::reference::WriteRefResolver::write_null_flag(buf, is_null) {
		crate::reference::WriteOutcome::Complete => return Ok(()),
		crate::reference::WriteOutcome::WriteBody => {}
	}
	let entries = entries.expect("WriteBody implies a value");
	buf.write_varuint32(entries.len() as u32);

	for (key, value) in entries {
		session.generics().push(key_shape.clone());
		let result = crate::object::write_value(key, key_shape, buf, session);
		session.generics().pop();
		result?;

		session.generics().push(value_shape.clone());
		let result = crate::object::write_value(value, value_shape, buf, session);
		session.generics().pop();
		result?;
	}
	Ok(())
}

pub fn read_map(
	key_shape: &OwnedFieldShape,
	value_shape: &OwnedFieldShape,
	_monomorphic: bool,
	buf: &mut Buffer,
	session: &mut Session,
) -> Result<Option<Vec<(FieldValue, FieldValue)>>> {
	if read_null_flag(buf)? {
		return Ok(None);
	}
	let len = buf.read_varuint32()? as usize;
	let mut entries = Vec::with_capacity(len);
	for _ in 0..len {
		session.generics().push(key_shape.clone());
		let key = crate::object::read_value(key_shape, buf, session);
		session.generics().pop();

		session.generics().push(value_shape.clone());
		let value = crate::object::read_value(value_shape, buf, session);
		session.generics().pop();

		entries.push((key?, value?));
	}
	Ok(Some(entries))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::class::resolver::ClassResolver;
	use crate::config::Config;
	use crate::descriptor::{PrimitiveShape, PrimitiveValue};

	#[test]
	fn entries_round_trip_in_insertion_order() {
		let config = Config::default();
		let mut resolver = ClassResolver::new();
		let mut session = Session::new(&config, &mut resolver);
		let key_shape = OwnedFieldShape::Primitive(PrimitiveShape::I32);
		let value_shape = OwnedFieldShape::FinalReference { type_name: "String" };

		let entries = vec![
			(FieldValue::Primitive(PrimitiveValue::I32(1)), FieldValue::String(Some(std::rc::Rc::from("one")))),
			(FieldValue::Primitive(PrimitiveValue::I32(2)), FieldValue::String(Some(std::rc::Rc::from("two")))),
		];

		let mut buf = Buffer::new();
		write_map(Some(&entries), &key_shape, &value_shape, true, &mut buf, &mut session).unwrap();
		buf.set_reader_index(0);
		let decoded = read_map(&key_shape, &value_shape, true, &mut buf, &mut session).unwrap().unwrap();

		assert_eq!(decoded.len(), 2);
		match (&decoded[0].0, &decoded[0].1) {
			(FieldValue::Primitive(PrimitiveValue::I32(1)), FieldValue::String(Some(s))) => assert_eq!(s.as_ref(), "one"),
			other => panic!("unexpected entry {other:?}"),
		}
	}
}
