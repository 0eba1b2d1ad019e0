//! The Collection Serializer (§4.8): a length-prefixed, element-shape-driven
//! codec shared by every `Vec`/`List`/`Set`-shaped field.
//!
//! `FieldValue::List` owns its elements directly (`Option<Vec<FieldValue>>`,
//! not `Option<Rc<Vec<_>>>`), so a collection has no shareable identity to
//! key a back-reference on — every occurrence is written out in full, the
//! same untracked-null-flag treatment a boxed primitive gets. Nested element
//! values still get full reference tracking through `write_value`/`read_value`.
//! The EMPTY and SINGLETON special cases the original format calls out fold
//! into the general varuint length prefix here: a zero or one-element
//! collection is already as compact as a dedicated tag would make it.

use crate::buffer::Buffer;
use crate::descriptor::{FieldValue, OwnedFieldShape};
use crate::error::Result;
use crate::reference::read_null_flag;
use crate::session::Session;

const HEADER_HAS_COMPARATOR: u8 = 1 << 0;

pub fn write_collection(elements: Option<&[FieldValue]>, element_shape: &OwnedFieldShape, _monomorphic: bool, buf: &mut Buffer, session: &mut Session) -> Result<()> {
	let is_null = elements.is_none();
	match crate::reference::WriteRefResolver::write_null_flag(buf, is_null) {
		crate::reference::WriteOutcome::Complete => return Ok(()),
		crate::reference::WriteOutcome::WriteBody => {}
	}
	let elements = elements.expect("WriteBody implies a value");
	buf.write_varuint32(elements.len() as u32);
	buf.write_byte(0); // no sorted-collection comparator support (§4.8 non-goal)

	session.generics().push(element_shape.clone());
	let result = (|| {
		for element in elements {
			crate::object::write_value(element, element_shape, buf, session)?;
		}
		Ok(())
	})();
	session.generics().pop();
	result
}

pub fn read_collection(element_shape: &OwnedFieldShape, _monomorphic: bool, buf: &mut Buffer, session: &mut Session) -> Result<Option<Vec<FieldValue>>> {
	if read_null_flag(buf)? {
		return Ok(None);
	}
	let len = buf.read_varuint32()? as usize;
	let header = buf.read_byte()?;
	debug_assert_eq!(header & HEADER_HAS_COMPARATOR, 0, "custom collection comparators are not supported");

	session.generics().push(element_shape.clone());
	let result = (|| {
		let mut elements = Vec::with_capacity(len);
		for _ in 0..len {
			elements.push(crate::object::read_value(element_shape, buf, session)?);
		}
		Ok(elements)
	})();
	session.generics().pop();
	result.map(Some)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Config;
	use crate::class::resolver::ClassResolver;
	use crate::descriptor::{PrimitiveShape, PrimitiveValue};

	fn as_i32s(values: &[FieldValue]) -> Vec<i32> {
		values
			.iter()
			.map(|v| match v {
				FieldValue::Primitive(PrimitiveValue::I32(n)) => *n,
				other => panic!("unexpected value {other:?}"),
			})
			.collect()
	}

	#[test]
	fn empty_and_populated_collections_round_trip() {
		let config = Config::default();
		let mut resolver = ClassResolver::new();
		let mut session = Session::new(&config, &mut resolver);
		let shape = OwnedFieldShape::Primitive(PrimitiveShape::I32);

		let mut buf = Buffer::new();
		write_collection(Some(&[]), &shape, true, &mut buf, &mut session).unwrap();
		let values = vec![FieldValue::Primitive(PrimitiveValue::I32(1)), FieldValue::Primitive(PrimitiveValue::I32(2))];
		write_collection(Some(&values), &shape, true, &mut buf, &mut session).unwrap();
		write_collection(None, &shape, true, &mut buf, &mut session).unwrap();

		buf.set_reader_index(0);
		assert!(read_collection(&shape, true, &mut buf, &mut session).unwrap().unwrap().is_empty());
		assert_eq!(as_i32s(&read_collection(&shape, true, &mut buf, &mut session).unwrap().unwrap()), vec![1, 2]);
		assert!(read_collection(&shape, true, &mut buf, &mut session).unwrap().is_none());
	}
}
