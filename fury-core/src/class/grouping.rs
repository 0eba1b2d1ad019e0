//! The Descriptor Grouper (§4.6): a pure function from an unordered field
//! list to the six-group wire order, shared by statically-registered Rust
//! types and dynamically-received `ClassDefinition`s alike so both sides of
//! a COMPATIBLE-mode exchange reconstruct the identical order independently.

use crate::descriptor::{FieldDescriptor, OwnedFieldShape, PrimitiveShape};

/// One field plus its shape, owned so this can describe either a `'static`
/// Rust type or a schema just parsed off the wire.
#[derive(Debug, Clone)]
pub struct GroupableField {
	pub declaring_class: &'static str,
	pub name: &'static str,
	pub shape: OwnedFieldShape,
}

impl From<&FieldDescriptor> for GroupableField {
	fn from(descriptor: &FieldDescriptor) -> Self {
		GroupableField {
			declaring_class: descriptor.declaring_class,
			name: descriptor.name,
			shape: descriptor.shape.to_owned_shape(),
		}
	}
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum GroupRank {
	Primitive,
	BoxedPrimitive,
	FinalReference,
	Object,
	Collection,
	Map,
}

fn group_rank(shape: &OwnedFieldShape) -> GroupRank {
	match shape {
		OwnedFieldShape::Primitive(_) => GroupRank::Primitive,
		OwnedFieldShape::BoxedPrimitive(_) => GroupRank::BoxedPrimitive,
		OwnedFieldShape::FinalReference { .. } => GroupRank::FinalReference,
		OwnedFieldShape::Object => GroupRank::Object,
		OwnedFieldShape::Collection { .. } => GroupRank::Collection,
		OwnedFieldShape::Map { .. } => GroupRank::Map,
	}
}

/// Descending width so 64-bit slots sort before 32-bit ones, per §4.6 rule 1/2.
fn width_rank(shape: PrimitiveShape) -> std::cmp::Reverse<u8> {
	std::cmp::Reverse(shape.width())
}

fn final_reference_name(shape: &OwnedFieldShape) -> &'static str {
	match shape {
		OwnedFieldShape::FinalReference { type_name } => type_name,
		_ => "",
	}
}

/// Sorts `fields` into the fixed six-group wire order. The comparator is a
/// total order: every tiebreak bottoms out at `(declaring_class, name)`,
/// which is unique for any one class's flattened field list barring a
/// declaring-class name collision across the inheritance chain (design note
/// 9 flags this as a portability caveat, not something this sort can fix).
pub fn group_and_sort(mut fields: Vec<GroupableField>) -> Vec<GroupableField> {
	fields.sort_by(|a, b| {
		group_rank(&a.shape)
			.cmp(&group_rank(&b.shape))
			.then_with(|| match (&a.shape, &b.shape) {
				(OwnedFieldShape::Primitive(pa), OwnedFieldShape::Primitive(pb))
				| (OwnedFieldShape::BoxedPrimitive(pa), OwnedFieldShape::BoxedPrimitive(pb)) => width_rank(*pa).cmp(&width_rank(*pb)),
				_ => std::cmp::Ordering::Equal,
			})
			.then_with(|| final_reference_name(&a.shape).cmp(final_reference_name(&b.shape)))
			.then_with(|| a.name.cmp(b.name))
			.then_with(|| a.declaring_class.cmp(b.declaring_class))
	});
	fields
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::descriptor::OwnedFieldShape as Shape;

	fn field(name: &'static str, shape: Shape) -> GroupableField {
		GroupableField { declaring_class: "Test", name, shape }
	}

	#[test]
	fn groups_come_out_in_the_fixed_six_group_order() {
		let fields = vec![
			field("m", Shape::Map { key: Box::new(Shape::Primitive(PrimitiveShape::I32)), value: Box::new(Shape::Primitive(PrimitiveShape::I32)), monomorphic: true }),
			field("c", Shape::Collection { element: Box::new(Shape::Primitive(PrimitiveShape::I32)), monomorphic: true }),
			field("o", Shape::Object),
			field("f", Shape::FinalReference { type_name: "Name" }),
			field("b", Shape::BoxedPrimitive(PrimitiveShape::I32)),
			field("a", Shape::Primitive(PrimitiveShape::I64)),
		];
		let sorted = group_and_sort(fields);
		let names: Vec<_> = sorted.iter().map(|f| f.name).collect();
		assert_eq!(names, vec!["a", "b", "f", "o", "c", "m"]);
	}

	#[test]
	fn primitives_sort_by_descending_width_then_name() {
		let fields = vec![
			field("small", Shape::Primitive(PrimitiveShape::I8)),
			field("big", Shape::Primitive(PrimitiveShape::I64)),
			field("mid_b", Shape::Primitive(PrimitiveShape::I32)),
			field("mid_a", Shape::Primitive(PrimitiveShape::I32)),
		];
		let sorted = group_and_sort(fields);
		let names: Vec<_> = sorted.iter().map(|f| f.name).collect();
		assert_eq!(names, vec!["big", "mid_a", "mid_b", "small"]);
	}

	#[test]
	fn sort_is_deterministic_across_repeated_runs() {
		let fields = vec![
			field("z", Shape::Object),
			field("a", Shape::Object),
			field("m", Shape::Primitive(PrimitiveShape::Bool)),
		];
		let first = group_and_sort(fields.clone());
		let second = group_and_sort(fields);
		let first_names: Vec<_> = first.iter().map(|f| f.name).collect();
		let second_names: Vec<_> = second.iter().map(|f| f.name).collect();
		assert_eq!(first_names, second_names);
	}
}
