//! Cross-module wire scenarios: one test per named scenario, exercised
//! through the public `Fury` facade (or the lowest public layer a scenario
//! actually lives at) rather than internal module tests.

use std::collections::HashMap;
use std::rc::Rc;

use fury_core::buffer::Buffer;
use fury_core::class::resolver::ClassResolver;
use fury_core::framer::FrameHead;
use fury_core::session::Session;
use fury_core::{collection, map, CompatibilityMode, Config, Error, FieldDescriptor, FieldShape, FieldValue, Fury, FuryClass, OwnedFieldShape, PrimitiveShape, PrimitiveValue, Result};
use fury_derive::FuryClass;

/// S1 — a null root is exactly one byte on the wire, carrying the null bit
/// alone; there is no class reference or body to follow.
#[test]
fn s1_null_root_is_a_single_byte() {
	let mut buf = Buffer::new();
	FrameHead::new(true, false).write(&mut buf);
	assert_eq!(buf.writer_index(), 1);

	buf.set_reader_index(0);
	let head = FrameHead::read(&mut buf, false).unwrap();
	assert!(head.is_null);
}

/// S2 — a large-magnitude i32 with number compression enabled round-trips
/// and costs fewer bytes than the 4-byte fixed-width encoding would.
#[derive(Debug, PartialEq)]
struct TinyIntHolder {
	value: i32,
}

impl FuryClass for TinyIntHolder {
	fn type_name() -> &'static str {
		"scenarios.TinyIntHolder"
	}

	fn declared_fields() -> &'static [FieldDescriptor] {
		const FIELDS: &[FieldDescriptor] =
			&[FieldDescriptor { declaring_class: "scenarios.TinyIntHolder", name: "value", shape: FieldShape::Primitive(PrimitiveShape::I32) }];
		FIELDS
	}

	fn field_values(&self) -> Vec<FieldValue> {
		vec![FieldValue::Primitive(PrimitiveValue::I32(self.value))]
	}

	fn construct(values: Vec<FieldValue>) -> Result<Self> {
		let Some(FieldValue::Primitive(PrimitiveValue::I32(value))) = values.into_iter().next() else {
			return Err(Error::ConstructionFailure { type_name: Self::type_name() });
		};
		Ok(TinyIntHolder { value })
	}
}

#[test]
fn s2_compressed_large_int_round_trips_and_saves_bytes() {
	let mut fury = Fury::new();
	let bytes = fury.serialize(&TinyIntHolder { value: 0x1234_5678 }).unwrap();
	let decoded: TinyIntHolder = fury.deserialize(&bytes).unwrap();
	assert_eq!(decoded.value, 0x1234_5678);

	let mut uncompressed_fury = Fury::with_config(Config::builder().compress_number(false).build());
	let uncompressed_bytes = uncompressed_fury.serialize(&TinyIntHolder { value: 0x1234_5678 }).unwrap();
	assert!(bytes.len() < uncompressed_bytes.len(), "varint encoding ({}) should beat fixed-width ({})", bytes.len(), uncompressed_bytes.len());
}

/// S3 — two list elements sharing one `Rc<str>` allocation: the first write
/// is a full string body, the second a short back-reference, and reading
/// both back hands out the very same allocation.
#[test]
fn s3_shared_string_list_element_is_a_back_reference() {
	let config = Config::default();
	let mut resolver = ClassResolver::new();
	let mut session = Session::new(&config, &mut resolver);
	let shape = OwnedFieldShape::FinalReference { type_name: "String" };

	let shared: Rc<str> = Rc::from("hello");
	let elements = vec![FieldValue::String(Some(shared.clone())), FieldValue::String(Some(shared.clone()))];

	let mut buf = Buffer::new();
	collection::write_collection(Some(&elements), &shape, true, &mut buf, &mut session).unwrap();

	buf.set_reader_index(0);
	let decoded = collection::read_collection(&shape, true, &mut buf, &mut session).unwrap().unwrap();
	assert_eq!(decoded.len(), 2);
	let (FieldValue::String(Some(first)), FieldValue::String(Some(second))) = (&decoded[0], &decoded[1]) else {
		panic!("expected two strings, got {decoded:?}");
	};
	assert_eq!(first.as_ref(), "hello");
	assert!(Rc::ptr_eq(first, second), "both list elements must decode to the same allocation");
}

/// S4 — two fields of the same object sharing one subobject: both decode to
/// the identical `Rc` allocation rather than two independently-read copies.
///
/// A true self-loop (`n.next = n`, read back while `n` is still mid-decode)
/// is out of scope: `FuryClass::construct` hands back a finished `Self` by
/// value, so a back-reference id can only ever resolve to an object whose
/// read has already returned, never to one still in progress. This test
/// covers the DAG-sharing half of the scenario that the current read
/// protocol does support.
#[derive(Debug, FuryClass)]
struct Leaf {
	label: String,
}

#[derive(Debug, FuryClass)]
struct Pair {
	left: Option<Rc<Leaf>>,
	right: Option<Rc<Leaf>>,
}

#[test]
fn s4_shared_subobject_round_trips_to_one_allocation() {
	let mut fury = Fury::new();
	let shared = Rc::new(Leaf { label: "shared".to_string() });
	let pair = Pair { left: Some(shared.clone()), right: Some(shared.clone()) };

	let bytes = fury.serialize(&pair).unwrap();
	let decoded: Pair = fury.deserialize(&bytes).unwrap();

	let (Some(left), Some(right)) = (&decoded.left, &decoded.right) else {
		panic!("both fields should be populated");
	};
	assert_eq!(left.label, "shared");
	assert!(Rc::ptr_eq(left, right), "both fields must decode to the same allocation");
}

/// S5 — a map's entry count and pair bodies are written in iteration order,
/// and round-trip as an unordered collection of entries.
#[derive(Debug, FuryClass)]
struct Scoreboard {
	scores: HashMap<String, i32>,
}

#[test]
fn s5_mixed_map_round_trips_as_an_unordered_map() {
	let mut fury = Fury::new();
	let mut scores = HashMap::new();
	scores.insert("a".to_string(), 1);
	scores.insert("b".to_string(), 2);

	let bytes = fury.serialize(&Scoreboard { scores: scores.clone() }).unwrap();
	let decoded: Scoreboard = fury.deserialize(&bytes).unwrap();

	assert_eq!(decoded.scores.len(), 2);
	assert_eq!(decoded.scores, scores);
}

#[test]
fn s5_mixed_map_entry_count_is_deterministic_on_the_wire() {
	let config = Config::default();
	let mut resolver = ClassResolver::new();
	let mut session = Session::new(&config, &mut resolver);
	let key_shape = OwnedFieldShape::FinalReference { type_name: "String" };
	let value_shape = OwnedFieldShape::Primitive(PrimitiveShape::I32);

	let entries =
		vec![(FieldValue::String(Some(Rc::from("a"))), FieldValue::Primitive(PrimitiveValue::I32(1))), (FieldValue::String(Some(Rc::from("b"))), FieldValue::Primitive(PrimitiveValue::I32(2)))];

	let mut buf = Buffer::new();
	map::write_map(Some(&entries), &key_shape, &value_shape, true, &mut buf, &mut session).unwrap();
	buf.set_reader_index(0);
	let decoded = map::read_map(&key_shape, &value_shape, true, &mut buf, &mut session).unwrap().unwrap();
	assert_eq!(decoded.len(), 2);
}

/// S6 — schema drift in COMPATIBLE mode: a receiver missing field `a` and
/// adding field `c` still gets `b` across unscathed, `a` dropped silently,
/// and `c` defaulted to zero. Hand-written (not derived) because the two
/// peers model two schema *versions of the same logical class*, sharing one
/// `type_name`/`declaring_class` string despite being two distinct Rust
/// structs — a case the derive macro's "declaring class = struct name"
/// convention doesn't represent.
#[derive(Debug)]
struct SenderShape {
	a: i32,
	b: String,
}

impl FuryClass for SenderShape {
	fn type_name() -> &'static str {
		"scenarios.Evolvable"
	}

	fn declared_fields() -> &'static [FieldDescriptor] {
		const FIELDS: &[FieldDescriptor] = &[
			FieldDescriptor { declaring_class: "scenarios.Evolvable", name: "a", shape: FieldShape::Primitive(PrimitiveShape::I32) },
			FieldDescriptor { declaring_class: "scenarios.Evolvable", name: "b", shape: FieldShape::STRING },
		];
		FIELDS
	}

	fn field_values(&self) -> Vec<FieldValue> {
		vec![FieldValue::Primitive(PrimitiveValue::I32(self.a)), FieldValue::String(Some(Rc::from(self.b.as_str())))]
	}

	fn construct(values: Vec<FieldValue>) -> Result<Self> {
		let mut values = values.into_iter();
		let (Some(FieldValue::Primitive(PrimitiveValue::I32(a))), Some(FieldValue::String(Some(b)))) = (values.next(), values.next()) else {
			return Err(Error::ConstructionFailure { type_name: Self::type_name() });
		};
		Ok(SenderShape { a, b: b.as_ref().to_owned() })
	}
}

#[derive(Debug)]
struct ReceiverShape {
	b: String,
	c: i64,
}

impl FuryClass for ReceiverShape {
	fn type_name() -> &'static str {
		"scenarios.Evolvable"
	}

	fn declared_fields() -> &'static [FieldDescriptor] {
		const FIELDS: &[FieldDescriptor] = &[
			FieldDescriptor { declaring_class: "scenarios.Evolvable", name: "b", shape: FieldShape::STRING },
			FieldDescriptor { declaring_class: "scenarios.Evolvable", name: "c", shape: FieldShape::Primitive(PrimitiveShape::I64) },
		];
		FIELDS
	}

	fn field_values(&self) -> Vec<FieldValue> {
		vec![FieldValue::String(Some(Rc::from(self.b.as_str()))), FieldValue::Primitive(PrimitiveValue::I64(self.c))]
	}

	fn construct(values: Vec<FieldValue>) -> Result<Self> {
		let mut values = values.into_iter();
		let (Some(FieldValue::String(Some(b))), Some(FieldValue::Primitive(PrimitiveValue::I64(c)))) = (values.next(), values.next()) else {
			return Err(Error::ConstructionFailure { type_name: Self::type_name() });
		};
		Ok(ReceiverShape { b: b.as_ref().to_owned(), c })
	}
}

#[test]
fn s6_schema_drift_keeps_shared_field_drops_removed_defaults_added() {
	let compatible = Config::builder().compatible_mode(CompatibilityMode::Compatible).build();

	let mut sender = Fury::with_config(Config::builder().compatible_mode(CompatibilityMode::Compatible).build());
	sender.register::<SenderShape>(Some(1));
	let bytes = sender.serialize(&SenderShape { a: 42, b: "kept".to_string() }).unwrap();

	let mut receiver = Fury::with_config(compatible);
	receiver.register::<ReceiverShape>(Some(1));
	let decoded: ReceiverShape = receiver.deserialize(&bytes).unwrap();

	assert_eq!(decoded.b, "kept");
	assert_eq!(decoded.c, 0);
}

/// S7 — a class the receiver has no Rust type for decodes to a placeholder
/// instead of failing, but only under `deserialize_unknown_class_enabled` in
/// COMPATIBLE mode; secure mode overrides that opt-in, and SCHEMA_CONSISTENT
/// mode has no self-describing body to skip, so both still error.
#[derive(Debug, FuryClass)]
struct Secret {
	value: i32,
}

#[test]
fn s7_unknown_class_becomes_a_placeholder_when_enabled() {
	let mut sender = Fury::with_config(Config::builder().compatible_mode(CompatibilityMode::Compatible).build());
	let bytes = sender.serialize(&Secret { value: 42 }).unwrap();

	let receiver_config = Config::builder().compatible_mode(CompatibilityMode::Compatible).deserialize_unknown_class_enabled(true).build();
	let mut receiver = Fury::with_config(receiver_config);
	let decoded = receiver.deserialize_dyn(&bytes).unwrap();
	let placeholder =
		decoded.as_any().downcast_ref::<fury_core::object::PlaceholderObject>().expect("unknown class should decode to a placeholder");
	assert_eq!(placeholder.type_name.as_ref(), "Secret");
	assert_eq!(placeholder.fields.len(), 1);
}

#[test]
fn s7_secure_mode_overrides_deserialize_unknown_class_enabled() {
	let mut sender = Fury::with_config(Config::builder().compatible_mode(CompatibilityMode::Compatible).build());
	let bytes = sender.serialize(&Secret { value: 42 }).unwrap();

	let receiver_config =
		Config::builder().compatible_mode(CompatibilityMode::Compatible).deserialize_unknown_class_enabled(true).secure_mode_enabled(true).build();
	let mut receiver = Fury::with_config(receiver_config);
	let err = receiver.deserialize_dyn(&bytes).unwrap_err();
	assert!(matches!(err, Error::UnknownClassName { .. }));
}

#[test]
fn s7_unknown_class_still_fails_in_schema_consistent_mode() {
	let mut sender = Fury::new();
	let bytes = sender.serialize(&Secret { value: 42 }).unwrap();

	let receiver_config = Config::builder().deserialize_unknown_class_enabled(true).build();
	let mut receiver = Fury::with_config(receiver_config);
	let err = receiver.deserialize_dyn(&bytes).unwrap_err();
	assert!(matches!(err, Error::UnknownClassName { .. }));
}
