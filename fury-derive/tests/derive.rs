use std::collections::HashMap;
use std::rc::Rc;

use fury_core::{FieldValue, FuryClass, PrimitiveValue};
use fury_derive::FuryClass;

#[derive(Debug, FuryClass)]
struct Address {
	city: String,
	zip: Option<i32>,
}

#[derive(Debug, FuryClass)]
struct Person {
	name: String,
	age: i32,
	nickname: Option<String>,
	tags: Vec<String>,
	scores: HashMap<String, i32>,
	address: Option<Rc<Address>>,
}

#[test]
fn declared_fields_match_struct_field_count() {
	assert_eq!(Person::declared_fields().len(), 6);
	assert_eq!(Address::declared_fields().len(), 2);
}

#[test]
fn field_values_and_construct_round_trip() {
	let mut scores = HashMap::new();
	scores.insert("math".to_string(), 95);

	let person = Person {
		name: "Ada".to_string(),
		age: 36,
		nickname: None,
		tags: vec!["engineer".to_string(), "writer".to_string()],
		scores,
		address: Some(Rc::new(Address { city: "London".to_string(), zip: Some(10001) })),
	};

	let values = person.field_values();
	assert!(matches!(&values[0], FieldValue::String(Some(s)) if s.as_ref() == "Ada"));
	assert!(matches!(&values[1], FieldValue::Primitive(PrimitiveValue::I32(36))));
	assert!(matches!(&values[2], FieldValue::String(None)));

	let rebuilt = Person::construct(values).unwrap();
	assert_eq!(rebuilt.name, "Ada");
	assert_eq!(rebuilt.age, 36);
	assert_eq!(rebuilt.nickname, None);
	assert_eq!(rebuilt.tags, vec!["engineer".to_string(), "writer".to_string()]);
	assert_eq!(rebuilt.scores.get("math"), Some(&95));
	assert_eq!(rebuilt.address.unwrap().city, "London");
}

#[test]
fn missing_field_value_is_a_construction_failure() {
	let err = Person::construct(vec![]).unwrap_err();
	assert!(matches!(err, fury_core::Error::ConstructionFailure { .. }));
}
