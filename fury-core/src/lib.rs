//! Fury: a cross-language object-graph serialization engine.
//!
//! [`Fury`] is the single long-lived handle an application keeps around: it
//! owns the class resolver's registrations and the immutable [`Config`], the
//! way the teacher's `Assembly`/`Context` pairing owns one resolver for its
//! whole lifetime rather than threading loose state through every call.
//! Each `serialize`/`deserialize` call opens a short-lived [`Session`] over
//! that shared state for its own reference-tracking tables.

pub mod buffer;
pub mod class;
pub mod collection;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod framer;
pub mod map;
pub mod meta_context;
pub mod object;
pub mod pool;
pub mod reference;
pub mod session;
pub mod strings;
mod varint;

use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::rc::Rc;

pub use class::resolver::{ClassRef, ClassResolver};
pub use config::{CompatibilityMode, Config, ConfigBuilder};
pub use descriptor::{downcast, FieldDescriptor, FieldShape, FieldValue, FuryClass, FuryObject, OwnedFieldShape, PrimitiveShape, PrimitiveValue};
pub use error::{Error, Result};

use buffer::Buffer;
use framer::FrameHead;
use session::Session;

/// The engine handle. Registers types once, then serializes/deserializes any
/// number of values against those registrations.
#[derive(Debug, Default)]
pub struct Fury {
	config: Config,
	resolver: ClassResolver,
	cross_language: bool,
}

impl Fury {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(config: Config) -> Self {
		Self { config, resolver: ClassResolver::new(), cross_language: false }
	}

	pub fn with_cross_language(mut self, enabled: bool) -> Self {
		self.cross_language = enabled;
		self
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Registers `T` under an explicit class id (required in secure mode) or,
	/// if `None`, one assigned in registration order. Safe to call more than
	/// once; `serialize`/`deserialize` register on first use if the caller
	/// never does, unless `class_registration_required` forbids that.
	pub fn register<T: FuryClass + Debug + 'static>(&mut self, class_id: Option<u32>) {
		self.resolver.register::<T>(class_id);
	}

	/// Serializes a statically-known root type: frame head, class reference,
	/// then its field group. The root is never ref-tracked or null-wrapped —
	/// there is exactly one of it, and it is required to exist.
	///
	/// With `class_registration_required` set, a `T` that was never explicitly
	/// `register`ed is refused with `InsecureType` rather than silently
	/// auto-registered — the whole point of that flag is that only types the
	/// caller named up front may cross the wire.
	#[cfg_attr(feature = "tracing", tracing::instrument(skip(self, value)))]
	pub fn serialize<T: FuryClass + Debug + 'static>(&mut self, value: &T) -> Result<Vec<u8>> {
		let type_id = TypeId::of::<T>();
		if self.resolver.class_info_by_type(type_id).is_none() {
			if self.config.class_registration_required() {
				return Err(Error::InsecureType { offset: 0, type_name: T::type_name().to_string() });
			}
			self.resolver.register::<T>(None);
		}

		let mut buf = Buffer::new();
		FrameHead::new(false, self.cross_language).write(&mut buf);

		let mut session = Session::new(&self.config, &mut self.resolver).with_cross_language(self.cross_language);
		let registration_required = session.config().class_registration_required();
		session.resolver_mut().write_class_ref(&mut buf, type_id, T::type_name(), registration_required)?;
		let handlers = session.resolver().handlers_by_type(type_id).expect("type was confirmed registered above");
		(handlers.write)(value as &dyn FuryObject, &mut buf, &mut session)?;
		Ok(buf.into_vec())
	}

	/// Deserializes a root value of statically-known type `T`. Fails if the
	/// decoded object graph is cyclic back to the root itself, since a cycle
	/// has no acyclic `T` to hand back by value — use `deserialize_dyn` for
	/// graphs that may share or cycle through their root.
	#[cfg_attr(feature = "tracing", tracing::instrument(skip(self, bytes)))]
	pub fn deserialize<T: FuryClass + Debug + 'static>(&mut self, bytes: &[u8]) -> Result<T> {
		self.resolver.ensure_registered::<T>();
		let object = self.deserialize_dyn(bytes)?;
		let any: Rc<dyn Any> = object.as_any_rc();
		any.downcast::<T>().map(|rc| Rc::try_unwrap(rc).unwrap_or_else(|_| panic!("root value of `{}` is shared; use deserialize_dyn", T::type_name())))
			.map_err(|_| Error::ConstructionFailure { type_name: T::type_name() })
	}

	/// Serializes a root value whose concrete type is only known dynamically
	/// (polymorphic roots, or values produced by `deserialize_dyn`).
	pub fn serialize_dyn(&mut self, value: &dyn FuryObject) -> Result<Vec<u8>> {
		let mut buf = Buffer::new();
		FrameHead::new(false, self.cross_language).write(&mut buf);
		let type_id = value.as_any().type_id();
		let mut session = Session::new(&self.config, &mut self.resolver).with_cross_language(self.cross_language);
		let registration_required = session.config().class_registration_required();
		session.resolver_mut().write_class_ref(&mut buf, type_id, value.fury_type_name(), registration_required)?;
		let handlers = session
			.resolver()
			.handlers_by_type(type_id)
			.ok_or_else(|| Error::UnregisteredRuntimeType { offset: buf.writer_index(), type_name: value.fury_type_name().to_string() })?;
		(handlers.write)(value, &mut buf, &mut session)?;
		Ok(buf.into_vec())
	}

	pub fn deserialize_dyn(&mut self, bytes: &[u8]) -> Result<Rc<dyn FuryObject>> {
		let mut buf = Buffer::from_bytes(bytes.to_vec());
		let head = FrameHead::read(&mut buf, self.cross_language)?;
		let mut session = Session::new(&self.config, &mut self.resolver).with_cross_language(head.is_cross_language);
		let offset = buf.reader_index();
		let type_id = match session.resolver_mut().read_class_ref(&mut buf)? {
			ClassRef::Registered(type_id) => type_id,
			ClassRef::Unknown(name) => {
				if session.config().secure_mode_enabled() || !session.config().deserialize_unknown_class_enabled() {
					return Err(Error::UnknownClassName { offset, name: name.to_string() });
				}
				return object::read_unknown_object(name, &mut buf, &mut session);
			}
		};
		let handlers = session.resolver().handlers_by_type(type_id).ok_or(Error::ClassNotRegistered { offset, class_id: 0 })?;
		(handlers.read)(&mut buf, &mut session)
	}
}
