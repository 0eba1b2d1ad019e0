//! `Session`: one top-level `serialize`/`deserialize` call and its transient
//! tables, mirroring how the teacher's `Context` owns one resolver for its
//! whole lifetime rather than threading loose state through every call.

use std::rc::Rc;

use crate::class::resolver::ClassResolver;
use crate::config::Config;
use crate::descriptor::{FuryObject, OwnedFieldShape};
use crate::framer::FrameHead;
use crate::meta_context::MetaContext;
use crate::reference::{ReadRefResolver, WriteRefResolver};

/// A bounded stack of "current expected generic type" entries (§3), pushed
/// by a collection/map/object serializer before descending into a slot and
/// popped on the way back up, so the reader knows what to decode before it
/// has a value to inspect. Carries [`OwnedFieldShape`] rather than the wire's
/// `WireFieldType` because this stack drives the schema-consistent path,
/// where the Primitive/BoxedPrimitive nullability distinction has to survive
/// intact — the COMPATIBLE-mode path reconstructs its own shape from the
/// received `ClassDefinition` instead of consulting this stack.
#[derive(Debug, Default)]
pub struct GenericsStack {
	stack: Vec<OwnedFieldShape>,
}

impl GenericsStack {
	pub fn push(&mut self, shape: OwnedFieldShape) {
		self.stack.push(shape);
	}

	pub fn pop(&mut self) {
		self.stack.pop();
	}

	pub fn current(&self) -> &OwnedFieldShape {
		self.stack.last().expect("generics stack must not be empty while decoding a value")
	}
}

/// Every kind of value the read-side reference table may hold. A single
/// table spans the whole object graph (strings and objects share one id
/// space, per §3), so it has to be one enum rather than one table per type.
#[derive(Debug, Clone)]
pub enum TrackedValue {
	Object(Rc<dyn FuryObject>),
	Str(Rc<str>),
}

impl TrackedValue {
	pub fn as_object(&self) -> Option<Rc<dyn FuryObject>> {
		match self {
			TrackedValue::Object(o) => Some(o.clone()),
			TrackedValue::Str(_) => None,
		}
	}

	pub fn as_str(&self) -> Option<Rc<str>> {
		match self {
			TrackedValue::Str(s) => Some(s.clone()),
			TrackedValue::Object(_) => None,
		}
	}
}

pub struct Session<'a> {
	config: &'a Config,
	resolver: &'a mut ClassResolver,
	write_refs: WriteRefResolver,
	read_refs: ReadRefResolver<TrackedValue>,
	generics: GenericsStack,
	meta_context: MetaContext,
	cross_language: bool,
}

impl<'a> Session<'a> {
	pub fn new(config: &'a Config, resolver: &'a mut ClassResolver) -> Self {
		resolver.reset_session();
		Self {
			config,
			resolver,
			write_refs: WriteRefResolver::new(),
			read_refs: ReadRefResolver::new(),
			generics: GenericsStack::default(),
			meta_context: MetaContext::new(),
			cross_language: false,
		}
	}

	pub fn with_cross_language(mut self, enabled: bool) -> Self {
		self.cross_language = enabled;
		self
	}

	pub fn config(&self) -> &Config {
		self.config
	}

	pub fn resolver(&self) -> &ClassResolver {
		self.resolver
	}

	pub fn resolver_mut(&mut self) -> &mut ClassResolver {
		self.resolver
	}

	pub fn write_refs(&mut self) -> &mut WriteRefResolver {
		&mut self.write_refs
	}

	pub fn read_refs(&mut self) -> &mut ReadRefResolver<TrackedValue> {
		&mut self.read_refs
	}

	pub fn generics(&mut self) -> &mut GenericsStack {
		&mut self.generics
	}

	pub fn meta_context(&mut self) -> &mut MetaContext {
		&mut self.meta_context
	}

	pub fn is_cross_language(&self) -> bool {
		self.cross_language
	}

	pub fn frame_head(&self, is_null: bool) -> FrameHead {
		FrameHead::new(is_null, self.cross_language)
	}
}
