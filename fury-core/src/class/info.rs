//! `ClassInfo` (§3): the cached, per-type record the resolver builds once and
//! reuses for every subsequent encounter of that type within (or across, for
//! statically registered types) sessions.

use std::sync::Arc;

use crate::class::grouping::GroupableField;

#[derive(Debug, Clone)]
pub struct ClassInfo {
	pub class_id: Option<u32>,
	pub type_name: Arc<str>,
	pub needs_ref_tracking: bool,
	pub is_monomorphic: bool,
	pub fields: Arc<[GroupableField]>,
}

impl ClassInfo {
	pub fn new(class_id: Option<u32>, type_name: impl Into<Arc<str>>, is_monomorphic: bool, fields: Vec<GroupableField>, needs_ref_tracking: bool) -> Self {
		Self { class_id, type_name: type_name.into(), needs_ref_tracking, is_monomorphic, fields: fields.into() }
	}
}
