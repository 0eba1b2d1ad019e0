//! Immutable configuration shared by reference through a [`Session`](crate::session::Session),
//! mirroring how the teacher's `Context` owns one resolver/allocator for its
//! whole lifetime instead of threading loose flags through every call.

use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CompatibilityMode {
	/// Peers share one fixed schema; a version hash may be checked.
	SchemaConsistent,
	/// Peers may disagree on fields; a `ClassDefinition` is exchanged.
	Compatible,
}

#[derive(Debug)]
pub struct Config {
	reference_tracking: bool,
	basic_types_ref_ignored: bool,
	string_ref_ignored: bool,
	time_ref_ignored: bool,
	compress_number: bool,
	compress_string: bool,
	class_registration_required: bool,
	secure_mode_enabled: bool,
	check_class_version: bool,
	share_meta_context: bool,
	compatible_mode: CompatibilityMode,
	deserialize_unknown_class_enabled: bool,
	cache_key: OnceLock<u64>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			reference_tracking: true,
			basic_types_ref_ignored: false,
			string_ref_ignored: false,
			time_ref_ignored: false,
			compress_number: true,
			compress_string: true,
			class_registration_required: false,
			secure_mode_enabled: false,
			check_class_version: false,
			share_meta_context: false,
			compatible_mode: CompatibilityMode::SchemaConsistent,
			deserialize_unknown_class_enabled: false,
			cache_key: OnceLock::new(),
		}
	}
}

macro_rules! flag_accessor {
	($field:ident) => {
		pub fn $field(&self) -> bool {
			self.$field
		}
	};
}

impl Config {
	pub fn builder() -> ConfigBuilder {
		ConfigBuilder { config: Config::default() }
	}

	flag_accessor!(reference_tracking);
	flag_accessor!(basic_types_ref_ignored);
	flag_accessor!(string_ref_ignored);
	flag_accessor!(time_ref_ignored);
	flag_accessor!(compress_number);
	flag_accessor!(compress_string);
	flag_accessor!(class_registration_required);
	flag_accessor!(secure_mode_enabled);
	flag_accessor!(check_class_version);
	flag_accessor!(share_meta_context);
	flag_accessor!(deserialize_unknown_class_enabled);

	pub fn compatible_mode(&self) -> CompatibilityMode {
		self.compatible_mode
	}

	/// Whether the class-version hash (§4.5/design note 9) should actually be
	/// emitted: suppressed whenever the receiver may legitimately diverge.
	pub fn should_check_class_version(&self) -> bool {
		self.check_class_version && matches!(self.compatible_mode, CompatibilityMode::SchemaConsistent)
	}

	/// A stable, lazily-computed hash of the flag set, used as a cache-key
	/// discriminant so class-info caches never mix entries built under
	/// different configs.
	pub fn cache_key(&self) -> u64 {
		*self.cache_key.get_or_init(|| {
			let mut hasher = fxhash::FxHasher::default();
			self.reference_tracking.hash(&mut hasher);
			self.basic_types_ref_ignored.hash(&mut hasher);
			self.string_ref_ignored.hash(&mut hasher);
			self.time_ref_ignored.hash(&mut hasher);
			self.compress_number.hash(&mut hasher);
			self.compress_string.hash(&mut hasher);
			self.class_registration_required.hash(&mut hasher);
			self.secure_mode_enabled.hash(&mut hasher);
			self.check_class_version.hash(&mut hasher);
			self.share_meta_context.hash(&mut hasher);
			matches!(self.compatible_mode, CompatibilityMode::Compatible).hash(&mut hasher);
			hasher.finish()
		})
	}
}

#[derive(Debug)]
pub struct ConfigBuilder {
	config: Config,
}

macro_rules! flag_setter {
	($field:ident) => {
		pub fn $field(mut self, value: bool) -> Self {
			self.config.$field = value;
			self
		}
	};
}

impl ConfigBuilder {
	flag_setter!(reference_tracking);
	flag_setter!(basic_types_ref_ignored);
	flag_setter!(string_ref_ignored);
	flag_setter!(time_ref_ignored);
	flag_setter!(compress_number);
	flag_setter!(compress_string);
	flag_setter!(class_registration_required);
	flag_setter!(secure_mode_enabled);
	flag_setter!(check_class_version);
	flag_setter!(share_meta_context);
	flag_setter!(deserialize_unknown_class_enabled);

	pub fn compatible_mode(mut self, mode: CompatibilityMode) -> Self {
		self.config.compatible_mode = mode;
		self
	}

	pub fn build(self) -> Config {
		self.config
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_the_documented_surface() {
		let config = Config::default();
		assert!(config.reference_tracking());
		assert!(!config.class_registration_required());
		assert_eq!(config.compatible_mode(), CompatibilityMode::SchemaConsistent);
	}

	#[test]
	fn class_version_check_is_suppressed_in_compatible_mode() {
		let config = Config::builder().check_class_version(true).compatible_mode(CompatibilityMode::Compatible).build();
		assert!(!config.should_check_class_version());

		let consistent = Config::builder().check_class_version(true).compatible_mode(CompatibilityMode::SchemaConsistent).build();
		assert!(consistent.should_check_class_version());
	}

	#[test]
	fn cache_key_is_stable_and_sensitive_to_flags() {
		let a = Config::builder().compress_number(true).build();
		let b = Config::builder().compress_number(false).build();
		assert_eq!(a.cache_key(), a.cache_key());
		assert_ne!(a.cache_key(), b.cache_key());
	}
}
