mod fury_class;

use proc_macro::TokenStream;

/// Implements the Type Descriptor API (`FuryClass`) for a struct with named
/// fields: `type_name`, `declared_fields`, `field_values`, and `construct`.
///
/// Supported field types: the eight primitives and `Option<primitive>`
/// (boxed), `String` and `Option<String>`, `Vec<T>`/`HashMap<K, V>`/
/// `BTreeMap<K, V>` of any supported `T`/`K`/`V` (optionally wrapped in
/// `Option` for a nullable collection), and `Rc<T>`/`Option<Rc<T>>` for a
/// nested value reached through shared ownership, where `T` itself
/// implements `FuryClass` (and therefore `FuryObject` via the blanket impl).
#[proc_macro_derive(FuryClass)]
pub fn derive_fury_class(input: TokenStream) -> TokenStream {
	fury_class::derive(input).into()
}
