use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, GenericArgument, PathArguments, Type, TypePath};

pub fn derive(tokens: proc_macro::TokenStream) -> TokenStream {
	let DeriveInput { ident, data, .. } = syn::parse(tokens).unwrap();

	let data = match data {
		Data::Struct(data) => data,
		Data::Enum(_) => panic!("FuryClass cannot be derived for enums"),
		Data::Union(_) => panic!("FuryClass cannot be derived for unions"),
	};

	let fields = match data.fields {
		Fields::Named(named) => named.named.into_iter().collect::<Vec<_>>(),
		Fields::Unnamed(_) => panic!("FuryClass requires named fields"),
		Fields::Unit => Vec::new(),
	};

	let type_name = ident.to_string();
	let declared_class = &type_name;

	let descriptors = fields.iter().map(|field| {
		let name = field.ident.as_ref().expect("named field").to_string();
		let shape = field_shape(&field.ty);
		quote! {
			::fury_core::FieldDescriptor {
				declaring_class: #declared_class,
				name: #name,
				shape: #shape,
			}
		}
	});

	let field_idents: Vec<_> = fields.iter().map(|f| f.ident.clone().expect("named field")).collect();

	let to_values = fields.iter().map(|field| {
		let name = field.ident.as_ref().expect("named field");
		let accessor = quote! { self.#name };
		to_field_value(&field.ty, &accessor)
	});

	let from_values = fields.iter().map(|field| {
		let name = field.ident.as_ref().expect("named field");
		let ty = &field.ty;
		let slot = quote! { slot };
		let conversion = from_field_value(ty, &slot, &type_name);
		quote! {
			let #name: #ty = {
				let slot = values.next().ok_or_else(|| ::fury_core::Error::ConstructionFailure { type_name: Self::type_name() })?;
				#conversion
			};
		}
	});

	quote! {
		impl ::fury_core::FuryClass for #ident {
			fn type_name() -> &'static str {
				#type_name
			}

			fn declared_fields() -> &'static [::fury_core::FieldDescriptor] {
				const FIELDS: &[::fury_core::FieldDescriptor] = &[#(#descriptors),*];
				FIELDS
			}

			fn field_values(&self) -> ::std::vec::Vec<::fury_core::FieldValue> {
				vec![#(#to_values),*]
			}

			fn construct(values: ::std::vec::Vec<::fury_core::FieldValue>) -> ::fury_core::Result<Self> {
				let mut values = values.into_iter();
				#(#from_values)*
				Ok(Self { #(#field_idents),* })
			}
		}
	}
}

fn path_last_ident(ty: &Type) -> Option<&syn::Ident> {
	match ty {
		Type::Path(TypePath { qself: None, path }) => path.segments.last().map(|segment| &segment.ident),
		_ => None,
	}
}

fn single_generic<'a>(ty: &'a Type, expect: &str) -> Option<&'a Type> {
	let Type::Path(TypePath { qself: None, path }) = ty else { return None };
	let segment = path.segments.last()?;
	if segment.ident != expect {
		return None;
	}
	let PathArguments::AngleBracketed(args) = &segment.arguments else { return None };
	args.args.iter().find_map(|arg| match arg {
		GenericArgument::Type(t) => Some(t),
		_ => None,
	})
}

fn option_inner(ty: &Type) -> Option<&Type> {
	single_generic(ty, "Option")
}

fn vec_inner(ty: &Type) -> Option<&Type> {
	single_generic(ty, "Vec")
}

fn rc_inner(ty: &Type) -> Option<&Type> {
	single_generic(ty, "Rc")
}

fn map_inner(ty: &Type) -> Option<(&Type, &Type)> {
	let Type::Path(TypePath { qself: None, path }) = ty else { return None };
	let segment = path.segments.last()?;
	if segment.ident != "HashMap" && segment.ident != "BTreeMap" {
		return None;
	}
	let PathArguments::AngleBracketed(args) = &segment.arguments else { return None };
	let mut types = args.args.iter().filter_map(|arg| match arg {
		GenericArgument::Type(t) => Some(t),
		_ => None,
	});
	Some((types.next()?, types.next()?))
}

fn is_string_type(ty: &Type) -> bool {
	path_last_ident(ty).map(|ident| ident == "String").unwrap_or(false)
}

/// Matches a bare primitive type ident to its `PrimitiveShape`/`PrimitiveValue`
/// variant name; both enums share the same variant names by construction.
fn primitive_ident(ty: &Type) -> Option<&'static str> {
	let ident = path_last_ident(ty)?;
	match ident.to_string().as_str() {
		"bool" => Some("Bool"),
		"i8" => Some("I8"),
		"i16" => Some("I16"),
		"char" => Some("Char"),
		"i32" => Some("I32"),
		"i64" => Some("I64"),
		"f32" => Some("F32"),
		"f64" => Some("F64"),
		_ => None,
	}
}

fn is_monomorphic(ty: &Type) -> bool {
	if let Some(inner) = option_inner(ty) {
		return is_monomorphic(inner);
	}
	if primitive_ident(ty).is_some() || is_string_type(ty) {
		return true;
	}
	if let Some(elem) = vec_inner(ty) {
		return is_monomorphic(elem);
	}
	if let Some((key, value)) = map_inner(ty) {
		return is_monomorphic(key) && is_monomorphic(value);
	}
	// An `Rc<T>` slot is a runtime-resolved reference: a subtype of `T` may
	// always show up in its place, so it's never monomorphic.
	false
}

/// Builds the `FieldShape` expression for a declared field type. Nested
/// element/key/value shapes are promoted to `'static` through an inline
/// `const` binding, the same trick the hand-written descriptors in
/// `fury-core` use to keep the whole shape tree `Copy` without an arena.
fn field_shape(ty: &Type) -> TokenStream {
	if let Some(inner) = option_inner(ty) {
		if let Some(name) = primitive_ident(inner) {
			let variant = format_ident!("{name}");
			return quote! { ::fury_core::FieldShape::BoxedPrimitive(::fury_core::PrimitiveShape::#variant) };
		}
		return field_shape(inner);
	}
	if let Some(name) = primitive_ident(ty) {
		let variant = format_ident!("{name}");
		return quote! { ::fury_core::FieldShape::Primitive(::fury_core::PrimitiveShape::#variant) };
	}
	if is_string_type(ty) {
		return quote! { ::fury_core::FieldShape::STRING };
	}
	if let Some(elem) = vec_inner(ty) {
		let elem_shape = field_shape(elem);
		let monomorphic = is_monomorphic(elem);
		return quote! {{
			const ELEMENT: ::fury_core::FieldShape = #elem_shape;
			::fury_core::FieldShape::Collection { element: &ELEMENT, monomorphic: #monomorphic }
		}};
	}
	if let Some((key, value)) = map_inner(ty) {
		let key_shape = field_shape(key);
		let value_shape = field_shape(value);
		let monomorphic = is_monomorphic(key) && is_monomorphic(value);
		return quote! {{
			const KEY: ::fury_core::FieldShape = #key_shape;
			const VALUE: ::fury_core::FieldShape = #value_shape;
			::fury_core::FieldShape::Map { key: &KEY, value: &VALUE, monomorphic: #monomorphic }
		}};
	}
	if rc_inner(ty).is_some() {
		return quote! { ::fury_core::FieldShape::Object };
	}
	panic!("FuryClass derive does not know how to describe field type `{}`", quote!(#ty));
}

/// Converts a top-level `self.field` access into a `FieldValue` expression.
fn to_field_value(ty: &Type, accessor: &TokenStream) -> TokenStream {
	if let Some(inner) = option_inner(ty) {
		if let Some(name) = primitive_ident(inner) {
			let variant = format_ident!("{name}");
			return quote! { ::fury_core::FieldValue::Boxed((#accessor).map(::fury_core::PrimitiveValue::#variant)) };
		}
		if is_string_type(inner) {
			return quote! { ::fury_core::FieldValue::String((#accessor).as_ref().map(|s| ::std::rc::Rc::from(s.as_str()))) };
		}
		if let Some(elem) = vec_inner(inner) {
			let elem_conv = element_to_field_value(elem, &quote! { v });
			return quote! { ::fury_core::FieldValue::List((#accessor).as_ref().map(|items| items.iter().map(|v| #elem_conv).collect())) };
		}
		if let Some((key, value)) = map_inner(inner) {
			let key_conv = element_to_field_value(key, &quote! { k });
			let value_conv = element_to_field_value(value, &quote! { v });
			return quote! { ::fury_core::FieldValue::Map((#accessor).as_ref().map(|entries| entries.iter().map(|(k, v)| (#key_conv, #value_conv)).collect())) };
		}
		if rc_inner(inner).is_some() {
			return quote! { ::fury_core::FieldValue::Object((#accessor).as_ref().map(|rc| rc.clone() as ::std::rc::Rc<dyn ::fury_core::FuryObject>)) };
		}
		panic!("FuryClass derive does not know how to describe field type `Option<{}>`", quote!(#inner));
	}
	if let Some(name) = primitive_ident(ty) {
		let variant = format_ident!("{name}");
		return quote! { ::fury_core::FieldValue::Primitive(::fury_core::PrimitiveValue::#variant(#accessor)) };
	}
	if is_string_type(ty) {
		return quote! { ::fury_core::FieldValue::String(Some(::std::rc::Rc::from((#accessor).as_str()))) };
	}
	if let Some(elem) = vec_inner(ty) {
		let elem_conv = element_to_field_value(elem, &quote! { v });
		return quote! { ::fury_core::FieldValue::List(Some((#accessor).iter().map(|v| #elem_conv).collect())) };
	}
	if let Some((key, value)) = map_inner(ty) {
		let key_conv = element_to_field_value(key, &quote! { k });
		let value_conv = element_to_field_value(value, &quote! { v });
		return quote! { ::fury_core::FieldValue::Map(Some((#accessor).iter().map(|(k, v)| (#key_conv, #value_conv)).collect())) };
	}
	if rc_inner(ty).is_some() {
		return quote! { ::fury_core::FieldValue::Object(Some((#accessor).clone() as ::std::rc::Rc<dyn ::fury_core::FuryObject>)) };
	}
	panic!("FuryClass derive does not know how to describe field type `{}`", quote!(#ty));
}

/// Converts a collection/map element, bound by reference inside an
/// `.iter().map(...)` closure, into a `FieldValue` expression.
fn element_to_field_value(ty: &Type, accessor: &TokenStream) -> TokenStream {
	if let Some(name) = primitive_ident(ty) {
		let variant = format_ident!("{name}");
		return quote! { ::fury_core::FieldValue::Primitive(::fury_core::PrimitiveValue::#variant(*#accessor)) };
	}
	if is_string_type(ty) {
		return quote! { ::fury_core::FieldValue::String(Some(::std::rc::Rc::from((#accessor).as_str()))) };
	}
	if let Some(elem) = vec_inner(ty) {
		let elem_conv = element_to_field_value(elem, &quote! { v });
		return quote! { ::fury_core::FieldValue::List(Some((#accessor).iter().map(|v| #elem_conv).collect())) };
	}
	if let Some((key, value)) = map_inner(ty) {
		let key_conv = element_to_field_value(key, &quote! { k });
		let value_conv = element_to_field_value(value, &quote! { v });
		return quote! { ::fury_core::FieldValue::Map(Some((#accessor).iter().map(|(k, v)| (#key_conv, #value_conv)).collect())) };
	}
	if rc_inner(ty).is_some() {
		return quote! { ::fury_core::FieldValue::Object(Some((#accessor).clone() as ::std::rc::Rc<dyn ::fury_core::FuryObject>)) };
	}
	panic!("FuryClass derive does not know how to describe element type `{}`", quote!(#ty));
}

/// Builds the `Result<Self>`-arm body that reconstructs a declared field of
/// type `ty` from an owned `FieldValue` bound to `slot`.
fn from_field_value(ty: &Type, slot: &TokenStream, owner_type_name: &str) -> TokenStream {
	let err = quote! { return Err(::fury_core::Error::ConstructionFailure { type_name: #owner_type_name }) };
	let err_expr = quote! { ::std::result::Result::Err(::fury_core::Error::ConstructionFailure { type_name: #owner_type_name }) };
	if let Some(inner) = option_inner(ty) {
		if let Some(name) = primitive_ident(inner) {
			let variant = format_ident!("{name}");
			return quote! {
				match #slot {
					::fury_core::FieldValue::Boxed(slot) => slot
						.map(|value| match value {
							::fury_core::PrimitiveValue::#variant(v) => ::std::result::Result::Ok(v),
							_ => #err_expr,
						})
						.transpose()?,
					_ => { #err }
				}
			};
		}
		if is_string_type(inner) {
			return quote! {
				match #slot {
					::fury_core::FieldValue::String(slot) => slot.map(|s| s.as_ref().to_owned()),
					_ => { #err }
				}
			};
		}
		if let Some(elem) = vec_inner(inner) {
			let elem_from = element_from_field_value(elem, &quote! { item }, &err_expr);
			return quote! {
				match #slot {
					::fury_core::FieldValue::List(slot) => match slot {
						Some(items) => Some(items.into_iter().map(|item| #elem_from).collect::<::fury_core::Result<#inner>>()?),
						None => None,
					},
					_ => { #err }
				}
			};
		}
		if let Some((key, value)) = map_inner(inner) {
			let key_from = element_from_field_value(key, &quote! { k }, &err_expr);
			let value_from = element_from_field_value(value, &quote! { v }, &err_expr);
			return quote! {
				match #slot {
					::fury_core::FieldValue::Map(slot) => match slot {
						Some(entries) => Some(
							entries
								.into_iter()
								.map(|(k, v)| -> ::fury_core::Result<_> { ::std::result::Result::Ok((#key_from?, #value_from?)) })
								.collect::<::fury_core::Result<#inner>>()?,
						),
						None => None,
					},
					_ => { #err }
				}
			};
		}
		if let Some(inner_rc) = rc_inner(inner) {
			return quote! {
				match #slot {
					::fury_core::FieldValue::Object(slot) => match slot {
						Some(rc) => Some(match ::fury_core::FuryObject::as_any_rc(rc).downcast::<#inner_rc>() {
							Ok(v) => v,
							Err(_) => { #err }
						}),
						None => None,
					},
					_ => { #err }
				}
			};
		}
		panic!("FuryClass derive does not know how to describe field type `Option<{}>`", quote!(#inner));
	}
	if let Some(name) = primitive_ident(ty) {
		let variant = format_ident!("{name}");
		return quote! {
			match #slot {
				::fury_core::FieldValue::Primitive(::fury_core::PrimitiveValue::#variant(v)) => v,
				_ => { #err }
			}
		};
	}
	if is_string_type(ty) {
		return quote! {
			match #slot {
				::fury_core::FieldValue::String(Some(s)) => s.as_ref().to_owned(),
				_ => { #err }
			}
		};
	}
	if let Some(elem) = vec_inner(ty) {
		let elem_from = element_from_field_value(elem, &quote! { item }, &err_expr);
		return quote! {
			match #slot {
				::fury_core::FieldValue::List(Some(items)) => items.into_iter().map(|item| #elem_from).collect::<::fury_core::Result<#ty>>()?,
				_ => { #err }
			}
		};
	}
	if let Some((key, value)) = map_inner(ty) {
		let key_from = element_from_field_value(key, &quote! { k }, &err_expr);
		let value_from = element_from_field_value(value, &quote! { v }, &err_expr);
		return quote! {
			match #slot {
				::fury_core::FieldValue::Map(Some(entries)) => entries
					.into_iter()
					.map(|(k, v)| -> ::fury_core::Result<_> { ::std::result::Result::Ok((#key_from?, #value_from?)) })
					.collect::<::fury_core::Result<#ty>>()?,
				_ => { #err }
			}
		};
	}
	if let Some(inner_rc) = rc_inner(ty) {
		return quote! {
			match #slot {
				::fury_core::FieldValue::Object(Some(rc)) => match ::fury_core::FuryObject::as_any_rc(rc).downcast::<#inner_rc>() {
					Ok(v) => v,
					Err(_) => { #err }
				},
				_ => { #err }
			}
		};
	}
	panic!("FuryClass derive does not know how to describe field type `{}`", quote!(#ty));
}

/// Mirrors `from_field_value` for a collection/map element bound by value
/// inside an `.into_iter().map(...)` closure (no outer nullable wrapper: a
/// collection slot's own nullability is handled one level up). Unlike
/// `from_field_value`, this always yields a `Result<T, Error>` expression
/// rather than using `return` to signal failure: a bare `return` inside the
/// `.map()` closure would only exit that closure, not the enclosing
/// `construct` function, so failures are threaded out through `collect`
/// into a `Result` and `?` instead.
fn element_from_field_value(ty: &Type, var: &TokenStream, err_expr: &TokenStream) -> TokenStream {
	if let Some(name) = primitive_ident(ty) {
		let variant = format_ident!("{name}");
		return quote! {
			match #var {
				::fury_core::FieldValue::Primitive(::fury_core::PrimitiveValue::#variant(v)) => ::std::result::Result::Ok(v),
				_ => #err_expr,
			}
		};
	}
	if is_string_type(ty) {
		return quote! {
			match #var {
				::fury_core::FieldValue::String(Some(s)) => ::std::result::Result::Ok(s.as_ref().to_owned()),
				_ => #err_expr,
			}
		};
	}
	if let Some(elem) = vec_inner(ty) {
		let elem_from = element_from_field_value(elem, &quote! { item }, err_expr);
		return quote! {
			match #var {
				::fury_core::FieldValue::List(Some(items)) => items.into_iter().map(|item| #elem_from).collect::<::fury_core::Result<#ty>>(),
				_ => #err_expr,
			}
		};
	}
	if let Some((key, value)) = map_inner(ty) {
		let key_from = element_from_field_value(key, &quote! { k }, err_expr);
		let value_from = element_from_field_value(value, &quote! { v }, err_expr);
		return quote! {
			match #var {
				::fury_core::FieldValue::Map(Some(entries)) => entries
					.into_iter()
					.map(|(k, v)| -> ::fury_core::Result<_> { ::std::result::Result::Ok((#key_from?, #value_from?)) })
					.collect::<::fury_core::Result<#ty>>(),
				_ => #err_expr,
			}
		};
	}
	if let Some(inner_rc) = rc_inner(ty) {
		return quote! {
			match #var {
				::fury_core::FieldValue::Object(Some(rc)) => match ::fury_core::FuryObject::as_any_rc(rc).downcast::<#inner_rc>() {
					Ok(v) => ::std::result::Result::Ok(v),
					Err(_) => #err_expr,
				},
				_ => #err_expr,
			}
		};
	}
	panic!("FuryClass derive does not know how to describe nested element type `{}`", quote!(#ty));
}
