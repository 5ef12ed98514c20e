//! Derive macro for the `tagless` descriptor traits.
//!
//! `#[derive(Describe)]` states the public shape of a type so the `tagless`
//! compiler can build its wire plan.
//!
//! # Supported Types
//!
//! - Structs with named fields implement `FieldType` and `Schema`. Only
//!   `pub` fields are described; the struct must implement `Default`.
//! - Fieldless enums implement `FieldType` and `WireEnum` and are written as
//!   their discriminant. The enum must be `Copy`.
//!
//! Tuple structs, unit structs, enums with data and unions are rejected.
//!
//! # Examples
//!
//! ## Struct with Named Fields
//!
//! ```ignore
//! use tagless::Describe;
//!
//! #[derive(Default, Describe)]
//! pub struct Person {
//!     pub name: String,
//!     pub age: u32,
//!     cached_hash: u64, // not part of the layout
//! }
//! ```
//!
//! ## Enum
//!
//! ```ignore
//! use tagless::Describe;
//!
//! #[derive(Clone, Copy, Describe)]
//! #[repr(u8)]
//! pub enum Status {
//!     Active = 1,
//!     Suspended = 2,
//! }
//! ```
//!
//! The discriminant width follows the enum's `#[repr]`; without one it is
//! written as an `i32`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DataEnum, DataStruct, DeriveInput, Fields, Visibility,
    ext::IdentExt, parse_macro_input,
};

/// Derive macro for `FieldType` plus `Schema` or `WireEnum`.
///
/// See the [crate documentation](crate) for what is accepted.
#[proc_macro_derive(Describe)]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match &input.data {
        Data::Struct(data_struct) => impl_struct(&input, data_struct),
        Data::Enum(data_enum) => impl_enum(&input, data_enum),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input,
            "Describe cannot be derived for unions",
        )),
    };

    match expanded {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn impl_struct(
    input: &DeriveInput,
    data_struct: &DataStruct,
) -> syn::Result<proc_macro2::TokenStream> {
    let Fields::Named(fields) = &data_struct.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "Describe can only be derived for structs with named fields",
        ));
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) =
        input.generics.split_for_impl();

    // Build where clause for FieldType bounds
    let mut where_clause =
        where_clause.cloned().unwrap_or_else(|| syn::parse_quote!(where));

    // Add FieldType bounds for all generic type parameters
    for param in &input.generics.params {
        if let syn::GenericParam::Type(type_param) = param {
            let ident = &type_param.ident;
            where_clause
                .predicates
                .push(syn::parse_quote!(#ident: ::tagless::FieldType));
        }
    }

    let field_descriptors = fields
        .named
        .iter()
        .filter(|field| matches!(field.vis, Visibility::Public(_)))
        .map(|field| {
            let field_name = &field.ident;
            let field_type = &field.ty;
            let name_str = field
                .ident
                .as_ref()
                .map(|ident| ident.unraw().to_string())
                .unwrap_or_default();

            quote! {
                .field(
                    ::tagless::descriptor::FieldDescriptor::new::<#field_type>(#name_str)
                        .getter(|owner| {
                            &::tagless::descriptor::downcast_ref::<Self>(owner).#field_name
                        })
                        .setter(|owner| {
                            &mut ::tagless::descriptor::downcast_mut::<Self>(owner).#field_name
                        })
                )
            }
        });

    Ok(quote! {
        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics ::tagless::FieldType for #name #ty_generics #where_clause {
            fn shape() -> ::tagless::descriptor::Shape {
                ::tagless::descriptor::Shape::Object(
                    ::tagless::descriptor::ObjectShape::of::<Self>(),
                )
            }

            fn default_value() -> Self {
                <Self as ::std::default::Default>::default()
            }
        }

        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics ::tagless::Schema for #name #ty_generics #where_clause {
            fn describe() -> ::tagless::descriptor::Descriptor {
                ::tagless::descriptor::Descriptor::new::<Self>()
                    #(#field_descriptors)*
            }
        }
    })
}

/// Reads the integer kind from `#[repr(..)]`, defaulting to `i32`.
fn enum_repr(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let mut repr = quote! { I32 };

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("repr"))
    {
        attr.parse_nested_meta(|meta| {
            let Some(ident) = meta.path.get_ident() else {
                return Err(meta.error("unrecognized repr"));
            };

            repr = match ident.to_string().as_str() {
                "i8" => quote! { I8 },
                "u8" => quote! { U8 },
                "i16" => quote! { I16 },
                "u16" => quote! { U16 },
                "i32" | "C" => quote! { I32 },
                "u32" => quote! { U32 },
                "i64" => quote! { I64 },
                "u64" => quote! { U64 },
                other => {
                    return Err(meta.error(format!(
                        "repr({other}) has no wire encoding; use a fixed-width \
                         integer of at most 64 bits"
                    )));
                }
            };

            Ok(())
        })?;
    }

    Ok(repr)
}

fn impl_enum(
    input: &DeriveInput,
    data_enum: &DataEnum,
) -> syn::Result<proc_macro2::TokenStream> {
    if let Some(variant) = data_enum
        .variants
        .iter()
        .find(|variant| !matches!(variant.fields, Fields::Unit))
    {
        return Err(syn::Error::new_spanned(
            variant,
            "Describe can only be derived for enums without fields",
        ));
    }

    let Some(first) = data_enum.variants.first() else {
        return Err(syn::Error::new_spanned(
            input,
            "Describe cannot be derived for enums without variants",
        ));
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) =
        input.generics.split_for_impl();
    let repr = enum_repr(input)?;
    let first = &first.ident;

    let variant_checks = data_enum.variants.iter().map(|variant| {
        let variant_name = &variant.ident;
        quote! {
            if discriminant == Self::#variant_name as i128 {
                return ::std::option::Option::Some(Self::#variant_name);
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::tagless::WireEnum for #name #ty_generics #where_clause {
            const REPR: ::tagless::Primitive = ::tagless::Primitive::#repr;

            fn to_discriminant(self) -> i128 { self as i128 }

            fn from_discriminant(
                discriminant: i128,
            ) -> ::std::option::Option<Self> {
                #(#variant_checks)*
                ::std::option::Option::None
            }
        }

        impl #impl_generics ::tagless::FieldType for #name #ty_generics #where_clause {
            fn shape() -> ::tagless::descriptor::Shape {
                ::tagless::descriptor::Shape::Enum(
                    ::tagless::descriptor::EnumShape::of::<Self>(),
                )
            }

            fn default_value() -> Self { Self::#first }
        }
    })
}
