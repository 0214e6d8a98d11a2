//! Expansion of `#[derive(Record)]`.

use proc_macro2::{Literal, Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Error, Expr, Fields, Ident, Index, LitStr, Member, Result, Type,
};

/// Where a field's generator comes from
#[derive(Debug)]
enum FieldSource {
    /// `<Ty as Arbitrary>::arbitrary()`
    Arbitrary,
    /// An infallible generator expression
    With(Expr),
    /// An expression returning `Result<generator, GenError>`
    TryWith(Expr),
}

impl FieldSource {
    fn is_fallible(&self) -> bool {
        matches!(self, FieldSource::TryWith(_))
    }
}

struct RecordField {
    member: Member,
    slot: Ident,
    ty: Type,
    source: FieldSource,
}

/// Expand the derive for one struct
pub fn expand(input: &DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Record derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => collect_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Record derive is only supported for structs",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Record derive is not supported for unions",
            ));
        }
    };

    let vis = &input.vis;
    let record_name = record_ident(name);
    let record_doc = format!("Generator for [`{}`], derived field by field.", name);

    let slots: Vec<&Ident> = fields.iter().map(|f| &f.slot).collect();
    let types: Vec<&Type> = fields.iter().map(|f| &f.ty).collect();
    let try_inits: Vec<TokenStream> = fields.iter().map(|f| field_init(f, true)).collect();

    let produce_body = produce_body(name, &input.data, &fields);
    let shrink_body = shrink_body(&fields);

    let arbitrary_impl = if fields.iter().any(|f| f.source.is_fallible()) {
        quote! {}
    } else {
        let inits: Vec<TokenStream> = fields.iter().map(|f| field_init(f, false)).collect();
        quote! {
            impl ::chancery::Arbitrary for #name {
                type Generator = #record_name;

                fn arbitrary() -> Self::Generator {
                    #record_name {
                        #(#slots: #inits,)*
                    }
                }
            }
        }
    };

    Ok(quote! {
        #[doc = #record_doc]
        #[derive(Debug, Clone)]
        #vis struct #record_name {
            #(#slots: ::chancery::BoxedGenerator<#types>,)*
        }

        impl #name {
            /// Build the generator for this record, constructing every field generator.
            #vis fn record_generator() -> ::core::result::Result<#record_name, ::chancery::GenError> {
                ::core::result::Result::Ok(#record_name {
                    #(#slots: #try_inits,)*
                })
            }
        }

        impl ::chancery::Generator for #record_name {
            type Value = #name;

            fn produce(
                &self,
                ledger: &mut ::chancery::ChoiceLedger,
            ) -> ::core::result::Result<#name, ::chancery::GenError> {
                #produce_body
            }

            fn shrink(&self, value: &#name) -> ::chancery::ShrinkSequence<#name> {
                #shrink_body
            }
        }

        #arbitrary_impl
    })
}

/// Name of the generated generator type
fn record_ident(name: &Ident) -> Ident {
    format_ident!("{}Record", name)
}

fn collect_fields(fields: &Fields) -> Result<Vec<RecordField>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let (member, slot) = match &field.ident {
                Some(ident) => (Member::Named(ident.clone()), ident.clone()),
                None => (
                    Member::Unnamed(Index::from(index)),
                    Ident::new(&format!("field_{}", index), Span::call_site()),
                ),
            };
            Ok(RecordField {
                member,
                slot,
                ty: field.ty.clone(),
                source: parse_field_source(&field.attrs)?,
            })
        })
        .collect()
}

/// Read the `#[record(...)]` attribute of a field, if any
fn parse_field_source(attrs: &[Attribute]) -> Result<FieldSource> {
    let mut source = FieldSource::Arbitrary;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if !matches!(source, FieldSource::Arbitrary) {
                return Err(meta.error("a field takes at most one generator"));
            }
            if meta.path.is_ident("with") {
                let lit: LitStr = meta.value()?.parse()?;
                source = FieldSource::With(lit.parse()?);
                Ok(())
            } else if meta.path.is_ident("try_with") {
                let lit: LitStr = meta.value()?.parse()?;
                source = FieldSource::TryWith(lit.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `with = \"...\"` or `try_with = \"...\"`"))
            }
        })?;
    }

    Ok(source)
}

/// Expression initializing a field's boxed generator.
///
/// With `propagate`, fallible sources use `?`; without it they are never requested.
fn field_init(field: &RecordField, propagate: bool) -> TokenStream {
    let ty = &field.ty;
    match &field.source {
        FieldSource::Arbitrary => quote! {
            ::chancery::BoxedGenerator::new(<#ty as ::chancery::Arbitrary>::arbitrary())
        },
        FieldSource::With(expr) => quote! {
            ::chancery::BoxedGenerator::<#ty>::new(#expr)
        },
        FieldSource::TryWith(expr) if propagate => quote! {
            ::chancery::BoxedGenerator::<#ty>::new((#expr)?)
        },
        FieldSource::TryWith(expr) => {
            Error::new_spanned(expr, "fallible field generator in an infallible context")
                .to_compile_error()
        }
    }
}

/// Body of `produce`: draw every field in declaration order
fn produce_body(name: &Ident, data: &Data, fields: &[RecordField]) -> TokenStream {
    let draws = fields.iter().map(|f| {
        let slot = &f.slot;
        quote! { ::chancery::Generator::produce(&self.#slot, ledger)? }
    });

    let is_tuple = matches!(data, Data::Struct(s) if matches!(s.fields, Fields::Unnamed(_)));
    let is_unit = matches!(data, Data::Struct(s) if matches!(s.fields, Fields::Unit));

    if is_unit {
        quote! {
            let _ = ledger;
            ::core::result::Result::Ok(#name)
        }
    } else if is_tuple {
        quote! { ::core::result::Result::Ok(#name(#(#draws),*)) }
    } else {
        let members = fields.iter().map(|f| &f.member);
        quote! { ::core::result::Result::Ok(#name { #(#members: #draws),* }) }
    }
}

/// Body of `shrink`: one field at a time in declaration order, each field's
/// candidates built only after the previous field has run out
fn shrink_body(fields: &[RecordField]) -> TokenStream {
    if fields.is_empty() {
        return quote! {
            let _ = value;
            ::chancery::ShrinkSequence::empty()
        };
    }

    let count = fields.len();
    let indices = (0..count).map(Literal::usize_unsuffixed);
    let parts = fields.iter().map(shrink_part);
    quote! {
        let generator = ::core::clone::Clone::clone(self);
        let failing = ::core::clone::Clone::clone(value);
        ::chancery::ShrinkSequence::concat_with(#count, move |field| match field {
            #(#indices => #parts,)*
            _ => ::chancery::ShrinkSequence::empty(),
        })
    }
}

/// Shrink candidates for one field, with every other field held at its failing value
fn shrink_part(field: &RecordField) -> TokenStream {
    let slot = &field.slot;
    let member = &field.member;
    quote! {
        {
            let candidates = ::chancery::Generator::shrink(&generator.#slot, &failing.#member);
            let base = ::core::clone::Clone::clone(&failing);
            candidates.map(move |candidate| {
                let mut whole = ::core::clone::Clone::clone(&base);
                whole.#member = candidate;
                whole
            })
        }
    }
}
