use proc_macro2::{Literal, Span, TokenStream as TokenStream2};
use quote::quote;
use syn::LitByteStr;

use crate::LabelEnumAst;

/// Which id type the derive targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdSpace {
    State,
    Trigger,
}

impl IdSpace {
    fn id_type(self) -> TokenStream2 {
        match self {
            IdSpace::State => quote! { ::flash_fsm_core::StateId },
            IdSpace::Trigger => quote! { ::flash_fsm_core::TriggerId },
        }
    }

    fn kind(self) -> TokenStream2 {
        match self {
            IdSpace::State => quote! { ::flash_fsm_core::LabelKind::State },
            IdSpace::Trigger => quote! { ::flash_fsm_core::LabelKind::Trigger },
        }
    }
}

/// Every label followed by NUL, then one more NUL.
pub(crate) fn packed_bytes<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<u8> {
    let mut bytes = Vec::new();
    for label in labels {
        bytes.extend_from_slice(label.as_bytes());
        bytes.push(0);
    }
    bytes.push(0);
    bytes
}

pub(crate) fn generate_labels_impl(ast: &LabelEnumAst, space: IdSpace) -> TokenStream2 {
    let name = &ast.ident;
    let id_type = space.id_type();
    let kind = space.kind();

    let packed = LitByteStr::new(
        &packed_bytes(ast.variants.iter().map(|v| v.label.as_str())),
        Span::call_site(),
    );
    let count = ast.variants.len();
    let variants: Vec<_> = ast.variants.iter().map(|v| &v.ident).collect();
    let labels: Vec<_> = ast.variants.iter().map(|v| v.label.as_str()).collect();
    // Parsing caps the variant count at 255, so every index fits in a u8.
    let indices: Vec<Literal> = (0..=u8::MAX)
        .take(count)
        .map(Literal::u8_unsuffixed)
        .collect();

    quote! {
        impl ::flash_fsm_core::Labels for #name {
            const KIND: ::flash_fsm_core::LabelKind = #kind;
            const PACKED: &'static [u8] = #packed;
            const COUNT: usize = #count;

            fn index(self) -> u8 {
                match self {
                    #(Self::#variants => #indices,)*
                }
            }

            fn from_index(index: u8) -> ::core::option::Option<Self> {
                match index {
                    #(#indices => ::core::option::Option::Some(Self::#variants),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn name(self) -> &'static str {
                match self {
                    #(Self::#variants => #labels,)*
                }
            }
        }

        impl ::core::convert::From<#name> for #id_type {
            fn from(value: #name) -> Self {
                #id_type(<#name as ::flash_fsm_core::Labels>::index(value))
            }
        }

        impl ::core::convert::TryFrom<#id_type> for #name {
            type Error = #id_type;

            fn try_from(id: #id_type) -> ::core::result::Result<Self, Self::Error> {
                <#name as ::flash_fsm_core::Labels>::from_index(id.0).ok_or(id)
            }
        }
    }
}
