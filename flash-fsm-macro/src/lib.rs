use proc_macro::TokenStream;
use syn::{parse_macro_input, Data, DeriveInput, Expr, ExprLit, Fields, Ident, Lit, Meta, Result};

mod code_generator;

use code_generator::{generate_labels_impl, IdSpace};

const MAX_VARIANTS: usize = u8::MAX as usize;

/// One enum variant and the label it is stored under.
#[derive(Debug)]
struct VariantLabel {
    ident: Ident,
    label: String,
}

/// A fieldless enum accepted by the label derives.
#[derive(Debug)]
struct LabelEnumAst {
    ident: Ident,
    variants: Vec<VariantLabel>,
}

impl LabelEnumAst {
    fn from_derive_input(input: &DeriveInput) -> Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &input.generics,
                "label enums cannot have generic parameters",
            ));
        }
        let Data::Enum(data) = &input.data else {
            return Err(syn::Error::new(
                input.ident.span(),
                "States/Triggers can only be derived for enums",
            ));
        };
        if data.variants.is_empty() {
            return Err(syn::Error::new(
                input.ident.span(),
                "label enums need at least one variant",
            ));
        }
        if data.variants.len() > MAX_VARIANTS {
            return Err(syn::Error::new(
                input.ident.span(),
                format!(
                    "label enums support at most {MAX_VARIANTS} variants, found {}",
                    data.variants.len()
                ),
            ));
        }

        let mut variants = Vec::with_capacity(data.variants.len());
        for variant in &data.variants {
            if !matches!(variant.fields, Fields::Unit) {
                return Err(syn::Error::new_spanned(
                    &variant.fields,
                    "label enum variants cannot carry fields",
                ));
            }
            let label = match label_attribute(&variant.attrs)? {
                Some(label) => label,
                None => variant.ident.to_string(),
            };
            variants.push(VariantLabel {
                ident: variant.ident.clone(),
                label,
            });
        }

        Ok(LabelEnumAst {
            ident: input.ident.clone(),
            variants,
        })
    }
}

/// Reads `#[label = "..."]`, rejecting labels that would corrupt the packed table.
fn label_attribute(attrs: &[syn::Attribute]) -> Result<Option<String>> {
    let mut found = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("label")) {
        if found.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "duplicate #[label] attribute",
            ));
        }
        let Meta::NameValue(name_value) = &attr.meta else {
            return Err(syn::Error::new_spanned(attr, "expected #[label = \"...\"]"));
        };
        let Expr::Lit(ExprLit {
            lit: Lit::Str(text),
            ..
        }) = &name_value.value
        else {
            return Err(syn::Error::new_spanned(
                &name_value.value,
                "label must be a string literal",
            ));
        };
        let label = text.value();
        if label.is_empty() {
            return Err(syn::Error::new_spanned(text, "label cannot be empty"));
        }
        if label.contains('\0') {
            return Err(syn::Error::new_spanned(text, "label cannot contain NUL"));
        }
        if !label.is_ascii() {
            return Err(syn::Error::new_spanned(text, "label must be ASCII"));
        }
        found = Some(label);
    }
    Ok(found)
}

fn expand(input: &DeriveInput, space: IdSpace) -> proc_macro2::TokenStream {
    match LabelEnumAst::from_derive_input(input) {
        Ok(ast) => generate_labels_impl(&ast, space),
        Err(err) => err.to_compile_error(),
    }
}

/// Derives `Labels`, `From<Enum> for StateId` and `TryFrom<StateId> for Enum`.
///
/// Variants are labeled with their name unless `#[label = "..."]` says
/// otherwise. The enum must also derive `Clone`, `Copy`, `PartialEq` and `Eq`.
#[proc_macro_derive(States, attributes(label))]
pub fn derive_states(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input, IdSpace::State).into()
}

/// Like [`macro@States`], for `TriggerId`.
#[proc_macro_derive(Triggers, attributes(label))]
pub fn derive_triggers(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input, IdSpace::Trigger).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn error_of(input: DeriveInput) -> String {
        LabelEnumAst::from_derive_input(&input)
            .unwrap_err()
            .to_string()
    }

    #[test]
    fn labels_default_to_variant_names() {
        let input: DeriveInput = parse_quote! {
            enum Light { Red, #[label = "amber"] Yellow, Green }
        };
        let ast = LabelEnumAst::from_derive_input(&input).unwrap();
        let labels: Vec<&str> = ast.variants.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, ["Red", "amber", "Green"]);
        assert_eq!(ast.ident, "Light");
    }

    #[test]
    fn structs_are_rejected() {
        let input: DeriveInput = parse_quote! { struct NotAnEnum; };
        assert!(error_of(input).contains("only be derived for enums"));
    }

    #[test]
    fn empty_enums_are_rejected() {
        let input: DeriveInput = parse_quote! { enum Nothing {} };
        assert!(error_of(input).contains("at least one variant"));
    }

    #[test]
    fn generic_enums_are_rejected() {
        let input: DeriveInput = parse_quote! { enum Holder<T> { A } };
        assert!(error_of(input).contains("generic"));
    }

    #[test]
    fn variants_with_fields_are_rejected() {
        let input: DeriveInput = parse_quote! { enum Ev { Press(u8) } };
        assert!(error_of(input).contains("cannot carry fields"));
        let input: DeriveInput = parse_quote! { enum Ev { Press { at: u32 } } };
        assert!(error_of(input).contains("cannot carry fields"));
    }

    #[test]
    fn bad_labels_are_rejected() {
        let input: DeriveInput = parse_quote! { enum S { #[label = ""] A } };
        assert!(error_of(input).contains("cannot be empty"));
        let input: DeriveInput = parse_quote! { enum S { #[label = "a\0b"] A } };
        assert!(error_of(input).contains("NUL"));
        let input: DeriveInput = parse_quote! { enum S { #[label = "ärger"] A } };
        assert!(error_of(input).contains("ASCII"));
        let input: DeriveInput = parse_quote! { enum S { #[label(x)] A } };
        assert!(error_of(input).contains("expected #[label"));
        let input: DeriveInput = parse_quote! { enum S { #[label = 3] A } };
        assert!(error_of(input).contains("string literal"));
        let input: DeriveInput = parse_quote! { enum S { #[label = "a"] #[label = "b"] A } };
        assert!(error_of(input).contains("duplicate"));
    }

    #[test]
    fn too_many_variants_are_rejected() {
        let variants = (0..256u32).map(|i| quote::format_ident!("V{}", i));
        let input: DeriveInput = parse_quote! { enum Wide { #(#variants),* } };
        assert!(error_of(input).contains("at most 255"));
    }

    #[test]
    fn errors_expand_to_compile_error() {
        let input: DeriveInput = parse_quote! { struct Nope; };
        let tokens = expand(&input, IdSpace::State).to_string();
        assert!(tokens.contains("compile_error"));
    }
}
