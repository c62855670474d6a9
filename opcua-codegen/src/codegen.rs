// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Renders a [`Module`] from the type dictionary into the source text of one
//! `opcua-types/src/generated/<name>.rs` file.
//!
//! Each wire enum becomes a `wire_enum!` invocation; each struct becomes a
//! plain struct definition plus a `binary_struct!` invocation naming the same
//! fields in the same order, so the two can never drift out of sync the way
//! two independently hand-maintained lists could.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse_str;

use crate::dictionary::{EnumDef, FieldDef, Module, StructDef};
use crate::error::CodeGenError;

const LICENSE_HEADER: &str =
    "// OPCUA for Rust\n// SPDX-License-Identifier: MPL-2.0\n// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.\n";

/// Render `module` to the full text of its generated `.rs` file, including
/// the license header and module doc comment `prettyplease` doesn't know how
/// to place.
pub fn render_module(module: &Module) -> Result<String, CodeGenError> {
    let body = module_body_tokens(module)?;
    let file = syn::parse2::<syn::File>(body).map_err(|source| CodeGenError::Render {
        module: module.name.clone(),
        source,
    })?;
    let pretty = prettyplease::unparse(&file);

    let mut out = String::new();
    out.push_str(LICENSE_HEADER);
    out.push('\n');
    for line in module.doc.lines() {
        if line.is_empty() {
            out.push_str("//!\n");
        } else {
            out.push_str("//! ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push('\n');
    out.push_str(&pretty);
    Ok(out)
}

fn module_body_tokens(module: &Module) -> Result<TokenStream, CodeGenError> {
    let mut items = TokenStream::new();

    if !module.imports.is_empty() {
        for import in &module.imports {
            let path: syn::UseTree = parse_str(import)?;
            items.extend(quote! { use #path; });
        }
    }

    for e in &module.enums {
        items.extend(enum_tokens(e)?);
    }
    for s in &module.structs {
        items.extend(struct_tokens(s)?);
    }

    Ok(items)
}

fn enum_tokens(e: &EnumDef) -> Result<TokenStream, CodeGenError> {
    let name = format_ident!("{}", e.name);
    let default = format_ident!("{}", e.default);
    let variants = e.variants.iter().map(|v| {
        let vname = format_ident!("{}", v.name);
        let value = v.value;
        quote! { #vname = #value }
    });
    Ok(quote! {
        wire_enum!(#name, default = #default {
            #(#variants ,)*
        });
    })
}

fn struct_tokens(s: &StructDef) -> Result<TokenStream, CodeGenError> {
    let name = format_ident!("{}", s.name);
    let doc_attr = s.doc.as_deref().map(doc_attr_tokens).unwrap_or_default();

    let field_decls = s
        .fields
        .iter()
        .map(field_decl_tokens)
        .collect::<Result<Vec<_>, _>>()?;
    let macro_fields = s
        .fields
        .iter()
        .map(macro_field_tokens)
        .collect::<Result<Vec<_>, _>>()?;

    let null_impl = match &s.null_field {
        Some(field) => {
            let field = format_ident!("{}", field);
            quote! {
                impl UaNullable for #name {
                    fn is_ua_null(&self) -> bool {
                        self.#field.is_null()
                    }
                }
            }
        }
        None => quote! {
            impl UaNullable for #name {
                fn is_ua_null(&self) -> bool {
                    false
                }
            }
        },
    };

    Ok(quote! {
        #doc_attr
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct #name {
            #(#field_decls),*
        }

        #null_impl

        binary_struct!(#name {
            #(#macro_fields),*
        });
    })
}

fn field_decl_tokens(f: &FieldDef) -> Result<TokenStream, CodeGenError> {
    let name = format_ident!("{}", f.name);
    let ty: syn::Type = parse_str(&f.ty)?;
    let doc_attr = f.doc.as_deref().map(doc_attr_tokens).unwrap_or_default();
    Ok(quote! {
        #doc_attr
        pub #name: #ty
    })
}

fn macro_field_tokens(f: &FieldDef) -> Result<TokenStream, CodeGenError> {
    let name = format_ident!("{}", f.name);
    let ty: syn::Type = parse_str(&f.ty)?;
    Ok(quote! { #name: #ty })
}

fn doc_attr_tokens(doc: &str) -> TokenStream {
    quote! { #[doc = #doc] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::EnumVariant;

    #[test]
    fn renders_a_struct_and_its_binary_struct_invocation() {
        let module = Module {
            name: "greeting".into(),
            doc: "One-struct smoke test module.".into(),
            imports: vec!["crate::binary_struct".into()],
            enums: vec![],
            structs: vec![StructDef {
                name: "Greeting".into(),
                doc: Some("A greeting.".into()),
                fields: vec![FieldDef { name: "text".into(), ty: "UAString".into(), doc: None }],
                null_field: Some("text".into()),
            }],
        };

        let rendered = render_module(&module).unwrap();
        assert!(rendered.contains("pub struct Greeting"));
        assert!(rendered.contains("pub text: UAString"));
        assert!(rendered.contains("binary_struct!(Greeting"));
        assert!(rendered.contains("self.text.is_null()"));
    }

    #[test]
    fn renders_a_wire_enum_invocation() {
        let module = Module {
            name: "mode".into(),
            doc: "Enum smoke test module.".into(),
            imports: vec![],
            enums: vec![EnumDef {
                name: "Mode".into(),
                default: "Off".into(),
                variants: vec![
                    EnumVariant { name: "Off".into(), value: 0 },
                    EnumVariant { name: "On".into(), value: 1 },
                ],
            }],
            structs: vec![],
        };

        let rendered = render_module(&module).unwrap();
        assert!(rendered.contains("wire_enum!(Mode, default = Off"));
        assert!(rendered.contains("On = 1"));
    }
}
