//! Proc macros for describing structured oracle replies.
//!
//! Provides `#[derive(Tool)]`, which turns a plain struct into a Claude tool
//! definition whose JSON schema matches the struct's serde representation.
//! Forcing the model to call that tool is how the judge gets a reply of a
//! known shape.
//!
//! # Example
//!
//! ```ignore
//! /// Record the verdict for the submitted verse
//! #[derive(Tool, Deserialize)]
//! #[tool(name = "record_verdict")]
//! #[serde(rename_all = "camelCase")]
//! struct WireVerdict {
//!     /// Whether the verse is acceptable
//!     is_valid: bool,
//!     /// Last letter of the reply verse
//!     #[tool(max_length = 1)]
//!     next_letter: Option<String>,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, DeriveInput, Field, Lit, LitInt, LitStr, Meta, Type};

/// Derive macro for generating Tool implementations.
///
/// # Attributes
///
/// - `#[tool(name = "...")]` - Override the tool name (defaults to snake_case struct name)
/// - `#[tool(optional)]` on fields - Leave a non-`Option` field out of `required`
/// - `#[tool(required)]` on fields - List an `Option` field in `required`
/// - `#[tool(rename = "...")]` on fields - Override field name in schema
/// - `#[tool(max_length = N)]` on string fields - Add `maxLength` to the schema
///
/// `#[serde(rename_all = "...")]` on the struct and `#[serde(rename = "...")]`
/// on fields are honoured, so the schema names match what serde reads back.
#[proc_macro_derive(Tool, attributes(tool))]
pub fn derive_tool(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_tool(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// Per-field options collected from `#[tool(...)]` and `#[serde(...)]`.
#[derive(Default)]
struct FieldOptions {
    rename: Option<String>,
    optional: bool,
    required: bool,
    max_length: Option<usize>,
}

fn expand_tool(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let tool_name = get_tool_name(&input)?;
    let description = get_doc_comment(&input.attrs);
    let rename_all = get_serde_rename_all(&input.attrs)?;

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Tool derive only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Tool derive only supports structs",
            ))
        }
    };

    let mut property_tokens = Vec::new();
    let mut required_fields = Vec::new();

    for field in fields {
        let options = field_options(field)?;
        if options.optional && options.required {
            return Err(syn::Error::new_spanned(
                field,
                "a field cannot be both `optional` and `required`",
            ));
        }

        let field_name = wire_name(field, &options, rename_all.as_deref())?;
        let field_desc = get_doc_comment(&field.attrs);
        let type_schema = type_to_schema(&field.ty)?;

        let desc_token = if field_desc.is_empty() {
            quote! {}
        } else {
            quote! { property["description"] = serde_json::json!(#field_desc); }
        };

        let max_len_token = match options.max_length {
            Some(max) => quote! { property["maxLength"] = serde_json::json!(#max); },
            None => quote! {},
        };

        property_tokens.push(quote! {
            {
                let mut property = #type_schema;
                #desc_token
                #max_len_token
                properties.insert(#field_name.to_string(), property);
            }
        });

        let required = if is_option_type(&field.ty) {
            options.required
        } else {
            !options.optional
        };
        if required {
            required_fields.push(field_name);
        }
    }

    Ok(quote! {
        impl #struct_name {
            /// Get the tool name.
            pub fn tool_name() -> &'static str {
                #tool_name
            }

            /// Get the tool description.
            pub fn tool_description() -> &'static str {
                #description
            }

            /// Generate the JSON schema for this tool's input.
            pub fn input_schema() -> serde_json::Value {
                let mut properties = serde_json::Map::new();
                #(#property_tokens)*

                let required: Vec<&str> = vec![#(#required_fields),*];

                serde_json::json!({
                    "type": "object",
                    "properties": properties,
                    "required": required
                })
            }

            /// Create a Tool definition for use with the Claude API.
            pub fn as_tool() -> claude::Tool {
                claude::Tool {
                    name: Self::tool_name().to_string(),
                    description: Self::tool_description().to_string(),
                    input_schema: Self::input_schema(),
                }
            }
        }
    })
}

fn get_tool_name(input: &DeriveInput) -> syn::Result<String> {
    let mut name = None;
    for attr in tool_attrs(&input.attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("unsupported tool attribute on struct"))
            }
        })?;
    }

    Ok(name.unwrap_or_else(|| to_snake_case(&input.ident.to_string())))
}

fn get_serde_rename_all(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rename_all = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        // Other serde options are serde's business; skip their values.
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                rename_all = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.input.peek(syn::Token![=]) {
                meta.value()?.parse::<syn::Expr>()?;
            }
            Ok(())
        })?;
    }
    Ok(rename_all)
}

fn field_options(field: &Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in tool_attrs(&field.attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                options.rename = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("optional") {
                options.optional = true;
            } else if meta.path.is_ident("required") {
                options.required = true;
            } else if meta.path.is_ident("max_length") {
                options.max_length = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
            } else {
                return Err(meta.error("unsupported tool attribute on field"));
            }
            Ok(())
        })?;
    }

    if options.rename.is_none() {
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    options.rename = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.input.peek(syn::Token![=]) {
                    meta.value()?.parse::<syn::Expr>()?;
                }
                Ok(())
            })?;
        }
    }

    Ok(options)
}

fn wire_name(field: &Field, options: &FieldOptions, rename_all: Option<&str>) -> syn::Result<String> {
    if let Some(name) = &options.rename {
        return Ok(name.clone());
    }

    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
    let raw = ident.to_string();
    let raw = raw.strip_prefix("r#").unwrap_or(&raw);

    match rename_all {
        None | Some("snake_case") => Ok(raw.to_string()),
        Some("camelCase") => Ok(to_camel_case(raw)),
        Some(other) => Err(syn::Error::new_spanned(
            field,
            format!("Tool derive does not understand rename_all = \"{other}\""),
        )),
    }
}

fn tool_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|a| a.path().is_ident("tool"))
}

fn get_doc_comment(attrs: &[Attribute]) -> String {
    let mut docs = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("doc") {
            if let Meta::NameValue(nv) = &attr.meta {
                if let syn::Expr::Lit(expr_lit) = &nv.value {
                    if let Lit::Str(s) = &expr_lit.lit {
                        docs.push(s.value().trim().to_string());
                    }
                }
            }
        }
    }
    docs.join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

fn type_to_schema(ty: &Type) -> syn::Result<TokenStream2> {
    let Type::Path(type_path) = ty else {
        return Ok(quote! { serde_json::json!({}) });
    };
    let Some(segment) = type_path.path.segments.last() else {
        return Ok(quote! { serde_json::json!({}) });
    };

    let inner = || match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(syn::GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    };

    Ok(match segment.ident.to_string().as_str() {
        "String" | "str" | "char" => quote! { serde_json::json!({"type": "string"}) },
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
            quote! { serde_json::json!({"type": "integer"}) }
        }
        "f32" | "f64" => quote! { serde_json::json!({"type": "number"}) },
        "bool" => quote! { serde_json::json!({"type": "boolean"}) },
        "Option" => match inner() {
            Some(inner) => return type_to_schema(inner),
            None => quote! { serde_json::json!({}) },
        },
        "Vec" => match inner() {
            Some(inner) => {
                let inner_schema = type_to_schema(inner)?;
                quote! {
                    serde_json::json!({
                        "type": "array",
                        "items": #inner_schema
                    })
                }
            }
            None => quote! { serde_json::json!({"type": "array"}) },
        },
        _ => quote! { serde_json::json!({"type": "object"}) },
    })
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

fn to_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper_next = false;
    for c in s.chars() {
        if c == '_' {
            upper_next = !result.is_empty();
        } else if upper_next {
            result.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_conversion() {
        assert_eq!(to_snake_case("RecordVerdict"), "record_verdict");
        assert_eq!(to_camel_case("is_valid"), "isValid");
        assert_eq!(to_camel_case("bot_verse_poet"), "botVersePoet");
        assert_eq!(to_camel_case("message"), "message");
    }

    #[test]
    fn test_wire_name_honours_serde() {
        let input: DeriveInput = syn::parse_quote! {
            #[serde(rename_all = "camelCase", deny_unknown_fields)]
            struct Wire {
                is_valid: bool,
                #[serde(rename = "botVersePoet")]
                poet: Option<String>,
            }
        };
        let rename_all = get_serde_rename_all(&input.attrs).unwrap();
        assert_eq!(rename_all.as_deref(), Some("camelCase"));

        let syn::Data::Struct(data) = &input.data else {
            panic!("expected struct");
        };
        let names: Vec<String> = data
            .fields
            .iter()
            .map(|f| wire_name(f, &field_options(f).unwrap(), rename_all.as_deref()).unwrap())
            .collect();
        assert_eq!(names, vec!["isValid", "botVersePoet"]);
    }

    #[test]
    fn test_conflicting_field_options_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Wire {
                #[tool(optional, required)]
                letter: Option<String>,
            }
        };
        assert!(expand_tool(input).is_err());
    }
}
