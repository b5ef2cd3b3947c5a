//! Procedural macros for sexp-orchestrator tools
//!
//! Provides the `#[tool]` attribute macro, the spec's equivalent of the
//! teacher's `#[builtin(...)]`: it extracts rustdoc comments from a native
//! tool function into a `ToolSpec` (signature/description/examples/related/
//! category) and emits a `register_<fn>` helper that calls
//! `ToolSurface::register_tool` (§6.2, §A.1).

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, ItemFn, Meta};

/// Parsed rustdoc: the summary line plus any fenced ```lisp examples.
struct DocMarkdown {
    summary: String,
    examples: Vec<String>,
}

fn extract_doc_comments(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc") {
                if let Meta::NameValue(nv) = &attr.meta {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(lit_str),
                        ..
                    }) = &nv.value
                    {
                        return Some(lit_str.value());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_doc_markdown(raw_doc: &str) -> DocMarkdown {
    let mut summary = String::new();
    let mut examples = Vec::new();
    let mut in_example_block = false;
    let mut current_example = String::new();
    let mut seen_blank = false;

    for line in raw_doc.lines() {
        let trimmed = line.trim();
        if let Some(fence) = trimmed.strip_prefix("```") {
            if in_example_block {
                let code = current_example.trim().to_string();
                if !code.is_empty() {
                    examples.push(code);
                }
                current_example.clear();
                in_example_block = false;
            } else if fence.trim() == "lisp" {
                in_example_block = true;
            }
            continue;
        }
        if in_example_block {
            current_example.push_str(line);
            current_example.push('\n');
            continue;
        }
        if trimmed.is_empty() {
            seen_blank = true;
            continue;
        }
        if !seen_blank {
            if !summary.is_empty() {
                summary.push(' ');
            }
            summary.push_str(trimmed);
        }
    }

    DocMarkdown { summary, examples }
}

/// Parses `name = "...", category = "...", related(a, b)` from the attribute
/// token stream. Deliberately simple string scanning, mirroring the
/// teacher's own macro-argument parser rather than a full `syn` grammar.
fn parse_tool_args(attr_stream: TokenStream) -> (String, String, Vec<String>) {
    let attr_str = attr_stream.to_string();
    let mut name = String::new();
    let mut category = String::new();
    let mut related = Vec::new();

    if let Some(start) = attr_str.find("name = \"") {
        let rest = &attr_str[start + 8..];
        if let Some(end) = rest.find('"') {
            name = rest[..end].to_string();
        }
    }
    if let Some(start) = attr_str.find("category = \"") {
        let rest = &attr_str[start + 12..];
        if let Some(end) = rest.find('"') {
            category = rest[..end].to_string();
        }
    }
    if let Some(start) = attr_str.find("related") {
        let rest = &attr_str[start..];
        if let (Some(paren_start), Some(paren_end)) = (rest.find('('), rest.find(')')) {
            related = rest[paren_start + 1..paren_end]
                .split(',')
                .map(|s| s.trim().trim_matches('"').replace(' ', "").to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    (name, category, related)
}

/// `#[tool(name = "http-get", category = "Network", related(http-post))]`
/// above a `fn(&[Value]) -> Result<Value, EvalError>` native tool function.
/// Leaves the function untouched and emits `register_<fn>`, which builds the
/// `ToolSpec` from the doc comments and attribute metadata and calls
/// `ToolSurface::register_tool` with it (§6.2).
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);
    let (tool_name, category, related) = parse_tool_args(attr);

    let fn_name = func.sig.ident.clone();
    let name_to_use = if tool_name.is_empty() {
        fn_name.to_string()
    } else {
        tool_name
    };
    let category_to_use = if category.is_empty() { "General".to_string() } else { category };

    let raw_docs = extract_doc_comments(&func.attrs);
    let parsed_docs = parse_doc_markdown(&raw_docs);
    let description = parsed_docs.summary;
    let examples = parsed_docs.examples;

    let register_fn_name = quote::format_ident!("register_{}", fn_name);

    let expanded = quote! {
        #func

        /// Generated by `#[tool]`: builds this function's `ToolSpec` from its
        /// doc comments and registers it on the given surface.
        pub fn #register_fn_name(surface: &mut dyn crate::capability::ToolSurface) {
            let spec = crate::capability::ToolSpec {
                name: #name_to_use.to_string(),
                description: #description.to_string(),
                examples: vec![#(#examples.to_string()),*],
                related: vec![#(#related.to_string()),*],
                category: #category_to_use.to_string(),
            };
            surface.register_tool(spec, #fn_name);
        }
    };

    TokenStream::from(expanded)
}
