//! Documentation lookup over the function registry.
//!
//! Hidden functions never appear here, whatever the query.

use crate::error::DocError;
use crate::functions::{FunctionDoc, FunctionRegistry};

/// Visible functions, sorted by name. `filter` keeps an exact name or every
/// function in a module (`jobs` matches `jobs.active`).
pub fn list_docs(registry: &FunctionRegistry, filter: Option<&str>) -> Vec<FunctionDoc> {
    registry
        .docs()
        .into_iter()
        .filter(|doc| !doc.hidden)
        .filter(|doc| filter.is_none_or(|f| matches_filter(&doc.name, f)))
        .collect()
}

fn matches_filter(name: &str, filter: &str) -> bool {
    name == filter
        || name
            .strip_prefix(filter)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Documentation for one visible function.
pub fn get_doc(registry: &FunctionRegistry, name: &str) -> Result<FunctionDoc, DocError> {
    registry
        .docs()
        .into_iter()
        .find(|doc| doc.name == name && !doc.hidden)
        .ok_or_else(|| DocError::UnknownFunction {
            name: name.to_string(),
        })
}

/// Answer a documentation request naming zero or one function (or module).
pub fn lookup_docs<S: AsRef<str>>(
    registry: &FunctionRegistry,
    names: &[S],
) -> Result<Vec<FunctionDoc>, DocError> {
    match names {
        [] => Ok(list_docs(registry, None)),
        [name] => {
            let name = name.as_ref();
            if let Ok(doc) = get_doc(registry, name) {
                return Ok(vec![doc]);
            }
            let docs = list_docs(registry, Some(name));
            if docs.is_empty() {
                Err(DocError::UnknownFunction {
                    name: name.to_string(),
                })
            } else {
                Ok(docs)
            }
        }
        _ => Err(DocError::TooManyArguments { given: names.len() }),
    }
}

/// Render docs as `name:` headings with indented summaries.
pub fn render_docs(docs: &[FunctionDoc]) -> String {
    let mut out = String::new();
    for doc in docs {
        out.push_str(&doc.name);
        out.push_str(":\n");
        for line in doc.summary.lines() {
            if line.is_empty() {
                out.push('\n');
            } else {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push('\n');
    }
    out
}
