//! Elixir Term Conversion Utilities
//!
//! Encodes extraction results into the single term the host receives and
//! decodes the arguments and load data it sends.

use crate::config::{ImportConfig, MatchPolicy, TlsVersion};
use crate::dom::DocumentMode;
use crate::error::{ImportError, Result};
use crate::shape::{Extracted, ExtractionResult};
use rustler::{Atom, Env, NewBinary, Term};
use std::time::Duration;

// Keys of the load_info map
rustler::atoms! {
    min_tls_version,
    timeout_ms,
    user_agent,
    max_redirects,
    match_policy,
}

/// Scalar → binary, Sequence → `[[v], ...]`, Grid → `[[c, ...], ...]`,
/// error → `"Error: ..."` binary
pub fn result_to_term<'a>(env: Env<'a>, result: ExtractionResult) -> Term<'a> {
    match result {
        Ok(Extracted::Scalar(value)) => str_to_binary(env, &value),
        Ok(extracted) => rows_to_term(env, extracted.into_rows()),
        Err(err) => str_to_binary(env, &err.boundary_message()),
    }
}

/// One term per result, same order
pub fn results_to_term<'a>(env: Env<'a>, results: Vec<ExtractionResult>) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for result in results.into_iter().rev() {
        list = list.list_prepend(result_to_term(env, result));
    }
    list
}

fn rows_to_term<'a>(env: Env<'a>, rows: Vec<Vec<String>>) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for row in rows.iter().rev() {
        let mut cells = Term::list_new_empty(env);
        for cell in row.iter().rev() {
            cells = cells.list_prepend(str_to_binary(env, cell));
        }
        list = list.list_prepend(cells);
    }
    list
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

/// Atom or binary as text
fn term_text(term: Term) -> Option<String> {
    if term.is_atom() {
        term.atom_to_string().ok()
    } else {
        term.decode::<String>().ok()
    }
}

/// `:html`, `:xml`, `"html"` or `"xml"`
pub fn decode_mode(term: Term) -> Result<DocumentMode> {
    term_text(term)
        .ok_or_else(|| ImportError::invalid_argument("Mode must be 'html' or 'xml'"))?
        .parse()
}

/// Build the importer configuration from the NIF load data.
///
/// Missing keys keep their defaults. Present but unusable values are logged
/// and ignored, so a bad knob never stops the library from loading.
pub fn decode_config(info: Term) -> ImportConfig {
    let mut config = ImportConfig::default();
    if !info.is_map() {
        return config;
    }

    if let Some(value) = setting(info, min_tls_version(), "min_tls_version", |term| {
        term_text(term)
            .ok_or_else(|| "expected an atom or string".to_string())?
            .parse::<TlsVersion>()
    }) {
        config.min_tls_version = value;
    }

    if let Some(value) = setting(info, timeout_ms(), "timeout_ms", |term| {
        match term.decode::<u64>() {
            Ok(0) | Err(_) => Err("expected a positive integer".to_string()),
            Ok(ms) => Ok(Duration::from_millis(ms)),
        }
    }) {
        config.timeout = value;
    }

    if let Some(value) = setting(info, user_agent(), "user_agent", |term| {
        term.decode::<String>()
            .ok()
            .filter(|agent| !agent.trim().is_empty())
            .ok_or_else(|| "expected a non-empty string".to_string())
    }) {
        config.user_agent = value;
    }

    if let Some(value) = setting(info, max_redirects(), "max_redirects", |term| {
        term.decode::<usize>()
            .map_err(|_| "expected a non-negative integer".to_string())
    }) {
        config.max_redirects = value;
    }

    if let Some(value) = setting(info, match_policy(), "match_policy", |term| {
        term_text(term)
            .ok_or_else(|| "expected an atom or string".to_string())?
            .parse::<MatchPolicy>()
    }) {
        config.match_policy = value;
    }

    tracing::debug!(?config, "importer configured");
    config
}

fn setting<'a, T>(
    info: Term<'a>,
    key: Atom,
    name: &str,
    parse: impl FnOnce(Term<'a>) -> std::result::Result<T, String>,
) -> Option<T> {
    let term = info.map_get(key).ok()?;
    match parse(term) {
        Ok(value) => Some(value),
        Err(reason) => {
            tracing::warn!(setting = name, %reason, "ignoring invalid setting");
            None
        }
    }
}
