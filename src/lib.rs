//! RustyImport - structured data from HTML and XML at a URL
//!
//! Entry points:
//! A: XPath query (import_xml)
//! B: Several XPath queries over one fetch (import_xml_many)
//! C: N-th table or list of a page (import_html)
//! D: Raw response body (http_get)
//!
//! Every NIF runs on a dirty IO scheduler and returns one term: the data on
//! success or an `"Error: ..."` binary on failure.

use rustler::{Env, NifResult, Term};
use std::sync::OnceLock;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod import;
pub mod query;
pub mod shape;
mod term;
pub mod xpath;

pub use config::{ImportConfig, MatchPolicy, TlsVersion};
pub use dom::{Document, DocumentMode};
pub use error::{ErrorKind, ImportError};
pub use import::Importer;
pub use shape::{Extracted, ExtractionResult};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Shared State
// ============================================================================

static RUNTIME: OnceLock<Runtime> = OnceLock::new();
static IMPORTER: OnceLock<Importer> = OnceLock::new();

fn bridge() -> error::Result<(&'static Runtime, &'static Importer)> {
    match (RUNTIME.get(), IMPORTER.get()) {
        (Some(runtime), Some(importer)) => Ok((runtime, importer)),
        _ => Err(ImportError::Unavailable(
            "the native library did not finish loading".to_string(),
        )),
    }
}

// ============================================================================
// NIFs
// ============================================================================

/// Evaluate one XPath query against the document at `url`
#[rustler::nif(schedule = "DirtyIo")]
fn import_xml<'a>(env: Env<'a>, url: String, query: String, mode: Term<'a>) -> NifResult<Term<'a>> {
    let result = term::decode_mode(mode).and_then(|mode| {
        let (runtime, importer) = bridge()?;
        runtime.block_on(importer.import_by_query(&url, &query, mode))
    });
    Ok(term::result_to_term(env, result))
}

/// Evaluate several XPath queries against one fetch of `url`
#[rustler::nif(schedule = "DirtyIo")]
fn import_xml_many<'a>(
    env: Env<'a>,
    url: String,
    queries: Vec<String>,
    mode: Term<'a>,
) -> NifResult<Term<'a>> {
    let results = match term::decode_mode(mode).and_then(|mode| Ok((mode, bridge()?))) {
        Ok((mode, (runtime, importer))) => runtime.block_on(importer.import_queries(&url, &queries, mode)),
        Err(err) => queries.iter().map(|_| Err(err.clone())).collect(),
    };
    Ok(term::results_to_term(env, results))
}

/// Extract the `index`-th (one-based) table or list of the page at `url`
#[rustler::nif(schedule = "DirtyIo")]
fn import_html<'a>(env: Env<'a>, url: String, kind: String, index: i64) -> NifResult<Term<'a>> {
    let result = bridge().and_then(|(runtime, importer)| {
        runtime.block_on(importer.import_structured(&url, &kind, index))
    });
    Ok(term::result_to_term(env, result))
}

/// Fetch `url` and return the body unparsed
#[rustler::nif(schedule = "DirtyIo")]
fn http_get<'a>(env: Env<'a>, url: String) -> NifResult<Term<'a>> {
    let result = bridge().and_then(|(runtime, importer)| runtime.block_on(importer.fetch_raw(&url)));
    Ok(term::result_to_term(env, result))
}

// ============================================================================
// NIF Initialization
// ============================================================================

fn load(_env: Env, info: Term) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = term::decode_config(info);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("rustyimport-io")
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "failed to start the IO runtime");
            return false;
        }
    };

    let importer = match Importer::new(config) {
        Ok(importer) => importer,
        Err(err) => {
            tracing::error!(error = %err, "failed to build the HTTP client");
            return false;
        }
    };

    // An upgrade keeps the state from the first load
    let _ = RUNTIME.set(runtime);
    let _ = IMPORTER.set(importer);
    true
}

rustler::init!("Elixir.RustyImport.Native", load = load);
