//! XmlSkel - Structural statistics and wildcard matching for XML databases
//!
//! Components:
//! - Name dictionaries: byte keys to stable ids, with per-name value statistics
//! - Path summary: tree of distinct element/attribute paths with counts
//! - Statistics rebuild: one pass over a pre-order document (db_optimize)
//! - Wildcard matcher: full-text wildcard queries (wildcard_*)

use rustler::{Atom, Binary, Encoder, Env, NifResult, ResourceArc, Term};
use std::sync::Arc;

pub mod codec;
pub mod config;
pub mod data;
pub mod error;
pub mod hash;
pub mod skel;
pub mod stats;
pub mod wildcard;

mod resource;
mod term;

use config::StatsConfig;
use data::{MemData, NodeKind, RawNode};
use resource::{DatabaseRef, DatabaseResource, PatternRef, PatternResource};
use term::{atts, error, ok, tags};
use wildcard::{PatternCache, Wildcard};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                PEAK_ALLOCATED.fetch_max(current, Ordering::Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

#[cfg(feature = "memory_tracking")]
use std::sync::atomic::Ordering;

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory() -> usize {
    tracking::ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    tracking::PEAK_ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    let current = tracking::ALLOCATED.load(Ordering::SeqCst);
    let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
    (current, peak)
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    (0, 0)
}

// ============================================================================
// Wildcard Matching
// ============================================================================

/// Compile a wildcard query (returns {:ok, pattern} or {:error, reason})
#[rustler::nif]
fn wildcard_compile<'a>(env: Env<'a>, query: &str) -> NifResult<Term<'a>> {
    match Wildcard::parse(query) {
        Ok(pattern) => {
            let arc = ResourceArc::new(PatternResource::new(Arc::new(pattern)));
            Ok((ok(), arc).encode(env))
        }
        Err(e) => Ok((error(), e.to_string()).encode(env)),
    }
}

/// Match one token against a compiled pattern
#[rustler::nif(schedule = "DirtyCpu")]
fn wildcard_match<'a>(pattern: PatternRef, token: Binary<'a>) -> bool {
    pattern.pattern.matches_bytes(token.as_slice())
}

/// Match many tokens in parallel; results keep input order
#[rustler::nif(schedule = "DirtyCpu")]
fn wildcard_match_many<'a>(pattern: PatternRef, tokens: Vec<Binary<'a>>) -> Vec<bool> {
    let slices: Vec<&[u8]> = tokens.iter().map(|t| t.as_slice()).collect();
    wildcard::match_all(&pattern.pattern, &slices)
}

/// Filter tokens by a query compiled through the process-wide cache
/// Returns {:ok, matching_tokens} or {:error, reason}
#[rustler::nif(schedule = "DirtyCpu")]
fn wildcard_matches<'a>(env: Env<'a>, query: &str, tokens: Vec<Binary<'a>>) -> NifResult<Term<'a>> {
    let pattern = match PatternCache::global().get_or_compile(query) {
        Ok(p) => p,
        Err(e) => return Ok((error(), e.to_string()).encode(env)),
    };

    let slices: Vec<&[u8]> = tokens.iter().map(|t| t.as_slice()).collect();
    let hits = wildcard::filter_matches(&pattern, &slices);

    let mut list = Term::list_new_empty(env);
    for hit in hits.into_iter().rev() {
        list = list.list_prepend(term::bytes_to_binary(env, hit));
    }
    Ok((ok(), list).encode(env))
}

/// Describe a compiled pattern (query, simple, max_length, prefix)
#[rustler::nif]
fn wildcard_info<'a>(env: Env<'a>, pattern: PatternRef) -> NifResult<Term<'a>> {
    term::wildcard_info_to_term(env, &pattern.pattern)
}

// ============================================================================
// Database Statistics
// ============================================================================

/// Build a database from pre-order nodes `{kind_code, parent | nil, name, value}`
/// Returns {:ok, db} or {:error, reason}
#[rustler::nif]
fn db_from_nodes<'a>(
    env: Env<'a>,
    nodes: Vec<(u8, Option<u32>, Binary<'a>, Binary<'a>)>,
) -> NifResult<Term<'a>> {
    let mut raw = Vec::with_capacity(nodes.len());
    for (code, parent, name, value) in &nodes {
        let Some(kind) = NodeKind::from_code(*code) else {
            return Ok((error(), format!("invalid node kind {}", code)).encode(env));
        };
        raw.push(RawNode {
            kind,
            parent: *parent,
            name: name.as_slice(),
            value: value.as_slice(),
        });
    }

    let config = StatsConfig::from_env();
    match MemData::from_nodes(raw, &config) {
        Ok(data) => {
            let arc = ResourceArc::new(DatabaseResource::new(data, config));
            Ok((ok(), arc).encode(env))
        }
        Err(e) => Ok((error(), e.to_string()).encode(env)),
    }
}

/// Rebuild statistics, path summary and height
/// Returns {:ok, report} or {:error, reason}
#[rustler::nif(schedule = "DirtyCpu")]
fn db_optimize<'a>(env: Env<'a>, db: DatabaseRef) -> NifResult<Term<'a>> {
    match db.with_data(|data| stats::rebuild(data, &db.config)) {
        Ok(Ok(report)) => Ok((ok(), term::report_to_term(env, &report)?).encode(env)),
        Ok(Err(e)) => Ok((error(), e.to_string()).encode(env)),
        Err(msg) => Ok((error(), msg).encode(env)),
    }
}

/// Path summary of the last rebuild as a list of maps
#[rustler::nif]
fn db_summary<'a>(env: Env<'a>, db: DatabaseRef) -> NifResult<Term<'a>> {
    match db.with_data(|data| term::summary_to_term(env, data)) {
        Ok(result) => result,
        Err(msg) => Ok((error(), msg).encode(env)),
    }
}

/// Name statistics of the `:tags` or `:atts` dictionary
#[rustler::nif]
fn db_name_stats<'a>(env: Env<'a>, db: DatabaseRef, which: Atom) -> NifResult<Term<'a>> {
    use data::StatsData;

    let result = db.with_data(|data| {
        if which == tags() {
            Some(term::name_stats_to_term(env, data.tags()))
        } else if which == atts() {
            Some(term::name_stats_to_term(env, data.atts()))
        } else {
            None
        }
    });

    match result {
        Ok(Some(list)) => list,
        Ok(None) => Ok((error(), "expected :tags or :atts").encode(env)),
        Err(msg) => Ok((error(), msg).encode(env)),
    }
}

// ============================================================================
// NIF Initialization
// ============================================================================

#[allow(non_local_definitions)]
fn load(env: Env, _info: Term) -> bool {
    // Resources are registered by `#[rustler::resource_impl]` in resource.rs
    let _ = env;
    tracing::debug!("xmlskel NIFs loaded");
    true
}

rustler::init!("Elixir.XmlSkel.Native", load = load);
