//! Elixir Term Conversion Utilities
//!
//! Converts patterns, path summaries and statistics to Elixir maps.

use rustler::{Encoder, Env, NewBinary, NifResult, Term};

use crate::data::{MemData, Names, NodeKind, StatsData, ValueKind};
use crate::stats::RebuildReport;
use crate::wildcard::Wildcard;

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    unbounded,
    // node kinds
    document,
    element,
    attribute,
    text,
    comment,
    processing_instruction,
    // value kinds
    none,
    integer,
    double,
    category,
    // dictionaries
    tags,
    atts,
    // map keys
    query,
    simple,
    max_length,
    prefix,
    atom_count,
    path,
    kind,
    count,
    text_len,
    level,
    name,
    len,
    min,
    max,
    distinct,
    size,
    height,
    elements,
    attributes,
    texts,
    summary_nodes,
    inconsistencies,
    elapsed_us,
}

/// Copy bytes into a new binary term
#[inline]
pub fn bytes_to_binary<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

fn node_kind_to_term<'a>(env: Env<'a>, node_kind: NodeKind) -> Term<'a> {
    match node_kind {
        NodeKind::Document => document().encode(env),
        NodeKind::Element => element().encode(env),
        NodeKind::Attribute => attribute().encode(env),
        NodeKind::Text => text().encode(env),
        NodeKind::Comment => comment().encode(env),
        NodeKind::ProcessingInstruction => processing_instruction().encode(env),
    }
}

fn value_kind_to_term<'a>(env: Env<'a>, value_kind: ValueKind) -> Term<'a> {
    match value_kind {
        ValueKind::None => none().encode(env),
        ValueKind::Integer => integer().encode(env),
        ValueKind::Double => double().encode(env),
        ValueKind::Category => category().encode(env),
        ValueKind::Text => text().encode(env),
    }
}

/// `%{query: ..., simple: ..., max_length: n | :unbounded, prefix: ..., atom_count: n}`
pub fn wildcard_info_to_term<'a>(env: Env<'a>, pattern: &Wildcard) -> NifResult<Term<'a>> {
    let max_len = match pattern.max_match_length() {
        Some(n) => n.encode(env),
        None => unbounded().encode(env),
    };
    let pairs = [
        (query().encode(env), bytes_to_binary(env, pattern.query().as_bytes())),
        (simple().encode(env), pattern.is_simple().encode(env)),
        (max_length().encode(env), max_len),
        (prefix().encode(env), bytes_to_binary(env, pattern.literal_prefix().as_bytes())),
        (atom_count().encode(env), pattern.atoms().len().encode(env)),
    ];
    Term::map_from_pairs(env, &pairs)
}

pub fn report_to_term<'a>(env: Env<'a>, report: &RebuildReport) -> NifResult<Term<'a>> {
    let pairs = [
        (size().encode(env), report.size.encode(env)),
        (height().encode(env), report.height.encode(env)),
        (elements().encode(env), report.elements.encode(env)),
        (attributes().encode(env), report.attributes.encode(env)),
        (texts().encode(env), report.texts.encode(env)),
        (summary_nodes().encode(env), report.summary_nodes.encode(env)),
        (inconsistencies().encode(env), report.inconsistencies.encode(env)),
        (elapsed_us().encode(env), (report.elapsed.as_micros() as u64).encode(env)),
    ];
    Term::map_from_pairs(env, &pairs)
}

/// Path summary as a pre-order list of
/// `%{path: "/a/@b", kind: atom, count: n, text_len: n, level: n}`
pub fn summary_to_term<'a>(env: Env<'a>, data: &MemData) -> NifResult<Term<'a>> {
    let skel = data.skeleton();
    let paths = skel.paths(data.tags(), data.atts());

    let mut list = Term::list_new_empty(env);
    for (label_path, id) in paths.iter().rev() {
        let Some(node) = skel.get(*id) else {
            continue;
        };
        let pairs = [
            (path().encode(env), bytes_to_binary(env, label_path)),
            (kind().encode(env), node_kind_to_term(env, node.kind)),
            (count().encode(env), node.count.encode(env)),
            (text_len().encode(env), node.text_len.encode(env)),
            (level().encode(env), node.level().encode(env)),
        ];
        list = list.list_prepend(Term::map_from_pairs(env, &pairs)?);
    }
    Ok(list)
}

/// Per-name statistics as a list of
/// `%{name: ..., count: n, len: n, kind: atom, min: x | nil, max: x | nil, distinct: n | nil}`
pub fn name_stats_to_term<'a>(env: Env<'a>, names: &Names) -> NifResult<Term<'a>> {
    let entries: Vec<_> = names.iter().collect();
    let nil = rustler::types::atom::nil().encode(env);

    let mut list = Term::list_new_empty(env);
    for (_, key, stats) in entries.into_iter().rev() {
        let (lo, hi) = match stats.range() {
            Some((lo, hi)) => (lo.encode(env), hi.encode(env)),
            None => (nil, nil),
        };
        let distinct_values = match stats.distinct() {
            Some(n) => n.encode(env),
            None => nil,
        };
        let pairs = [
            (name().encode(env), bytes_to_binary(env, key)),
            (count().encode(env), stats.count.encode(env)),
            (len().encode(env), stats.len.encode(env)),
            (kind().encode(env), value_kind_to_term(env, stats.kind)),
            (min().encode(env), lo),
            (max().encode(env), hi),
            (distinct().encode(env), distinct_values),
        ];
        list = list.list_prepend(Term::map_from_pairs(env, &pairs)?);
    }
    Ok(list)
}
