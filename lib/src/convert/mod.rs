//! Model-to-model converters and their shared plumbing: shape naming,
//! auxiliary-shape bookkeeping, and the `sh:pattern` / IRI-stem bridge.

pub mod to_shacl;
pub mod to_shex;

pub use to_shacl::to_shacl;
pub use to_shex::to_shex;

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// The part of an IRI after its last `#`, `/` or `:`.
pub(crate) fn local_name(iri: &str) -> &str {
    match iri.rfind(['#', '/', ':']) {
        Some(i) => &iri[i + 1..],
        None => iri,
    }
}

/// The namespace part of an IRI: everything up to and including the
/// last `#`, `/` or `:`.
pub(crate) fn namespace_of(iri: &str) -> &str {
    match iri.rfind(['#', '/', ':']) {
        Some(i) => &iri[..=i],
        None => iri,
    }
}

/// Deterministic shape-name allocator. Same inputs claim the same
/// names; collisions append a numeric suffix.
#[derive(Debug, Default)]
pub(crate) struct NameAllocator {
    used: BTreeSet<String>,
}

impl NameAllocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claims `seed` itself when free, `seed1`, `seed2`, ... otherwise.
    pub(crate) fn claim(&mut self, seed: &str) -> String {
        if self.used.insert(seed.to_owned()) {
            return seed.to_owned();
        }
        self.claim_numbered(seed)
    }

    /// Always claims a numbered variant, starting at `seed1`.
    pub(crate) fn claim_numbered(&mut self, seed: &str) -> String {
        for n in 1.. {
            let candidate = format!("{seed}{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
        unreachable!("u32 space exhausted for shape names")
    }
}

/// Regex metacharacters a stem prefix may not contain unescaped. `.` is
/// deliberately absent: IRIs are full of literal dots and the patterns
/// this tool meets in the wild never escape them.
const STEM_META: &[char] = &[
    '\\', '$', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}', '^',
];

/// An absolute IRI: a scheme followed by non-whitespace.
static ABSOLUTE_IRI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:\S*$").expect("hard-coded pattern")
});

/// Recognizes `sh:pattern` values of the form `^<absolute IRI prefix>`
/// and returns the prefix. Backslash-escaped characters are unescaped;
/// any other regex metacharacter disqualifies the pattern.
pub(crate) fn pattern_to_stem(pattern: &str) -> Option<String> {
    let body = pattern.strip_prefix('^')?;
    let mut prefix = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            prefix.push(chars.next()?);
        } else if STEM_META.contains(&c) {
            return None;
        } else {
            prefix.push(c);
        }
    }
    ABSOLUTE_IRI.is_match(&prefix).then_some(prefix)
}

/// Prints an IRI stem back as an anchored `sh:pattern`, escaping exactly
/// the metacharacters [`pattern_to_stem`] rejects so the two functions
/// are inverses.
pub(crate) fn stem_to_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    pattern.push('^');
    for c in prefix.chars() {
        if STEM_META.contains(&c) {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern
}
