//! Bounded random selection of contestants and solution variants, plus path sanitizers.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use crate::classify::{Bucket, Contestant};
use crate::record::SourceRecord;

/// Shuffle the bucket once and keep at most `cap` contestants (`0` keeps all).
pub fn select_contestants<'a, R: Rng + ?Sized>(bucket: &'a Bucket, cap: usize, rng: &mut R) -> Vec<&'a Contestant> {
    let mut picked: Vec<&Contestant> = bucket.contestants().iter().collect();
    picked.shuffle(rng);
    if cap > 0 {
        picked.truncate(cap);
    }
    picked
}

/// Distinct raw solution tags in first-seen order.
pub fn variant_tags(files: &[SourceRecord]) -> Vec<&str> {
    let mut tags: Vec<&str> = Vec::new();
    for f in files {
        let t = f.variant_tag();
        if !tags.contains(&t) {
            tags.push(t);
        }
    }
    tags
}

/// Pick one solution variant uniformly and return only the files carrying it.
pub fn choose_variant<'a, R: Rng + ?Sized>(files: &'a [SourceRecord], rng: &mut R) -> Vec<&'a SourceRecord> {
    let tags = variant_tags(files);
    let Some(&chosen) = tags.choose(rng) else {
        return Vec::new();
    };
    files.iter().filter(|f| f.variant_tag() == chosen).collect()
}

/// Make an archive-supplied id safe to use as a single path component.
pub fn sanitize_component(id: &str) -> String {
    let s = id.replace('/', "__").replace('\\', "~~");
    match s.as_str() {
        "" | "." | ".." => format!("_{s}"),
        _ => s,
    }
}

/// Native-language file names: spaces become `-`, parentheses are dropped.
pub fn sanitize_native_filename(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}
