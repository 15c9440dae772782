//! Classifier: routes each known record to one (task, language, size-class) bucket.

use ahash::AHashMap;
use serde::Serialize;

use crate::record::{Language, SizeClass, SourceRecord};
use crate::registry::{TaskKey, TaskRegistry};

pub const NATIVE_EXTENSIONS: [&str; 4] = [".c", ".cpp", ".h", ".hpp"];
pub const JAVA_EXTENSIONS: [&str; 1] = [".java"];

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BucketKey {
    pub task: TaskKey,
    pub language: Language,
    pub size: SizeClass,
}

/// Result of classifying one record. The record may carry a normalized `file` field.
#[derive(Clone, Debug)]
pub struct Assignment {
    pub key: BucketKey,
    pub record: SourceRecord,
}

/// Decide the bucket for `record`, or `None` when it is filtered out.
///
/// The native-language test runs first and is exclusive: a record matching both
/// extension sets is never routed to Java. Accepted native records have `file`
/// rewritten to their base name so extraction sees a uniform field.
pub fn classify(registry: &TaskRegistry, record: SourceRecord) -> Option<Assignment> {
    let task = TaskKey::of(&record);
    if !registry.contains(&task) {
        return None;
    }
    let size = record.size_class();

    if record.has_extension(&NATIVE_EXTENSIONS) {
        let mut record = record;
        record.file = record.base_name();
        return Some(Assignment { key: BucketKey { task, language: Language::Native, size }, record });
    }
    if record.has_extension(&JAVA_EXTENSIONS) {
        return Some(Assignment { key: BucketKey { task, language: Language::Java, size }, record });
    }
    None
}

/// One contestant's files inside a bucket, in archive order.
#[derive(Clone, Debug)]
pub struct Contestant {
    pub id: String,
    pub files: Vec<SourceRecord>,
}

/// Contestant id -> files, keeping first-seen contestant order so that a seeded
/// shuffle is reproducible.
#[derive(Clone, Debug, Default)]
pub struct Bucket {
    index: AHashMap<String, usize>,
    entries: Vec<Contestant>,
}

impl Bucket {
    pub fn push(&mut self, record: SourceRecord) {
        match self.index.get(&record.username) {
            Some(&i) => self.entries[i].files.push(record),
            None => {
                self.index.insert(record.username.clone(), self.entries.len());
                self.entries.push(Contestant { id: record.username.clone(), files: vec![record] });
            }
        }
    }

    pub fn get(&self, contestant: &str) -> Option<&Contestant> {
        self.index.get(contestant).map(|&i| &self.entries[i])
    }

    pub fn contestants(&self) -> &[Contestant] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All buckets built during classification. Read-only once built.
#[derive(Debug, Default)]
pub struct Buckets {
    map: AHashMap<BucketKey, Bucket>,
    accepted: usize,
    dropped: usize,
}

impl Buckets {
    pub fn build(registry: &TaskRegistry, records: impl IntoIterator<Item = SourceRecord>) -> Self {
        let mut out = Self::default();
        for rec in records {
            match classify(registry, rec) {
                Some(a) => {
                    out.map.entry(a.key).or_default().push(a.record);
                    out.accepted += 1;
                }
                None => out.dropped += 1,
            }
        }
        out
    }

    pub fn get(&self, key: &BucketKey) -> Option<&Bucket> {
        self.map.get(key)
    }

    /// Number of contestants in a bucket (0 when the bucket was never filled).
    pub fn contestant_count(&self, task: &TaskKey, language: Language, size: SizeClass) -> usize {
        let key = BucketKey { task: task.clone(), language, size };
        self.map.get(&key).map(Bucket::len).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &Bucket)> {
        self.map.iter()
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
