//! Per-bucket extraction onto the output tree:
//!   <root>/<task>/<language>-<size-class>/<contestant>/<size-tag>/<file>

use anyhow::Result;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::classify::{Bucket, BucketKey, Contestant};
use crate::concurrency::map_limited;
use crate::java::{JavaGate, Rejection, Verdict};
use crate::record::{Language, SizeClass, SourceRecord};
use crate::sampler::{choose_variant, sanitize_component, sanitize_native_filename, select_contestants};
use crate::util::{ensure_dir, write_file};

#[derive(Clone, Debug, Serialize)]
pub struct RejectedSubmission {
    pub contestant: String,
    pub files: Vec<String>,
    pub reason: String,
}

/// What happened to one bucket.
#[derive(Clone, Debug, Serialize)]
pub struct BucketReport {
    pub language: Language,
    pub size: SizeClass,
    pub contestants: usize,
    pub selected: usize,
    pub written: Vec<String>,
    pub rejected: Vec<RejectedSubmission>,
}

enum Outcome {
    Written { contestant: String },
    Rejected(RejectedSubmission),
    Skipped,
}

/// Static inputs shared by every worker of one bucket.
pub struct BucketJob<'a> {
    pub task_name: &'a str,
    pub key: &'a BucketKey,
    pub out_root: &'a Path,
    pub pick_random: usize,
    pub pool_size: usize,
    pub gate: &'a JavaGate,
}

pub fn task_dir(out_root: &Path, task_name: &str) -> PathBuf {
    out_root.join(sanitize_component(task_name))
}

pub fn bucket_dir(out_root: &Path, task_name: &str, language: Language, size: SizeClass) -> PathBuf {
    task_dir(out_root, task_name).join(format!("{}-{}", language.dir_name(), size.as_str()))
}

/// Sample the bucket and write every selected contestant that survives the gate.
///
/// The cap is applied before dispatch as a prefix of one shuffle, so it is exact with
/// respect to selection; rejected contestants are not replaced.
pub fn extract_bucket(
    job: &BucketJob<'_>,
    bucket: Option<&Bucket>,
    rng: &mut StdRng,
    pb: Option<&ProgressBar>,
) -> Result<BucketReport> {
    let dir = bucket_dir(job.out_root, job.task_name, job.key.language, job.key.size);
    ensure_dir(&dir)?;

    let mut report = BucketReport {
        language: job.key.language,
        size: job.key.size,
        contestants: bucket.map(Bucket::len).unwrap_or(0),
        selected: 0,
        written: Vec::new(),
        rejected: Vec::new(),
    };
    let Some(bucket) = bucket else {
        return Ok(report);
    };

    let selected = select_contestants(bucket, job.pick_random, rng);
    report.selected = selected.len();

    // one seed per contestant, drawn up front, keeps seeded runs independent of scheduling
    let work: Vec<(&Contestant, u64)> = selected.into_iter().map(|c| (c, rng.random::<u64>())).collect();

    let outcomes = map_limited(work, job.pool_size, |(contestant, seed)| {
        let out = extract_contestant(job, &dir, contestant, seed);
        if let Some(pb) = pb {
            pb.inc(1);
        }
        out
    })?;

    for o in outcomes {
        match o {
            Outcome::Written { contestant } => report.written.push(contestant),
            Outcome::Rejected(r) => report.rejected.push(r),
            Outcome::Skipped => {}
        }
    }
    report.written.sort();
    Ok(report)
}

fn extract_contestant(job: &BucketJob<'_>, dir: &Path, contestant: &Contestant, seed: u64) -> Result<Outcome> {
    let mut rng = StdRng::seed_from_u64(seed);
    let files = choose_variant(&contestant.files, &mut rng);
    if files.is_empty() {
        return Ok(Outcome::Skipped);
    }
    let target = dir.join(sanitize_component(&contestant.id));

    match job.key.language {
        Language::Java => {
            let sources = match job.gate.verify(&files, &mut rng)? {
                Verdict::Accepted(s) => s,
                Verdict::Rejected(rej) => return Ok(Outcome::Rejected(reject(job, contestant, &files, rej))),
            };
            for s in &sources {
                let size = SizeClass::from_tag(&s.tag);
                write_file(&target.join(size.as_str()).join(&s.file_name), &s.contents)?;
            }
        }
        Language::Native => {
            let mut wrote = 0usize;
            for f in &files {
                let name = sanitize_native_filename(&f.file);
                if name.is_empty() {
                    tracing::warn!("{} / {}: skipping a file without a name", job.task_name, contestant.id);
                    continue;
                }
                write_file(&target.join(f.size_class().as_str()).join(name), &f.flines)?;
                wrote += 1;
            }
            if wrote == 0 {
                return Ok(Outcome::Skipped);
            }
        }
    }
    Ok(Outcome::Written { contestant: contestant.id.clone() })
}

fn reject(job: &BucketJob<'_>, contestant: &Contestant, files: &[&SourceRecord], rej: Rejection) -> RejectedSubmission {
    let names: Vec<String> = files
        .iter()
        .map(|f| if f.full_path.is_empty() { f.file.clone() } else { f.full_path.clone() })
        .collect();
    tracing::warn!(
        "rejected {} [{}] for {} ({}-{}): {}",
        contestant.id,
        names.join(", "),
        job.task_name,
        job.key.language,
        job.key.size,
        rej
    );
    RejectedSubmission { contestant: contestant.id.clone(), files: names, reason: rej.to_string() }
}
