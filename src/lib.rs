mod config;
mod record;
mod registry;
mod input;

mod classify;
mod java;
mod sampler;
mod extract;

mod concurrency;
mod progress;
mod util;
mod pipeline;

pub use crate::config::{load as load_config, ConfigFile, IdValue, ProblemEntry, SampleOptions};
pub use crate::record::{Language, SizeClass, SourceRecord};
pub use crate::registry::{Task, TaskKey, TaskRegistry};
pub use crate::pipeline::{GcjSampler, RunSummary, TaskReport};

// Loader helpers (CSV, NUL stripping, directory expansion).
pub use crate::input::{expand_inputs, load_csv, read_records, NulStripReader};

// Classification and bucket accumulation.
pub use crate::classify::{classify, Assignment, Bucket, BucketKey, Buckets, Contestant};

// Java compile gate.
pub use crate::java::{
    anonymize, declared_classes, generate_class_name, mask_comments_and_literals, rewrite_identifiers,
    Anonymized, CompileCheck, Declared, JavaGate, JavaSource, Rejection, Verdict, GENERATED_NAME_LEN,
};

// Sampling and path sanitizers.
pub use crate::sampler::{choose_variant, sanitize_component, sanitize_native_filename, select_contestants, variant_tags};

// Extraction sink layout and per-bucket reports.
pub use crate::extract::{bucket_dir, task_dir, BucketReport, RejectedSubmission};

pub use crate::util::init_tracing_once;
