use crate::classify::{BucketKey, Buckets};
use crate::config::SampleOptions;
use crate::extract::{extract_bucket, task_dir, BucketJob, BucketReport};
use crate::input::{expand_inputs, load_all, total_input_size};
use crate::java::JavaGate;
use crate::progress::{make_count_progress, make_progress_bar_labeled};
use crate::record::{Language, SizeClass, SourceRecord};
use crate::registry::{Task, TaskKey, TaskRegistry};
use crate::util::{ensure_dir, init_tracing_once};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pipeline driver: load -> classify -> per task, report then extract every bucket.
#[derive(Clone)]
pub struct GcjSampler {
    pub(crate) registry: TaskRegistry,
    pub(crate) opts: SampleOptions,
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskReport {
    pub name: String,
    pub key: TaskKey,
    pub buckets: Vec<BucketReport>,
}

impl TaskReport {
    pub fn bucket(&self, language: Language, size: SizeClass) -> Option<&BucketReport> {
        self.buckets.iter().find(|b| b.language == language && b.size == size)
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    pub records_loaded: usize,
    pub records_bucketed: usize,
    pub tasks: Vec<TaskReport>,
}

impl RunSummary {
    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

impl GcjSampler {
    pub fn new(registry: TaskRegistry) -> Self {
        Self { registry, opts: SampleOptions::default() }
    }

    pub fn with_options(registry: TaskRegistry, opts: SampleOptions) -> Self {
        Self { registry, opts }
    }

    // -------- Builder methods --------
    pub fn output_root(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_output_root(dir); self }
    pub fn pick_random(mut self, n: usize) -> Self { self.opts = self.opts.with_pick_random(n); self }
    pub fn do_compile(mut self, yes: bool) -> Self { self.opts = self.opts.with_do_compile(yes); self }
    pub fn pool_size(mut self, n: usize) -> Self { self.opts = self.opts.with_pool_size(n); self }
    pub fn compile_command<I, S>(mut self, argv: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_compile_command(argv); self }
    pub fn compile_timeout(mut self, t: Duration) -> Self { self.opts = self.opts.with_compile_timeout(t); self }
    pub fn seed(mut self, seed: u64) -> Self { self.opts = self.opts.with_seed(Some(seed)); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }

    pub fn options(&self) -> &SampleOptions {
        &self.opts
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Load every input (files or directories of CSVs) in argument order.
    pub fn load(&self, inputs: &[PathBuf]) -> Result<Vec<SourceRecord>> {
        init_tracing_once();
        let files = expand_inputs(inputs)?;
        for f in &files {
            println!("loading {}", f.display());
        }
        let pb = if self.opts.progress {
            Some(make_progress_bar_labeled(total_input_size(&files), Some("Loading")))
        } else {
            None
        };
        let records = load_all(&files, self.opts.read_buffer_bytes, pb.clone())?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        println!("loaded {} entries", records.len());
        Ok(records)
    }

    /// Full run over the given inputs.
    pub fn run(&self, inputs: &[PathBuf]) -> Result<RunSummary> {
        let records = self.load(inputs)?;
        self.run_records(records)
    }

    /// Classify already-loaded records and extract every bucket.
    pub fn run_records(&self, records: Vec<SourceRecord>) -> Result<RunSummary> {
        init_tracing_once();
        let loaded = records.len();
        let buckets = Buckets::build(&self.registry, records);
        tracing::info!("bucketed {} of {} records ({} dropped)", buckets.accepted(), loaded, buckets.dropped());

        let mut rng = match self.opts.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        let gate = JavaGate::from_options(&self.opts);
        ensure_dir(&self.opts.output_root)?;

        let mut summary = RunSummary { records_loaded: loaded, records_bucketed: buckets.accepted(), tasks: Vec::new() };
        for task in self.registry.iter() {
            report_task(task, &buckets);
            summary.tasks.push(self.extract_task(task, &buckets, &gate, &mut rng)?);
        }
        Ok(summary)
    }

    fn extract_task(&self, task: &Task, buckets: &Buckets, gate: &JavaGate, rng: &mut StdRng) -> Result<TaskReport> {
        ensure_dir(&task_dir(&self.opts.output_root, &task.name))?;
        let mut reports = Vec::with_capacity(Language::ALL.len() * SizeClass::ALL.len());
        for language in Language::ALL {
            for size in SizeClass::ALL {
                let key = BucketKey { task: task.key.clone(), language, size };
                let bucket = buckets.get(&key);
                let job = BucketJob {
                    task_name: &task.name,
                    key: &key,
                    out_root: &self.opts.output_root,
                    pick_random: self.opts.pick_random,
                    pool_size: self.opts.pool_size,
                    gate,
                };
                let pb = match bucket {
                    Some(b) if self.opts.progress && !b.is_empty() => {
                        let expected = if self.opts.pick_random > 0 { b.len().min(self.opts.pick_random) } else { b.len() };
                        Some(make_count_progress(expected as u64, &format!("{language}-{size}")))
                    }
                    _ => None,
                };
                let report = extract_bucket(&job, bucket, rng, pb.as_ref())?;
                if let Some(pb) = pb {
                    pb.finish_and_clear();
                }
                if !report.rejected.is_empty() {
                    println!(
                        "    - [{language}-{size}] wrote {} / rejected {} users",
                        report.written.len(),
                        report.rejected.len()
                    );
                }
                reports.push(report);
            }
        }
        Ok(TaskReport { name: task.name.clone(), key: task.key.clone(), buckets: reports })
    }
}

/// Per-task progress lines (contestant counts before sampling).
fn report_task(task: &Task, buckets: &Buckets) {
    println!("  * {}", task.name);
    for (language, pad) in [(Language::Java, ""), (Language::Native, "   ")] {
        let n = |size| buckets.contestant_count(&task.key, language, size);
        println!(
            "    - [{language}]{pad} {} / {} / {} users  (small / large / other)",
            n(SizeClass::Small),
            n(SizeClass::Large),
            n(SizeClass::Other)
        );
    }
}
