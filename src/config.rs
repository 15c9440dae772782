use crate::registry::{TaskKey, TaskRegistry};
use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct SampleOptions {
    pub output_root: PathBuf,
    pub pick_random: usize,             // contestants per bucket; 0 = all
    pub do_compile: bool,               // run the compile-check subprocess for Java
    pub pool_size: usize,               // workers per bucket
    pub compile_command: Vec<String>,   // argv prefix; file paths are appended
    pub compile_timeout: Duration,
    pub seed: Option<u64>,              // Some(n) for reproducible sampling
    pub progress: bool,

    // IO tuning
    pub read_buffer_bytes: usize,
}

impl Default for SampleOptions {
    fn default() -> Self {
        let hw = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        Self {
            output_root: PathBuf::from("gcj"),
            pick_random: 0,
            do_compile: false,
            pool_size: hw,
            compile_command: default_compile_command(),
            compile_timeout: Duration::from_secs(60),
            seed: None,
            progress: true,
            read_buffer_bytes: 256 * 1024,
        }
    }
}

fn default_compile_command() -> Vec<String> {
    vec!["javac".to_string(), "-nowarn".to_string()]
}

impl SampleOptions {
    pub fn with_output_root(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_root = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_pick_random(mut self, n: usize) -> Self {
        self.pick_random = n;
        self
    }
    pub fn with_do_compile(mut self, yes: bool) -> Self {
        self.do_compile = yes;
        self
    }
    pub fn with_pool_size(mut self, n: usize) -> Self {
        self.pool_size = n.max(1);
        self
    }
    pub fn with_compile_command<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compile_command = argv.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_compile_timeout(mut self, timeout: Duration) -> Self {
        self.compile_timeout = timeout;
        self
    }
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
}

/// Round/task identifiers appear as integers in old eras and hex strings in new ones.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Int(u64),
    Str(String),
}

impl fmt::Display for IdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdValue::Int(n) => write!(f, "{n}"),
            IdValue::Str(s) => f.write_str(s.trim()),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemEntry {
    pub round: IdValue,
    pub task: IdValue,
}

fn zero_padded_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)\b(round|task)\s*:\s*(0[0-9]+)\s*(?:[,}#]|$)").unwrap())
}

/// YAML reads an unquoted `0000000000051705` as the integer 51705, which never
/// matches the archive's zero-padded id. Refuse such documents up front.
fn reject_zero_padded_ids(text: &str) -> Result<()> {
    if let Some(caps) = zero_padded_id_re().captures(text) {
        let line = text[..caps.get(0).map_or(0, |m| m.start())].matches('\n').count() + 1;
        bail!(
            "line {line}: {} id {} has leading zeros and would be read as a number; quote it (\"{}\")",
            &caps[1],
            &caps[2],
            &caps[2]
        );
    }
    Ok(())
}

/// On-disk YAML configuration document.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    /// Kept as a raw mapping so that task order follows the document.
    pub problems: serde_yaml::Mapping,
    #[serde(default)]
    pub pick_random: Option<usize>,
    #[serde(default)]
    pub do_compile: Option<bool>,
    #[serde(default)]
    pub multithreading_poolsize: Option<usize>,
    #[serde(default)]
    pub compile_command: Option<Vec<String>>,
    #[serde(default)]
    pub compile_timeout_secs: Option<u64>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ConfigFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("open config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        reject_zero_padded_ids(s)?;
        Ok(serde_yaml::from_str(s)?)
    }

    /// Build the task registry in document order.
    pub fn registry(&self) -> Result<TaskRegistry> {
        let mut reg = TaskRegistry::new();
        for (name, entry) in &self.problems {
            let name = name
                .as_str()
                .ok_or_else(|| anyhow!("problem names must be strings, got {:?}", name))?;
            let entry: ProblemEntry = serde_yaml::from_value(entry.clone())
                .with_context(|| format!("problem \"{name}\""))?;
            reg.insert(TaskKey::new(entry.round.to_string(), entry.task.to_string()), name)?;
        }
        Ok(reg)
    }

    /// Apply the document's settings on top of `base`.
    pub fn apply(&self, base: SampleOptions) -> Result<SampleOptions> {
        let mut opts = base;
        if let Some(n) = self.pick_random {
            opts = opts.with_pick_random(n);
        }
        if let Some(yes) = self.do_compile {
            opts = opts.with_do_compile(yes);
        }
        if let Some(n) = self.multithreading_poolsize {
            opts = opts.with_pool_size(n);
        }
        if let Some(argv) = &self.compile_command {
            if argv.is_empty() {
                return Err(anyhow!("compile-command must name an executable"));
            }
            opts = opts.with_compile_command(argv.iter().cloned());
        }
        if let Some(secs) = self.compile_timeout_secs {
            opts = opts.with_compile_timeout(Duration::from_secs(secs.max(1)));
        }
        if let Some(dir) = &self.output {
            opts = opts.with_output_root(dir);
        }
        if self.seed.is_some() {
            opts = opts.with_seed(self.seed);
        }
        Ok(opts)
    }
}

/// Load registry + options from a YAML file, or fall back to the built-in table.
pub fn load(path: Option<&Path>) -> Result<(TaskRegistry, SampleOptions)> {
    match path {
        Some(p) => {
            let doc = ConfigFile::from_path(p)?;
            let registry = doc.registry()?;
            if registry.is_empty() {
                tracing::warn!("config {} lists no problems; nothing will be extracted", p.display());
            }
            let opts = doc.apply(SampleOptions::default())?;
            Ok((registry, opts))
        }
        None => Ok((TaskRegistry::builtin(), SampleOptions::default())),
    }
}
