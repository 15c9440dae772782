//! Java compile gate: anonymizing class rewrite plus an optional external compile check.
//!
//! Class detection is lexical and best-effort: comments and literals are masked,
//! then `class <Identifier>` tokens are collected. There is no parser behind it.

use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::{Captures, Regex};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::thread::sleep;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::SampleOptions;
use crate::record::SourceRecord;

/// Length of generated class names (first char uppercase, then letters and digits).
pub const GENERATED_NAME_LEN: usize = 16;

/// Why a contestant's Java submission was not accepted. Never fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no class declaration found in {file}")]
    InvalidClassDeclaration { file: String },
    #[error("compiler exited with {status}")]
    CompileFailed { status: String },
    #[error("compiler did not finish within {after:?}")]
    TimedOut { after: Duration },
    #[error("compiler could not be started: {reason}")]
    Launch { reason: String },
}

/// Rewritten working copy of one submitted file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JavaSource {
    /// Generated name bound to the file's canonical class.
    pub class_name: String,
    /// `<class_name>.java`
    pub file_name: String,
    pub contents: String,
    /// Raw solution tag of the original record.
    pub tag: String,
}

/// Result of the rewrite step: new sources plus the original -> generated class map.
#[derive(Clone, Debug)]
pub struct Anonymized {
    pub sources: Vec<JavaSource>,
    pub renames: AHashMap<String, String>,
}

#[derive(Debug)]
pub enum Verdict {
    Accepted(Vec<JavaSource>),
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// A class declaration found in source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declared {
    pub name: String,
    pub public: bool,
}

fn class_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:^|[^\p{L}\p{N}_$.])(public\s+)?(?:(?:abstract|final|static|strictfp|sealed|non-sealed)\s+)*class\s+([\p{L}_$][\p{L}\p{N}_$]*)",
        )
        .unwrap()
    })
}

fn ident_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}_$]+").unwrap())
}

/// Replace comments, string/char literals and text blocks with spaces (newlines kept).
pub fn mask_comments_and_literals(src: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum St { Code, Line, Block, Str, Chr, TextBlock }

    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut st = St::Code;
    let mut i = 0;
    let blank = |c: char| if c == '\n' { '\n' } else { ' ' };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match st {
            St::Code => {
                if c == '/' && next == Some('/') {
                    st = St::Line;
                    out.push_str("  ");
                    i += 2;
                    continue;
                }
                if c == '/' && next == Some('*') {
                    st = St::Block;
                    out.push_str("  ");
                    i += 2;
                    continue;
                }
                if c == '"' && next == Some('"') && chars.get(i + 2) == Some(&'"') {
                    st = St::TextBlock;
                    out.push_str("   ");
                    i += 3;
                    continue;
                }
                if c == '"' {
                    st = St::Str;
                    out.push(' ');
                } else if c == '\'' {
                    st = St::Chr;
                    out.push(' ');
                } else {
                    out.push(c);
                }
            }
            St::Line => {
                if c == '\n' {
                    st = St::Code;
                }
                out.push(blank(c));
            }
            St::Block => {
                if c == '*' && next == Some('/') {
                    st = St::Code;
                    out.push_str("  ");
                    i += 2;
                    continue;
                }
                out.push(blank(c));
            }
            St::TextBlock => {
                if c == '"' && next == Some('"') && chars.get(i + 2) == Some(&'"') {
                    st = St::Code;
                    out.push_str("   ");
                    i += 3;
                    continue;
                }
                if c == '\\' && next.is_some() {
                    out.push(' ');
                    out.push(blank(chars[i + 1]));
                    i += 2;
                    continue;
                }
                out.push(blank(c));
            }
            St::Str | St::Chr => {
                let close = if st == St::Str { '"' } else { '\'' };
                if c == '\\' && next.is_some() {
                    out.push_str("  ");
                    i += 2;
                    continue;
                }
                // unterminated literal ends at the line break
                if c == close || c == '\n' {
                    st = St::Code;
                }
                out.push(blank(c));
            }
        }
        i += 1;
    }
    out
}

/// All class declarations in source order.
pub fn declared_classes(src: &str) -> Vec<Declared> {
    let masked = mask_comments_and_literals(src);
    class_decl_re()
        .captures_iter(&masked)
        .map(|caps| Declared { name: caps[2].to_string(), public: caps.get(1).is_some() })
        .collect()
}

/// A fresh class name: uppercase ASCII letter followed by ASCII letters and digits.
pub fn generate_class_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut s = String::with_capacity(GENERATED_NAME_LEN);
    s.push(rng.random_range(b'A'..=b'Z') as char);
    s.extend((1..GENERATED_NAME_LEN).map(|_| rng.sample(Alphanumeric) as char));
    s
}

/// Replace every whole-identifier occurrence of a key in `renames`.
/// `Foo` inside `FooBar` or `my_Foo` is left alone.
pub fn rewrite_identifiers(src: &str, renames: &AHashMap<String, String>) -> String {
    ident_token_re()
        .replace_all(src, |caps: &Captures| match renames.get(&caps[0]) {
            Some(new) => new.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Rename every declared class across the submission and rewrite all files consistently.
///
/// Each file is named after its first public class, or its first class when none is public,
/// and every file gets a name of its own. A class declared again by a later file (two
/// attempts at `Main`, say) is renamed separately inside that file, while references from
/// files that do not declare it resolve to the first declaration.
/// A file without any class declaration rejects the whole submission.
pub fn anonymize<R: Rng + ?Sized>(files: &[&SourceRecord], rng: &mut R) -> std::result::Result<Anonymized, Rejection> {
    let mut used: AHashSet<String> = AHashSet::new();
    let mut fresh = |rng: &mut R| loop {
        let name = generate_class_name(rng);
        if used.insert(name.clone()) {
            break name;
        }
    };

    let mut renames: AHashMap<String, String> = AHashMap::new();
    let mut per_file: Vec<(String, AHashMap<String, String>)> = Vec::with_capacity(files.len());

    for rec in files {
        let decls = declared_classes(&rec.flines);
        let primary = decls
            .iter()
            .find(|d| d.public)
            .or_else(|| decls.first())
            .ok_or_else(|| Rejection::InvalidClassDeclaration { file: display_name(rec) })?;
        let mut local: AHashMap<String, String> = AHashMap::new();
        for d in &decls {
            if local.contains_key(&d.name) {
                continue;
            }
            let n = fresh(&mut *rng);
            renames.entry(d.name.clone()).or_insert_with(|| n.clone());
            local.insert(d.name.clone(), n);
        }
        per_file.push((local[&primary.name].clone(), local));
    }

    let sources = files
        .iter()
        .zip(per_file)
        .map(|(rec, (class_name, local))| {
            let mut map = renames.clone();
            map.extend(local);
            JavaSource {
                file_name: format!("{class_name}.java"),
                class_name,
                contents: rewrite_identifiers(&rec.flines, &map),
                tag: rec.variant_tag().to_string(),
            }
        })
        .collect();

    Ok(Anonymized { sources, renames })
}

fn display_name(rec: &SourceRecord) -> String {
    if rec.full_path.is_empty() { rec.file.clone() } else { rec.full_path.clone() }
}

/// External compile-check collaborator: `command[0] command[1..] <file>...`.
#[derive(Clone, Debug)]
pub struct CompileCheck {
    pub command: Vec<String>,
    pub timeout: Duration,
}

impl CompileCheck {
    /// Write `sources` to a fresh temporary directory and run the checker on them.
    /// Launch failures, non-zero exits and timeouts are rejections; workspace I/O errors are fatal.
    pub fn run(&self, sources: &[JavaSource]) -> Result<Option<Rejection>> {
        let workspace = tempfile::Builder::new()
            .prefix("gcj-compile-")
            .tempdir()
            .context("create compile workspace")?;

        let mut paths: Vec<PathBuf> = Vec::with_capacity(sources.len());
        for s in sources {
            let p = workspace.path().join(&s.file_name);
            fs::write(&p, &s.contents).with_context(|| format!("write {}", p.display()))?;
            paths.push(p);
        }

        let Some((program, args)) = self.command.split_first() else {
            return Ok(Some(Rejection::Launch { reason: "empty compile command".to_string() }));
        };
        let mut child = match Command::new(program)
            .args(args)
            .args(&paths)
            .current_dir(workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
        {
            Ok(c) => c,
            Err(e) => return Ok(Some(Rejection::Launch { reason: format!("{program}: {e}") })),
        };

        match wait_with_timeout(&mut child, self.timeout)? {
            Some(status) if status.success() => Ok(None),
            Some(status) => Ok(Some(Rejection::CompileFailed { status: status.to_string() })),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Ok(Some(Rejection::TimedOut { after: self.timeout }))
            }
        }
        // workspace is removed on drop
    }
}

/// Poll `child` until it exits or `timeout` elapses (`None`).
fn wait_with_timeout(child: &mut std::process::Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    let mut i = 0u64;
    loop {
        if let Some(status) = child.try_wait().context("wait for compiler")? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        i += 1;
        let step = Duration::from_millis((5 * i).min(100));
        sleep(step.min(deadline - now));
    }
}

/// The gate applied to one contestant's Java files for one bucket.
#[derive(Clone, Debug, Default)]
pub struct JavaGate {
    check: Option<CompileCheck>,
}

impl JavaGate {
    /// Rewrite only; every submission with a class declaration passes.
    pub fn rewrite_only() -> Self {
        Self { check: None }
    }

    pub fn with_check(check: CompileCheck) -> Self {
        Self { check: Some(check) }
    }

    pub fn from_options(opts: &SampleOptions) -> Self {
        if opts.do_compile {
            Self::with_check(CompileCheck { command: opts.compile_command.clone(), timeout: opts.compile_timeout })
        } else {
            Self::rewrite_only()
        }
    }

    pub fn compiles(&self) -> bool {
        self.check.is_some()
    }

    /// Anonymize `files` as one compilation unit and, when enabled, compile-check them.
    pub fn verify<R: Rng + ?Sized>(&self, files: &[&SourceRecord], rng: &mut R) -> Result<Verdict> {
        let anon = match anonymize(files, rng) {
            Ok(a) => a,
            Err(rej) => return Ok(Verdict::Rejected(rej)),
        };
        if let Some(check) = &self.check {
            if let Some(rej) = check.run(&anon.sources)? {
                return Ok(Verdict::Rejected(rej));
            }
        }
        Ok(Verdict::Accepted(anon.sources))
    }
}
