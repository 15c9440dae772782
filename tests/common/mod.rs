#![allow(dead_code)]

use gcj_sample::{SourceRecord, TaskKey, TaskRegistry};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const ROUND: &str = "6254486";
pub const TASK: &str = "5634697451274240";
pub const TASK_NAME: &str = "Revenge of the Pancakes";

/// Build one archive row. `path` goes to `full_path`; `file` stays empty (older-era layout).
pub fn rec(user: &str, path: &str, solution: &str, flines: &str) -> SourceRecord {
    SourceRecord {
        full_path: path.to_string(),
        file: String::new(),
        username: user.to_string(),
        flines: flines.to_string(),
        year: "2016".to_string(),
        task: TASK.to_string(),
        round: ROUND.to_string(),
        solution: solution.to_string(),
    }
}

/// Same as `rec` but for a different (round, task).
pub fn rec_for(round: &str, task: &str, user: &str, path: &str, solution: &str, flines: &str) -> SourceRecord {
    SourceRecord { round: round.to_string(), task: task.to_string(), ..rec(user, path, solution, flines) }
}

/// Registry holding only the task used by `rec`.
pub fn registry_one() -> TaskRegistry {
    let mut reg = TaskRegistry::new();
    reg.insert(TaskKey::new(ROUND, TASK), TASK_NAME).unwrap();
    reg
}

/// Write rows as an archive CSV (header included) and return its path.
pub fn write_csv(dir: &Path, name: &str, rows: &[SourceRecord]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let mut w = csv::Writer::from_path(&path).unwrap();
    for r in rows {
        w.serialize(r).unwrap();
    }
    w.flush().unwrap();
    path
}

/// Sorted names of the entries directly under `dir` (empty when `dir` is missing).
pub fn list_names(dir: &Path) -> Vec<String> {
    let mut v: Vec<String> = match fs::read_dir(dir) {
        Ok(rd) => rd.map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect(),
        Err(_) => Vec::new(),
    };
    v.sort();
    v
}

/// Every regular file below `dir`, as sorted paths relative to `dir`.
pub fn list_files_recursive(dir: &Path) -> Vec<String> {
    let mut out = Vec::new();
    for ent in walkdir::WalkDir::new(dir).min_depth(1) {
        let ent = ent.unwrap();
        if ent.file_type().is_file() {
            let rel = ent.path().strip_prefix(dir).unwrap();
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    out.sort();
    out
}

/// Write an executable shell script standing in for the compile checker.
#[cfg(unix)]
pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let mut f = File::create(&path).unwrap();
    writeln!(f, "#!/bin/sh").unwrap();
    f.write_all(body.as_bytes()).unwrap();
    drop(f);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Checker that fails when any passed file contains the word BROKEN.
#[cfg(unix)]
pub fn grep_compiler(dir: &Path) -> PathBuf {
    script(
        dir,
        "fake-javac.sh",
        "for f in \"$@\"; do\n  if grep -q BROKEN \"$f\"; then\n    echo \"error in $f\" >&2\n    exit 1\n  fi\ndone\nexit 0\n",
    )
}

pub const JAVA_OK: &str = "import java.util.*;\n\npublic class Solution {\n    public static void main(String[] args) {\n        Scanner in = new Scanner(System.in);\n        System.out.println(new Solution().hashCode() > 0);\n    }\n}\n";
