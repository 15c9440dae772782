#[path = "common/mod.rs"]
mod common;

use common::*;
use gcj_sample::{expand_inputs, load_config, load_csv, read_records, ConfigFile, GcjSampler, TaskKey, TaskRegistry};
use std::fs;
use std::io::Write;
use std::time::Duration;

const CONFIG: &str = r#"
problems:
  "2016 Qualification Round -- Revenge of the Pancakes":
    round: 6254486
    task: 5634697451274240
  "2020 Round 1A -- Pattern Matching":
    round: "000000000019fd74"
    task: "00000000002b1353"
pick-random: 3
do-compile: true
multithreading-poolsize: 2
compile-command: ["javac", "-J-Xmx256m"]
compile-timeout-secs: 15
"#;

/// Problems keep document order; integer and string ids both become TaskKeys.
#[test]
fn config_document_builds_registry_and_options() {
    let doc = ConfigFile::parse(CONFIG).unwrap();
    let reg = doc.registry().unwrap();
    let names: Vec<&str> = reg.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["2016 Qualification Round -- Revenge of the Pancakes", "2020 Round 1A -- Pattern Matching"]
    );
    assert!(reg.contains(&TaskKey::new("6254486", "5634697451274240")));
    assert!(reg.contains(&TaskKey::new("000000000019fd74", "00000000002b1353")));

    let opts = doc.apply(Default::default()).unwrap();
    assert_eq!(opts.pick_random, 3);
    assert!(opts.do_compile);
    assert_eq!(opts.pool_size, 2);
    assert_eq!(opts.compile_command, vec!["javac", "-J-Xmx256m"]);
    assert_eq!(opts.compile_timeout, Duration::from_secs(15));
}

#[test]
fn config_from_file_and_builtin_fallback() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yml");
    fs::write(&path, CONFIG).unwrap();

    let (reg, opts) = load_config(Some(&path)).unwrap();
    assert_eq!(reg.len(), 2);
    assert_eq!(opts.pick_random, 3);

    let (builtin, defaults) = load_config(None).unwrap();
    assert_eq!(builtin.len(), TaskRegistry::builtin().len());
    assert!(builtin.contains(&TaskKey::new("0000000000051705", "00000000000881da")));
    assert_eq!(defaults.pick_random, 0);
    assert!(!defaults.do_compile);
}

/// Malformed documents are fatal: missing `problems`, unknown keys, duplicate tasks.
#[test]
fn malformed_config_is_rejected() {
    assert!(ConfigFile::parse("pick-random: 2\n").is_err());
    assert!(ConfigFile::parse("problems: {}\npick-randmo: 2\n").is_err());

    let dup = r#"
problems:
  A: { round: 1, task: 2 }
  B: { round: "1", task: "2" }
"#;
    let doc = ConfigFile::parse(dup).unwrap();
    let err = doc.registry().unwrap_err().to_string();
    assert!(err.contains("registered twice"), "{err}");

    let missing_task = "problems:\n  A: { round: 1 }\n";
    assert!(ConfigFile::parse(missing_task).unwrap().registry().is_err());
}

/// An unquoted zero-padded id would silently become a different number; it is refused.
#[test]
fn unquoted_zero_padded_ids_are_rejected() {
    let flow = "problems:\n  A: { round: 0000000000051705, task: \"00000000000881da\" }\n";
    let err = ConfigFile::parse(flow).unwrap_err().to_string();
    assert!(err.contains("0000000000051705") && err.contains("quote"), "{err}");

    let block = "problems:\n  A:\n    round: \"0000000000051705\"\n    task: 0000000000088188 # padded\n";
    let err = ConfigFile::parse(block).unwrap_err().to_string();
    assert!(err.contains("line 4"), "{err}");

    // plain integers and quoted padded ids are fine
    let ok = "problems:\n  A: { round: 6254486, task: \"0000000000088188\" }\n  B: { round: 0, task: 10 }\n";
    assert_eq!(ConfigFile::parse(ok).unwrap().registry().unwrap().len(), 2);
}

/// Embedded NUL bytes are stripped before parsing, including inside quoted content.
#[test]
fn loader_strips_nul_bytes() {
    let data = b"file,flines,full_path,round,solution,task,username,year\n\
a.c,\"int\0 main(){}\n// line two\",x/a.c,1,0,2,al\0ice,2016\n";
    let recs = read_records(&data[..]).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].username, "alice");
    assert_eq!(recs[0].flines, "int main(){}\n// line two");
    assert_eq!(recs[0].full_path, "x/a.c");
}

/// Rows missing a required column fail loudly instead of being coerced.
#[test]
fn loader_rejects_malformed_rows() {
    let no_username = b"file,flines,full_path,round,solution,task,year\na.c,x,a.c,1,0,2,2016\n";
    assert!(read_records(&no_username[..]).is_err());

    let ragged = b"file,flines,full_path,round,solution,task,username,year\na.c,x,a.c,1,0\n";
    assert!(read_records(&ragged[..]).is_err());

    // `year` is optional
    let no_year = b"file,flines,full_path,round,solution,task,username\na.c,x,,1,0,2,u\n";
    assert_eq!(read_records(&no_year[..]).unwrap().len(), 1);
}

#[test]
fn loader_reads_zstd_inputs() {
    let tmp = tempfile::tempdir().unwrap();
    let plain = write_csv(tmp.path(), "plain.csv", &[rec("alice", "a.c", "0", "x"), rec("bob", "B.java", "1", "class B {}")]);
    let zst = tmp.path().join("packed.csv.zst");
    {
        let f = fs::File::create(&zst).unwrap();
        let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
        enc.write_all(&fs::read(&plain).unwrap()).unwrap();
        enc.finish().unwrap();
    }
    let a = load_csv(&plain, 8 * 1024, None).unwrap();
    let b = load_csv(&zst, 8 * 1024, None).unwrap();
    assert_eq!(a, b);
    assert_eq!(b.len(), 2);
}

/// Directory inputs expand to their CSV files in path order; files are kept as given.
#[test]
fn directory_inputs_are_expanded() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("exports");
    write_csv(&dir, "b.csv", &[rec("bob", "b.c", "0", "b")]);
    write_csv(&dir.join("nested"), "a.csv", &[rec("alice", "a.c", "0", "a")]);
    fs::write(dir.join("README.txt"), "not an input").unwrap();
    let single = write_csv(tmp.path(), "single.csv", &[rec("carol", "c.c", "0", "c")]);

    let files = expand_inputs(&[single.clone(), dir.clone()]).unwrap();
    assert_eq!(files, vec![single.clone(), dir.join("b.csv"), dir.join("nested").join("a.csv")]);

    let out = tmp.path().join("out");
    let summary = GcjSampler::new(registry_one())
        .output_root(&out)
        .progress(false)
        .run(&[single, dir])
        .unwrap();
    assert_eq!(summary.records_loaded, 3);
    assert_eq!(list_names(&out.join(TASK_NAME).join("c-small")), vec!["alice", "bob", "carol"]);
}

/// A missing input file is fatal.
#[test]
fn unreadable_input_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let res = GcjSampler::new(registry_one())
        .output_root(tmp.path().join("out"))
        .progress(false)
        .run(&[tmp.path().join("nope.csv")]);
    assert!(res.is_err());
}
