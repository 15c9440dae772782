//! Task registry: the hand-curated allow-list of known competition problems.

use ahash::AHashMap;
use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;

use crate::record::SourceRecord;

/// Composite (round, task) identifier of one competition problem.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskKey {
    pub round: String,
    pub task: String,
}

impl TaskKey {
    pub fn new(round: impl Into<String>, task: impl Into<String>) -> Self {
        Self { round: round.into().trim().to_string(), task: task.into().trim().to_string() }
    }

    pub fn of(record: &SourceRecord) -> Self {
        Self::new(record.round.as_str(), record.task.as_str())
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.round, self.task)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub key: TaskKey,
    pub name: String,
}

/// Ordered task table with a key index. Iteration follows insertion order.
#[derive(Clone, Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    index: AHashMap<TaskKey, usize>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. A key registered twice is a configuration error.
    pub fn insert(&mut self, key: TaskKey, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if let Some(&idx) = self.index.get(&key) {
            bail!(
                "task {} is registered twice (\"{}\" and \"{}\")",
                key,
                self.tasks[idx].name,
                name
            );
        }
        self.index.insert(key.clone(), self.tasks.len());
        self.tasks.push(Task { key, name });
        Ok(())
    }

    #[inline]
    pub fn contains(&self, key: &TaskKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The historical hard-coded table, used when no configuration file is given.
    pub fn builtin() -> Self {
        let entries: [(&str, &str, &str); 9] = [
            ("6254486", "5634697451274240", "2016 Qualification Round -- Revenge of the Pancakes"),
            ("4304486", "5631989306621952", "2016 Round 1A -- The Last Word"),
            ("6254486", "5652388522229760", "2016 Qualification Round -- Counting Sheep"),
            ("4314486", "5753053697277952", "2016 Round 1C -- Senate Evacuation"),
            ("3224486", "5125089213284352", "2016 Round 3 -- Forest University"),
            ("7234486", "5751639981948928", "2016 Finals -- Family Hotel"),
            ("000000000019fd74", "00000000002b1353", "2020 Round 1A -- Pattern Matching"),
            ("0000000000051705", "00000000000881da", "2019 Qualification Round -- You Can Go Your Own Way"),
            ("000000000019fd27", "000000000020993c", "2020 Qualification Round -- Vestigium (only one problem set)"),
        ];
        let mut reg = Self::new();
        for (round, task, name) in entries {
            // keys above are distinct
            let key = TaskKey::new(round, task);
            reg.index.insert(key.clone(), reg.tasks.len());
            reg.tasks.push(Task { key, name: name.to_string() });
        }
        reg
    }
}
