//! Enumeration of the modules loaded into the process.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Supplies the list of loaded modules (paths or identifiers).
pub trait ModuleSource: fmt::Debug + Send {
    fn loaded_modules(&self) -> Vec<String>;
}

/// A fixed list of modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticModules(Vec<String>);

impl StaticModules {
    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(modules.into_iter().map(Into::into).collect())
    }
}

impl ModuleSource for StaticModules {
    fn loaded_modules(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// File-backed mappings of the running process.
///
/// On Linux this is every distinct path in `/proc/self/maps`, in the order it
/// first appears (the executable comes first, then shared objects). Elsewhere
/// only the current executable is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappedModules;

impl ModuleSource for MappedModules {
    fn loaded_modules(&self) -> Vec<String> {
        #[cfg(target_os = "linux")]
        {
            match std::fs::read_to_string("/proc/self/maps") {
                Ok(maps) => return mapped_paths(&maps),
                Err(err) => {
                    tracing::warn!(target: "probe::modules", error = %err, "cannot read /proc/self/maps");
                }
            }
        }

        current_exe()
    }
}

fn current_exe() -> Vec<String> {
    match std::env::current_exe() {
        Ok(path) => vec![path.display().to_string()],
        Err(err) => {
            tracing::warn!(target: "probe::modules", error = %err, "cannot resolve current executable");
            Vec::new()
        }
    }
}

/// Distinct file paths from a `/proc/<pid>/maps` listing.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn mapped_paths(maps: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    maps.lines()
        .filter_map(|line| {
            // address perms offset dev inode pathname
            let path = line.splitn(6, ' ').nth(5)?.trim_start();
            path.starts_with('/').then_some(path)
        })
        .filter(|path| seen.insert(*path))
        .map(str::to_string)
        .collect()
}

/// Strip `prefix` from each entry and sort naturally.
pub fn prepare_module_list(mut modules: Vec<String>, strip_prefix: Option<&str>) -> Vec<String> {
    if let Some(prefix) = strip_prefix.filter(|p| !p.is_empty()) {
        for module in &mut modules {
            if let Some(stripped) = module.strip_prefix(prefix) {
                *module = stripped.to_string();
            }
        }
    }
    modules.sort_by(|a, b| natural_cmp(a, b));
    modules
}

/// Compare two strings with digit runs ordered by numeric value.
///
/// `file2` sorts before `file10`. Equal numbers with different zero padding
/// sort shorter first, so the order stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = digit_run(&mut a);
                let right = digit_run(&mut b);
                match compare_numeric(&left, &right) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            (Some(x), Some(y)) => {
                a.next();
                b.next();
                match x.cmp(&y) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
        }
    }
}

fn digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

fn compare_numeric(left: &str, right: &str) -> Ordering {
    let l = left.trim_start_matches('0');
    let r = right.trim_start_matches('0');
    l.len()
        .cmp(&r.len())
        .then_with(|| l.cmp(r))
        .then_with(|| left.len().cmp(&right.len()))
}
