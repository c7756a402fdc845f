/*!
 * Batch transfers with destination layout
 */

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use strum::{Display, EnumString};

use super::{Transfer, TransferOptions, TransferResult};
use crate::path::{create_dest_path, PathStyle};

/// Batch operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Copy,
    Move,
}

/// Layout and execution settings for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchOptions {
    pub path_style: PathStyle,
    /// Prefix destinations with the source base directory's own name
    pub include_base: bool,
    pub transfer: TransferOptions,
    /// Process files on the rayon pool
    pub parallel: bool,
}

/// Per-source outcome of a batch, keyed by the source path as given
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub results: BTreeMap<PathBuf, TransferResult>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn get(&self, source: &Path) -> Option<&TransferResult> {
        self.results.get(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &TransferResult)> {
        self.results.iter()
    }
}

fn failed(source: &Path) -> TransferResult {
    TransferResult {
        success: false,
        destination: source.to_path_buf(),
    }
}

impl Transfer {
    fn plan_destination(
        source: &Path,
        source_base: &Path,
        dest_base: &Path,
        options: &BatchOptions,
    ) -> Option<PathBuf> {
        if !source.is_file() {
            return None;
        }

        match create_dest_path(
            source,
            source_base,
            dest_base,
            options.path_style,
            options.include_base,
        ) {
            Ok(dest) => Some(dest),
            Err(e) => {
                tracing::error!("No destination for {}: {}", source.display(), e);
                None
            }
        }
    }

    fn batch_one(
        &self,
        operation: Operation,
        source: &Path,
        dest: Option<&Path>,
        options: &BatchOptions,
    ) -> TransferResult {
        if !source.is_file() {
            tracing::error!("Source is missing or not a file: {}", source.display());
            return failed(source);
        }
        let Some(dest) = dest else {
            return failed(source);
        };

        match operation {
            Operation::Copy => self.copy(source, dest, options.transfer),
            Operation::Move => self.move_file(source, dest, options.transfer),
        }
    }

    /// Run `operation` on every source, calling `on_done` after each file
    ///
    /// Sources whose destination was already claimed by an earlier source
    /// run afterwards, one at a time in input order, so a parallel batch
    /// resolves collisions the same way a sequential one does.
    pub fn run_batch_with_progress<F>(
        &self,
        operation: Operation,
        sources: &[PathBuf],
        source_base: &Path,
        dest_base: &Path,
        options: &BatchOptions,
        on_done: F,
    ) -> BatchReport
    where
        F: Fn(&Path, &TransferResult) + Sync,
    {
        if let Err(e) = fs::create_dir_all(dest_base) {
            tracing::error!(
                "Failed to create destination {}: {}",
                dest_base.display(),
                e
            );
            let results = sources.iter().map(|s| (s.clone(), failed(s))).collect();
            return BatchReport { results };
        }

        let mut claimed = HashSet::new();
        let (first, colliding): (Vec<_>, Vec<_>) = sources
            .iter()
            .map(|source| {
                let dest = Self::plan_destination(source, source_base, dest_base, options);
                (source, dest)
            })
            .partition(|(_, dest)| match dest {
                Some(dest) => claimed.insert(dest.clone()),
                None => true,
            });

        if !colliding.is_empty() {
            tracing::debug!(
                "{} sources share a destination, running them last",
                colliding.len()
            );
        }

        let process = |(source, dest): &(&PathBuf, Option<PathBuf>)| {
            let result = self.batch_one(operation, source, dest.as_deref(), options);
            on_done(source, &result);
            ((*source).clone(), result)
        };

        let mut results: BTreeMap<PathBuf, TransferResult> = if options.parallel {
            first.par_iter().map(process).collect()
        } else {
            first.iter().map(process).collect()
        };
        results.extend(colliding.iter().map(process));

        BatchReport { results }
    }

    pub fn run_batch(
        &self,
        operation: Operation,
        sources: &[PathBuf],
        source_base: &Path,
        dest_base: &Path,
        options: &BatchOptions,
    ) -> BatchReport {
        self.run_batch_with_progress(operation, sources, source_base, dest_base, options, |_, _| {})
    }
}

fn batch_options(
    path_style: PathStyle,
    include_base: bool,
    preserve_attrs: bool,
    overwrite: bool,
) -> BatchOptions {
    BatchOptions {
        path_style,
        include_base,
        transfer: TransferOptions {
            preserve_attrs,
            overwrite,
        },
        parallel: false,
    }
}

/// Copy many files under `dest_base`, laid out by `path_style`
pub fn copy_files_with_path(
    sources: &[PathBuf],
    source_base: &Path,
    dest_base: &Path,
    path_style: PathStyle,
    include_base: bool,
    preserve_attrs: bool,
    overwrite: bool,
) -> BatchReport {
    let options = batch_options(path_style, include_base, preserve_attrs, overwrite);
    Transfer::new().run_batch(Operation::Copy, sources, source_base, dest_base, &options)
}

/// Move many files under `dest_base`, laid out by `path_style`
pub fn move_files_with_path(
    sources: &[PathBuf],
    source_base: &Path,
    dest_base: &Path,
    path_style: PathStyle,
    include_base: bool,
    preserve_attrs: bool,
    overwrite: bool,
) -> BatchReport {
    let options = batch_options(path_style, include_base, preserve_attrs, overwrite);
    Transfer::new().run_batch(Operation::Move, sources, source_base, dest_base, &options)
}
