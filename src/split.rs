// Allow casts for size calculations - these are intentional and safe for
// dataset sizes
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

//! Dataset splitting utilities
//!
//! Splits a dataset into a train and an eval artifact of the same storage
//! format. The partition works on raw storage units (rows of a delimited
//! file, whole documents of a TRXML bundle), so every column and every
//! passthrough field travels with its record.
//!
//! # Example
//!
//! ```no_run
//! use agency_dataset::split::DatasetSplitter;
//!
//! let splitter = DatasetSplitter::new(0.8, 111).unwrap();
//! let paths = splitter.split("data/postings.csv", "models").unwrap();
//! println!("{} / {}", paths.train.display(), paths.eval.display());
//! ```

use std::{
    fs::{self, File},
    io::{BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use csv::{ByteRecord, ReaderBuilder};
use rand::{seq::SliceRandom, SeedableRng};

use crate::{
    error::{Error, Result},
    format::{Delimiter, StorageFormat},
    loader::bundle::list_documents,
};

/// Where a split was written and how many units went each way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPaths {
    /// Training artifact (`train.csv`/`train.tsv` or `train/`).
    pub train: PathBuf,
    /// Evaluation artifact (`eval.csv`/`eval.tsv` or `eval/`).
    pub eval: PathBuf,
    /// Number of rows or documents in the training artifact.
    pub train_units: usize,
    /// Number of rows or documents in the evaluation artifact.
    pub eval_units: usize,
}

/// Deterministic shuffle-then-cut splitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetSplitter {
    ratio: f64,
    seed: u64,
}

impl Default for DatasetSplitter {
    fn default() -> Self {
        Self {
            ratio: Self::DEFAULT_RATIO,
            seed: Self::DEFAULT_SEED,
        }
    }
}

impl DatasetSplitter {
    /// Default fraction of units assigned to train.
    pub const DEFAULT_RATIO: f64 = 0.8;
    /// Default shuffle seed.
    pub const DEFAULT_SEED: u64 = 111;

    /// Creates a splitter.
    ///
    /// # Arguments
    /// * `ratio` - Fraction for training, in `[0, 1]`
    /// * `seed` - Shuffle seed; the same seed reproduces the same split
    ///
    /// # Errors
    /// Returns [`Error::SplitValidation`] if `ratio` is outside `[0, 1]`.
    pub fn new(ratio: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(Error::split(format!(
                "ratio must be between 0 and 1, got {ratio}"
            )));
        }
        Ok(Self { ratio, seed })
    }

    /// Fraction of units assigned to train.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Shuffle seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of the `n` units that go to train: `floor(ratio * n)`.
    pub fn train_size(&self, n: usize) -> usize {
        ((n as f64) * self.ratio).floor().min(n as f64) as usize
    }

    /// Shuffles `0..n` with the seed and cuts it into (train, eval).
    pub fn partition(&self, n: usize) -> (Vec<usize>, Vec<usize>) {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let eval = indices.split_off(self.train_size(n));
        (indices, eval)
    }

    /// Splits the dataset at `path` into two artifacts under `destination`.
    ///
    /// The source is never modified. `destination` is created if absent.
    ///
    /// # Errors
    /// Returns [`Error::SplitValidation`] if the source has no units, the
    /// destination is not a writable directory, or an output would
    /// overwrite or nest inside the source. Detection and I/O errors are
    /// passed through.
    pub fn split(
        &self,
        path: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<SplitPaths> {
        let path = path.as_ref();
        let destination = destination.as_ref();

        tracing::info!(
            source = %path.display(),
            ratio = self.ratio,
            seed = self.seed,
            "splitting data set into train and eval"
        );

        let paths = match StorageFormat::detect(path)? {
            StorageFormat::Delimited(delimiter) => {
                self.split_delimited(path, delimiter, destination)?
            }
            StorageFormat::StructuredBundle => self.split_bundle(path, destination)?,
        };

        tracing::info!(
            train = %paths.train.display(),
            eval = %paths.eval.display(),
            train_units = paths.train_units,
            eval_units = paths.eval_units,
            "split written"
        );
        Ok(paths)
    }

    fn split_delimited(
        &self,
        path: &Path,
        delimiter: Delimiter,
        destination: &Path,
    ) -> Result<SplitPaths> {
        let ext = delimiter.extension();
        let train = destination.join(format!("train.{ext}"));
        let eval = destination.join(format!("eval.{ext}"));

        let source = canonical(path)?;
        for output in [&train, &eval] {
            if resolve(output)? == source {
                return Err(Error::split(format!(
                    "output {} would overwrite the source",
                    output.display()
                )));
            }
        }

        let index = RowIndex::scan(path, delimiter)?;
        if index.rows.is_empty() {
            return Err(Error::split(format!(
                "{} contains no data rows",
                path.display()
            )));
        }

        let (train_rows, eval_rows) = self.partition(index.rows.len());
        prepare_destination(destination)?;

        let mut source = File::open(path).map_err(|e| Error::io(e, path))?;
        index.write_rows(&mut source, path, &train_rows, &train)?;
        index.write_rows(&mut source, path, &eval_rows, &eval)?;

        Ok(SplitPaths {
            train,
            eval,
            train_units: train_rows.len(),
            eval_units: eval_rows.len(),
        })
    }

    fn split_bundle(&self, path: &Path, destination: &Path) -> Result<SplitPaths> {
        let train = destination.join("train");
        let eval = destination.join("eval");

        let source = canonical(path)?;
        let resolved = resolve(destination)?;
        if resolved.starts_with(&source) {
            return Err(Error::split(format!(
                "destination {} lies inside the source bundle {}",
                destination.display(),
                path.display()
            )));
        }
        for target in [&train, &eval] {
            if source.starts_with(resolve(target)?) {
                return Err(Error::split(format!(
                    "output {} would contain the source bundle",
                    target.display()
                )));
            }
        }

        let documents = list_documents(path)?;
        if documents.is_empty() {
            return Err(Error::split(format!(
                "{} contains no documents",
                path.display()
            )));
        }

        let (train_docs, eval_docs) = self.partition(documents.len());
        prepare_destination(destination)?;
        ensure_empty_target(&train)?;
        ensure_empty_target(&eval)?;

        copy_documents(&documents, &train_docs, &train)?;
        copy_documents(&documents, &eval_docs, &eval)?;

        Ok(SplitPaths {
            train,
            eval,
            train_units: train_docs.len(),
            eval_units: eval_docs.len(),
        })
    }
}

/// Splits `path` with the given ratio and seed; see [`DatasetSplitter`].
///
/// # Errors
/// See [`DatasetSplitter::new`] and [`DatasetSplitter::split`].
pub fn split_data_set(
    path: impl AsRef<Path>,
    ratio: f64,
    destination: impl AsRef<Path>,
    seed: u64,
) -> Result<SplitPaths> {
    DatasetSplitter::new(ratio, seed)?.split(path, destination)
}

/// Byte ranges of the header and of every row of a delimited file.
///
/// Only offsets are kept; row payloads are read back one at a time while
/// writing.
#[derive(Debug)]
struct RowIndex {
    header: (u64, u64),
    rows: Vec<(u64, u64)>,
}

impl RowIndex {
    fn scan(path: &Path, delimiter: Delimiter) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        let len = file.metadata().map_err(|e| Error::io(e, path))?.len();

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter.as_byte())
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        reader.byte_headers()?;

        let mut starts = Vec::new();
        let mut record = ByteRecord::new();
        while reader.read_byte_record(&mut record)? {
            if let Some(pos) = record.position() {
                starts.push(pos.byte());
            }
        }

        let header_end = starts.first().copied().unwrap_or(len);
        let rows = starts
            .iter()
            .enumerate()
            .map(|(i, &start)| (start, starts.get(i + 1).copied().unwrap_or(len)))
            .collect();

        Ok(Self {
            header: (0, header_end),
            rows,
        })
    }

    fn write_rows(
        &self,
        source: &mut File,
        path: &Path,
        order: &[usize],
        dest: &Path,
    ) -> Result<()> {
        let out = File::create(dest).map_err(|e| Error::io(e, dest))?;
        let mut out = BufWriter::new(out);
        let mut buf = Vec::new();

        read_range(source, path, self.header, &mut buf)?;
        write_line(&mut out, dest, &buf)?;

        for &i in order {
            read_range(source, path, self.rows[i], &mut buf)?;
            write_line(&mut out, dest, &buf)?;
        }

        out.flush().map_err(|e| Error::io(e, dest))
    }
}

fn read_range(
    source: &mut File,
    path: &Path,
    (start, end): (u64, u64),
    buf: &mut Vec<u8>,
) -> Result<()> {
    buf.resize((end - start) as usize, 0);
    source
        .seek(SeekFrom::Start(start))
        .and_then(|_| source.read_exact(buf))
        .map_err(|e| Error::io(e, path))
}

/// Writes one row with its line terminator normalized to `\n`.
///
/// A range may begin with the tail of the previous terminator or with
/// skipped blank lines, so terminators are stripped from both ends.
fn write_line(out: &mut impl Write, dest: &Path, row: &[u8]) -> Result<()> {
    let is_term = |b: &u8| *b == b'\n' || *b == b'\r';
    let start = row.iter().position(|b| !is_term(b)).unwrap_or(row.len());
    let end = row.iter().rposition(|b| !is_term(b)).map_or(start, |i| i + 1);
    out.write_all(&row[start..end])
        .and_then(|()| out.write_all(b"\n"))
        .map_err(|e| Error::io(e, dest))
}

fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| Error::io(e, path))
}

/// Canonical form of a path that may not exist yet: the longest existing
/// ancestor is canonicalized and the remaining components appended.
fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(Error::io_no_path)?
            .join(path)
    };

    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
            break;
        };
        rest.push(name.to_os_string());
        existing = parent;
    }

    let mut resolved = if existing.exists() {
        canonical(existing)?
    } else {
        existing.to_path_buf()
    };
    resolved.extend(rest.iter().rev());
    Ok(resolved)
}

fn ensure_empty_target(dest: &Path) -> Result<()> {
    if !dest.exists() {
        return Ok(());
    }
    let occupied = fs::read_dir(dest)
        .map_err(|e| Error::io(e, dest))?
        .next()
        .is_some();
    if occupied {
        return Err(Error::split(format!(
            "{} already exists and is not empty",
            dest.display()
        )));
    }
    Ok(())
}

fn copy_documents(documents: &[PathBuf], order: &[usize], dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| Error::io(e, dest))?;

    for &i in order {
        let src = &documents[i];
        let Some(name) = src.file_name() else {
            continue;
        };
        let target = dest.join(name);
        fs::copy(src, &target).map_err(|e| Error::io(e, src))?;
    }
    Ok(())
}

fn prepare_destination(destination: &Path) -> Result<()> {
    if !destination.exists() {
        return fs::create_dir_all(destination).map_err(|e| Error::io(e, destination));
    }

    if !destination.is_dir() {
        return Err(Error::split(format!(
            "destination {} exists and is not a directory",
            destination.display()
        )));
    }

    // writability is checked with an anonymous scratch file
    tempfile::tempfile_in(destination).map_err(|e| {
        Error::split(format!(
            "destination {} is not writable: {e}",
            destination.display()
        ))
    })?;
    Ok(())
}
