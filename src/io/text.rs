//! Plain-text line I/O.
//!
//! Log dumps are read line by line with invalid UTF-8 replaced rather than
//! rejected; exported dumps routinely contain stray bytes.

use crate::batch::Batch;
use anyhow::{Context, Result};
use std::fs::{File, create_dir_all};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Iterator over the lines of a reader, decoded lossily, without terminators.
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                    self.buf.pop();
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Open `path` for lossy line iteration.
///
/// # Errors
/// Returns an error if the file cannot be opened.
pub fn lines(path: impl AsRef<Path>) -> Result<LossyLines<BufReader<File>>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    Ok(LossyLines::new(BufReader::new(f)))
}

/// Trimmed, non-blank lines of `path`.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn read_values(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut out = Vec::new();
    for (i, line) in lines(path)?.enumerate() {
        let line = line.with_context(|| format!("read {} line #{}", path.display(), i + 1))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    }
    Ok(out)
}

/// Number of `\n` bytes in `path`, for progress totals.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn count_lines(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut chunk = vec![0u8; 1 << 20];
    let mut total = 0usize;
    loop {
        let n = f
            .read(&mut chunk)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        total += chunk[..n].iter().filter(|&&b| b == b'\n').count();
    }
    Ok(total)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    Ok(())
}

/// Write each line followed by exactly one `\n`.
///
/// # Returns
/// The number of lines written.
///
/// # Errors
/// Returns an error if the file or its directories cannot be created or written.
pub fn write_lines<I, S>(path: impl AsRef<Path>, lines: I) -> Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    create_parent(path)?;
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    let mut n = 0usize;
    for line in lines {
        let line = line.as_ref();
        w.write_all(line.as_bytes())?;
        if !line.ends_with('\n') {
            w.write_all(b"\n")?;
        }
        n += 1;
    }
    w.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(n)
}

/// Write `content` verbatim.
///
/// # Errors
/// Returns an error if the file or its directories cannot be created or written.
pub fn write_text(path: impl AsRef<Path>, content: &str) -> Result<()> {
    let path = path.as_ref();
    create_parent(path)?;
    std::fs::write(path, content).with_context(|| format!("write {}", path.display()))
}

/// Write every batch to `dir/{stem}-{n}.txt`, `n` counting from 1.
///
/// # Errors
/// Returns an error on the first file that cannot be written.
pub fn write_batches(dir: impl AsRef<Path>, stem: &str, batches: &[Batch]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut written = Vec::with_capacity(batches.len());
    for (i, batch) in batches.iter().enumerate() {
        let path = dir.join(format!("{stem}-{}.txt", i + 1));
        write_text(&path, &batch.rendered)?;
        tracing::debug!(path = %path.display(), items = batch.len(), bytes = batch.byte_len(), "wrote batch");
        written.push(path);
    }
    Ok(written)
}
