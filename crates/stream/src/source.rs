use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokenize::split_sentences;

/// One draw from a [`TextSource`]: cleaned, tokenized sentences and where
/// they came from.
#[derive(Clone, Debug, PartialEq)]
pub struct SentenceBatch {
    /// identifier of the drawn document (path, `path:line`, ...)
    pub provenance: String,
    /// time of the draw
    pub fetched_at: DateTime<Utc>,
    /// lowercased, punctuation-free words per sentence
    pub sentences: Vec<Vec<String>>,
}

impl SentenceBatch {
    /// Clean and split raw `text` into sentences.
    pub fn from_text(provenance: impl Into<String>, text: &str) -> Self {
        Self {
            provenance: provenance.into(),
            fetched_at: Utc::now(),
            sentences: split_sentences(text),
        }
    }

    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    /// `true` when the draw produced no sentence.
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

/// Failure of a single draw. Callers skip the draw and move on.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The document could not be read
    #[error("reading {}: {source}", path.display())]
    Io {
        /// document that failed
        path: PathBuf,
        /// underlying cause
        #[source]
        source: std::io::Error,
    },
    /// The document contained no usable sentence
    #[error("{0}: no usable sentences")]
    Empty(String),
    /// A corpus directory holds no `.txt` document
    #[error("no .txt documents under {}", .0.display())]
    NoDocuments(PathBuf),
    /// A finite source has nothing left
    #[error("{0}: source exhausted")]
    Exhausted(String),
}

/// Supplier of cleaned sentences. Each draw may fail independently.
pub trait TextSource {
    /// Pull the next batch of sentences.
    fn draw(&mut self) -> Result<SentenceBatch, SourceError>;
}

impl<T: TextSource + ?Sized> TextSource for Box<T> {
    fn draw(&mut self) -> Result<SentenceBatch, SourceError> {
        (**self).draw()
    }
}

/// Draws a random `.txt` document from a directory tree on every call.
///
/// The document list is collected once at [`CorpusDir::open`] and sorted, so
/// a given seed always draws the same sequence of documents.
#[derive(Clone, Debug)]
pub struct CorpusDir {
    root: PathBuf,
    documents: Vec<PathBuf>,
    rng: ChaCha8Rng,
}

impl CorpusDir {
    /// Scan `root` recursively for `.txt` files.
    pub fn open(root: impl AsRef<Path>, seed: u64) -> Result<Self, SourceError> {
        let root = root.as_ref().to_path_buf();
        let mut documents = Vec::new();
        let mut pending = vec![root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir).map_err(|source| SourceError::Io {
                path: dir.clone(),
                source,
            })?;
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::debug!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                        continue;
                    }
                };
                let path = entry.path();
                let file_type = match entry.file_type() {
                    Ok(file_type) => file_type,
                    Err(err) => {
                        tracing::debug!(path = %path.display(), error = %err, "skipping entry without a file type");
                        continue;
                    }
                };
                // symlinked directories are not followed; symlinked files are
                let is_file = if file_type.is_symlink() {
                    fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false)
                } else {
                    file_type.is_file()
                };
                if file_type.is_dir() {
                    pending.push(path);
                } else if is_file && path.extension().map(|e| e == "txt").unwrap_or(false) {
                    documents.push(path);
                } else if file_type.is_symlink() {
                    tracing::debug!(path = %path.display(), "not following symlink");
                }
            }
        }
        if documents.is_empty() {
            return Err(SourceError::NoDocuments(root));
        }
        documents.sort();
        tracing::info!(root = %root.display(), documents = documents.len(), "opened corpus directory");
        Ok(Self {
            root,
            documents,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Documents that can be drawn, sorted.
    pub fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    /// Directory the corpus was opened from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TextSource for CorpusDir {
    fn draw(&mut self) -> Result<SentenceBatch, SourceError> {
        let pick = self.rng.gen_range(0..self.documents.len());
        let path = self
            .documents
            .get(pick)
            .ok_or_else(|| SourceError::NoDocuments(self.root.clone()))?;
        let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        let batch = SentenceBatch::from_text(path.display().to_string(), &text);
        if batch.is_empty() {
            return Err(SourceError::Empty(batch.provenance));
        }
        Ok(batch)
    }
}

/// Treats every non-blank line of a file as one document, drawn in order and
/// cycling back to the first line after the last.
#[derive(Clone, Debug)]
pub struct LineSource {
    path: PathBuf,
    lines: Vec<String>,
    pos: usize,
}

impl LineSource {
    /// Read `path` and keep its non-blank lines.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        let lines: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if lines.is_empty() {
            return Err(SourceError::Empty(path.display().to_string()));
        }
        Ok(Self { path, lines, pos: 0 })
    }

    /// Number of documents (non-blank lines).
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always `false` for an opened source.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl TextSource for LineSource {
    fn draw(&mut self) -> Result<SentenceBatch, SourceError> {
        let index = self.pos % self.lines.len().max(1);
        self.pos = index + 1;
        let provenance = format!("{}:{}", self.path.display(), index + 1);
        let line = self
            .lines
            .get(index)
            .ok_or_else(|| SourceError::Exhausted(provenance.clone()))?;
        let batch = SentenceBatch::from_text(provenance, line);
        if batch.is_empty() {
            return Err(SourceError::Empty(batch.provenance));
        }
        Ok(batch)
    }
}

/// Replays a prepared queue of draw results, then reports exhaustion.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    queue: VecDeque<Result<SentenceBatch, SourceError>>,
}

impl ScriptedSource {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful draw of raw `text`.
    pub fn push_text(&mut self, provenance: &str, text: &str) -> &mut Self {
        self.queue.push_back(Ok(SentenceBatch::from_text(provenance, text)));
        self
    }

    /// Queue a failed draw.
    pub fn push_error(&mut self, error: SourceError) -> &mut Self {
        self.queue.push_back(Err(error));
        self
    }

    /// Draws left in the script.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl TextSource for ScriptedSource {
    fn draw(&mut self) -> Result<SentenceBatch, SourceError> {
        self.queue
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::Exhausted("scripted source".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn sentence_batch_cleans_and_splits() {
        let b = SentenceBatch::from_text("doc", "Hello, World! It's fine.");
        assert_eq!(b.provenance, "doc");
        assert_eq!(b.sentences, vec![vec!["hello", "world"], vec!["its", "fine"]]);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn corpus_dir_draws_are_reproducible_per_seed() {
        let dir = temp_dir("stream_corpus_dir_seeded");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("a.txt"), "alpha one. alpha two").unwrap();
        fs::write(dir.join("b.txt"), "beta one").unwrap();
        fs::write(dir.join("nested").join("c.txt"), "gamma one").unwrap();
        fs::write(dir.join("ignored.md"), "not a document").unwrap();

        let mut first = CorpusDir::open(&dir, 7).unwrap();
        let mut second = CorpusDir::open(&dir, 7).unwrap();
        assert_eq!(first.documents().len(), 3);
        let a: Vec<String> = (0..10).map(|_| first.draw().unwrap().provenance).collect();
        let b: Vec<String> = (0..10).map(|_| second.draw().unwrap().provenance).collect();
        let _ = fs::remove_dir_all(&dir);
        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.ends_with(".txt")));
    }

    #[cfg(unix)]
    #[test]
    fn corpus_dir_does_not_follow_directory_symlinks() {
        let dir = temp_dir("stream_corpus_dir_symlink_loop");
        fs::write(dir.join("a.txt"), "only document").unwrap();
        std::os::unix::fs::symlink(&dir, dir.join("loop")).unwrap();
        std::os::unix::fs::symlink(dir.join("a.txt"), dir.join("alias.txt")).unwrap();
        let result = CorpusDir::open(&dir, 5);
        let _ = fs::remove_dir_all(&dir);
        let source = result.unwrap();
        let names: Vec<_> = source
            .documents()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "alias.txt"]);
    }

    #[test]
    fn corpus_dir_without_documents_fails_to_open() {
        let dir = temp_dir("stream_corpus_dir_empty");
        fs::write(dir.join("readme.md"), "nothing").unwrap();
        let result = CorpusDir::open(&dir, 1);
        let _ = fs::remove_dir_all(&dir);
        assert!(matches!(result, Err(SourceError::NoDocuments(_))));
    }

    #[test]
    fn corpus_dir_reports_blank_documents() {
        let dir = temp_dir("stream_corpus_dir_blank");
        fs::write(dir.join("blank.txt"), " ... !!! ").unwrap();
        let mut source = CorpusDir::open(&dir, 3).unwrap();
        let result = source.draw();
        let _ = fs::remove_dir_all(&dir);
        assert!(matches!(result, Err(SourceError::Empty(_))));
    }

    #[test]
    fn corpus_dir_reports_vanished_documents() {
        let dir = temp_dir("stream_corpus_dir_vanished");
        fs::write(dir.join("gone.txt"), "soon gone").unwrap();
        let mut source = CorpusDir::open(&dir, 3).unwrap();
        let _ = fs::remove_dir_all(&dir);
        assert!(matches!(source.draw(), Err(SourceError::Io { .. })));
    }

    #[test]
    fn line_source_cycles_and_tags_line_numbers() {
        let path = std::env::temp_dir().join("stream_line_source_cycle.txt");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "First line here").unwrap();
        writeln!(f, "   ").unwrap();
        writeln!(f, "Second line").unwrap();
        drop(f);

        let mut source = LineSource::open(&path).unwrap();
        let draws: Vec<SentenceBatch> = (0..3).map(|_| source.draw().unwrap()).collect();
        let _ = fs::remove_file(&path);

        assert_eq!(source.len(), 2);
        assert_eq!(draws[0].sentences, vec![vec!["first", "line", "here"]]);
        assert!(draws[0].provenance.ends_with(":1"));
        assert!(draws[1].provenance.ends_with(":2"));
        assert_eq!(draws[2].sentences, draws[0].sentences);
    }

    #[test]
    fn line_source_punctuation_only_line_is_an_empty_draw() {
        let path = std::env::temp_dir().join("stream_line_source_punct.txt");
        fs::write(&path, "words here\n--- ***\n").unwrap();
        let mut source = LineSource::open(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert!(source.draw().is_ok());
        assert!(matches!(source.draw(), Err(SourceError::Empty(_))));
    }

    #[test]
    fn line_source_missing_or_blank_file_fails() {
        assert!(matches!(
            LineSource::open("/nonexistent/stream_never_exists.txt"),
            Err(SourceError::Io { .. })
        ));
        let path = std::env::temp_dir().join("stream_line_source_blank.txt");
        fs::write(&path, "\n  \n").unwrap();
        let result = LineSource::open(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(SourceError::Empty(_))));
    }

    #[test]
    fn scripted_source_replays_then_exhausts() {
        let mut source = ScriptedSource::new();
        source
            .push_text("one", "a b")
            .push_error(SourceError::Empty("two".to_string()));
        assert_eq!(source.remaining(), 2);
        assert!(source.draw().is_ok());
        assert!(matches!(source.draw(), Err(SourceError::Empty(_))));
        assert!(matches!(source.draw(), Err(SourceError::Exhausted(_))));
    }

    #[test]
    fn boxed_sources_forward_draws() {
        let mut scripted = ScriptedSource::new();
        scripted.push_text("boxed", "x y z");
        let mut boxed: Box<dyn TextSource> = Box::new(scripted);
        assert_eq!(boxed.draw().unwrap().provenance, "boxed");
    }

    #[test]
    fn source_error_messages_name_the_document() {
        let e = SourceError::Io {
            path: PathBuf::from("/tmp/x.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(e.to_string().contains("/tmp/x.txt"));
        assert!(std::error::Error::source(&e).is_some());
        assert!(SourceError::Empty("doc".into()).to_string().contains("doc"));
    }
}
