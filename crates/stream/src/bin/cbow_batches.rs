//! Stream CBOW training batches from a corpus and report them as JSON lines.
//!
//! Settings layer as defaults, `--config` file, `CBOW_*` environment, then
//! flags. Logs go to stderr (`RUST_LOG` controls the level), batch records to
//! stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stream::{drive, BatchAssembler, Config, CorpusDir, JsonLinesReport, LineSource, TextSource};
use tokenize::{OverflowPolicy, Vocabulary};

#[derive(Debug, Parser)]
#[command(name = "cbow-batches", about = "Stream CBOW (context, label) batches from text")]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// corpus directory of .txt files, or a file with one document per line
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// number of batches to assemble
    #[arg(long)]
    batches: Option<usize>,
    /// documents drawn per batch
    #[arg(long)]
    sources_per_batch: Option<usize>,
    /// context words on each side of the centre word
    #[arg(long)]
    window_radius: Option<usize>,
    /// maximum vocabulary size
    #[arg(long)]
    capacity: Option<u32>,
    /// seed for document draws
    #[arg(long)]
    seed: Option<u64>,
    /// words past capacity: skip | unknown
    #[arg(long)]
    overflow: Option<OverflowPolicy>,
    /// vocabulary snapshot written at the end of the run
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// start from the snapshot instead of an empty vocabulary
    #[arg(long)]
    resume: bool,
}

impl Args {
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(corpus) = &self.corpus {
            cfg.corpus = corpus.clone();
        }
        if let Some(n) = self.batches {
            cfg.batches = n;
        }
        if let Some(n) = self.sources_per_batch {
            cfg.sources_per_batch = n;
        }
        if let Some(r) = self.window_radius {
            cfg.window_radius = r;
        }
        if let Some(c) = self.capacity {
            cfg.capacity = c;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(policy) = self.overflow {
            cfg.overflow = policy;
        }
        if let Some(path) = &self.snapshot {
            cfg.snapshot = Some(path.clone());
        }
        cfg
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let base = match &args.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    let cfg = args.apply(stream::from_env(base)?);
    cfg.validate()?;
    Ok(cfg)
}

fn open_vocabulary(cfg: &Config, resume: bool) -> Result<Vocabulary> {
    if resume {
        let path = cfg
            .snapshot
            .as_ref()
            .context("--resume needs a snapshot path")?;
        if path.exists() {
            let vocab = Vocabulary::load(path)
                .with_context(|| format!("loading vocabulary snapshot {}", path.display()))?;
            if vocab.capacity() != cfg.capacity || vocab.overflow() != cfg.overflow {
                tracing::warn!(
                    snapshot_capacity = vocab.capacity(),
                    snapshot_overflow = %vocab.overflow(),
                    "snapshot settings win over configured capacity/overflow"
                );
            }
            tracing::info!(path = %path.display(), words = vocab.len(), "resumed vocabulary");
            return Ok(vocab);
        }
        tracing::warn!(path = %path.display(), "no snapshot yet, starting empty");
    }
    Ok(Vocabulary::with_overflow(cfg.capacity, cfg.overflow)?)
}

fn open_source(cfg: &Config) -> Result<Box<dyn TextSource>> {
    let source: Box<dyn TextSource> = if cfg.corpus.is_dir() {
        Box::new(
            CorpusDir::open(&cfg.corpus, cfg.seed)
                .with_context(|| format!("opening corpus directory {}", cfg.corpus.display()))?,
        )
    } else {
        Box::new(
            LineSource::open(&cfg.corpus)
                .with_context(|| format!("opening corpus file {}", cfg.corpus.display()))?,
        )
    };
    Ok(source)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;
    tracing::info!(
        corpus = %cfg.corpus.display(),
        batches = cfg.batches,
        sources_per_batch = cfg.sources_per_batch,
        window_radius = cfg.window_radius,
        capacity = cfg.capacity,
        overflow = %cfg.overflow,
        "starting"
    );

    let vocab = open_vocabulary(&cfg, args.resume)?;
    let source = open_source(&cfg)?;
    let mut assembler = BatchAssembler::new(source, vocab);

    let stdout = std::io::stdout();
    let mut report = JsonLinesReport::new(stdout.lock());
    let stats = drive(
        &mut assembler,
        &mut report,
        cfg.batches,
        cfg.sources_per_batch,
        cfg.window_radius,
    )?;
    tracing::info!(
        batches = stats.batches,
        draws = stats.draws,
        failed_draws = stats.failed_draws,
        sentences = stats.sentences,
        pairs = stats.pairs,
        "run finished"
    );

    let (_, vocab) = assembler.into_parts();
    tracing::info!(words = vocab.len(), rejected = vocab.rejected(), "final vocabulary");
    if let Some(path) = &cfg.snapshot {
        vocab
            .save(path)
            .with_context(|| format!("saving vocabulary snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), "vocabulary snapshot saved");
    }
    Ok(())
}
