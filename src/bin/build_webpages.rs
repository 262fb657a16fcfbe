use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use jieba_rs::Jieba;
use tracing::{error, info};

use seekd::analysis::chinese::ChineseTokenizer;
use seekd::analysis::stopwords::StopWords;
use seekd::builder::ingest::{write_pages, PageIngestor};
use seekd::builder::inverted::InvertedIndexBuilder;
use seekd::builder::simhash::{deduplicate, SimHasher};
use seekd::store::layout::ArtifactLayout;

/// Build the page store, offset table and inverted index from RSS feeds.
#[derive(Parser)]
#[command(name = "build_webpages")]
#[command(about = "Ingest RSS feeds, deduplicate pages and build the inverted index")]
struct Cli {
    /// Directory of RSS .xml feed files.
    #[arg(default_value = "corpus/webpages")]
    xml_dir: PathBuf,

    /// Chinese stop-words file.
    #[arg(default_value = "corpus/stopwords/cn_stopwords.txt")]
    cn_stopwords: PathBuf,

    /// Output directory for webpages.dat, offsets.dat and
    /// inverted_index.dat.
    #[arg(default_value = "data")]
    out_dir: PathBuf,

    /// How many top-weighted tokens feed each SimHash fingerprint.
    #[arg(default_value_t = 10_000)]
    top_k: usize,

    /// Hamming distance at or under which two pages are near-duplicates.
    #[arg(default_value_t = 3)]
    threshold: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();

    match build(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "webpage build failed");
            ExitCode::FAILURE
        }
    }
}

fn build(cli: &Cli) -> seekd::core::error::Result<()> {
    let layout = ArtifactLayout::new(&cli.out_dir);
    layout.ensure_dir()?;

    let stop_words = Arc::new(StopWords::load(&cli.cn_stopwords)?);
    let tokenizer = ChineseTokenizer::new(Arc::new(Jieba::new()), stop_words);

    let mut ingestor = PageIngestor::new();
    let pages = ingestor.ingest_dir(&cli.xml_dir)?;
    let total = pages.len();

    let hasher = SimHasher::new(cli.top_k);
    let unique = deduplicate(pages, &tokenizer, &hasher, cli.threshold);

    write_pages(&unique, &layout.webpages_path(), &layout.offsets_path())?;

    let index = InvertedIndexBuilder::build(&unique, &tokenizer);
    index.write(&layout.inverted_index_path())?;

    info!(
        ingested = total,
        unique = unique.len(),
        terms = index.term_count(),
        out_dir = %cli.out_dir.display(),
        "webpage build complete"
    );
    Ok(())
}
