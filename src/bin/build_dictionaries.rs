use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use jieba_rs::Jieba;
use tracing::{error, info};

use seekd::analysis::stopwords::StopWords;
use seekd::builder::lexicon::LexiconBuilder;
use seekd::core::types::Language;
use seekd::store::layout::ArtifactLayout;

/// Build the per-language dictionaries and character/letter indexes.
#[derive(Parser)]
#[command(name = "build_dictionaries")]
#[command(about = "Tokenize corpora into dictionary and character-index artifacts")]
struct Cli {
    /// Directory of English .txt corpus files.
    #[arg(default_value = "corpus/EN")]
    en_dir: PathBuf,

    /// Directory of Chinese .txt corpus files.
    #[arg(default_value = "corpus/CN")]
    cn_dir: PathBuf,

    /// English stop-words file.
    #[arg(default_value = "corpus/stopwords/en_stopwords.txt")]
    en_stopwords: PathBuf,

    /// Chinese stop-words file.
    #[arg(default_value = "corpus/stopwords/cn_stopwords.txt")]
    cn_stopwords: PathBuf,

    /// Output directory for dict_*.dat and index_*.dat.
    #[arg(default_value = "data")]
    out_dir: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();

    match build(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "dictionary build failed");
            ExitCode::FAILURE
        }
    }
}

fn build(cli: &Cli) -> seekd::core::error::Result<()> {
    let layout = ArtifactLayout::new(&cli.out_dir);
    layout.ensure_dir()?;

    let en_stop_words = Arc::new(StopWords::load(&cli.en_stopwords)?);
    let mut english = LexiconBuilder::english(en_stop_words);
    english.process_dir(&cli.en_dir)?;
    english.write_artifacts(
        &layout.dictionary_path(Language::English),
        &layout.char_index_path(Language::English),
    )?;

    let cn_stop_words = Arc::new(StopWords::load(&cli.cn_stopwords)?);
    let mut chinese = LexiconBuilder::chinese(Arc::new(Jieba::new()), cn_stop_words);
    chinese.process_dir(&cli.cn_dir)?;
    chinese.write_artifacts(
        &layout.dictionary_path(Language::Chinese),
        &layout.char_index_path(Language::Chinese),
    )?;

    info!(
        en_files = english.stats().files_processed,
        en_words = english.stats().unique_words,
        cn_files = chinese.stats().files_processed,
        cn_words = chinese.stats().unique_words,
        out_dir = %cli.out_dir.display(),
        "dictionary build complete"
    );
    Ok(())
}
