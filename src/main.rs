// src/main.rs
mod extractors;
mod pool;
mod quiz;
mod storage;
mod utils;

use clap::Parser;
use extractors::{PdfOptions, PoolSource};
use pool::filter::IdentifierFilter;
use pool::format::format_records;
use pool::normalize::normalize_lines;
use pool::parser::parse_lines;
use pool::{PoolCollection, QuestionRecord};
use quiz::{QuizEngine, QuizOptions, TerminalFrontend, UnseenPolicy};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use storage::{OutputTarget, StorageManager};
use utils::error::ConfigError;
use utils::AppError;

/// Converts amateur radio question pools to plain text and drills them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pool files to read (.docx, .pdf or .txt)
    #[arg(required = true, value_name = "POOL_FILES")]
    pool_files: Vec<PathBuf>,

    /// Report progress on stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Ask each question; only the ones answered incorrectly or skipped are output
    #[arg(short, long)]
    ask_questions: bool,

    /// Shuffle the choices of each asked question (implies --ask-questions)
    #[arg(short, long)]
    shuffle_abcd: bool,

    /// When shuffling, keep an "All ... correct" choice in position D
    #[arg(long)]
    keep_all_of_the_above: bool,

    /// After quitting the quiz, also output the questions not yet asked
    #[arg(long)]
    keep_unseen: bool,

    /// Only keep questions whose identifier fully matches one of these regexes
    #[arg(short, long = "include", value_name = "RE", conflicts_with = "exclude")]
    include: Vec<String>,

    /// Drop questions whose identifier fully matches one of these regexes
    #[arg(short, long = "exclude", value_name = "RE")]
    exclude: Vec<String>,

    /// Write the pool here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Password for encrypted PDF pools
    #[arg(long, value_name = "PW")]
    pdf_password: Option<String>,

    /// PDF pages to read, e.g. 1,3,7-9
    #[arg(long, value_name = "LIST")]
    pages: Option<String>,

    /// Read at most this many PDF pages
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Save each file's normalized lines here for debugging
    #[arg(long, value_name = "DIR")]
    debug_dir: Option<PathBuf>,
}

/// Everything checked before the first file is opened.
struct Plan {
    sources: Vec<PoolSource>,
    filter: IdentifierFilter,
}

fn validate(args: &Args) -> Result<Plan, ConfigError> {
    let filter = IdentifierFilter::from_patterns(&args.include, &args.exclude)?;
    let pages = args
        .pages
        .as_deref()
        .map(extractors::pdf::parse_page_selection)
        .transpose()?;
    let pdf_options = PdfOptions {
        password: args.pdf_password.clone(),
        pages,
        max_pages: args.max_pages,
    };
    let sources = args
        .pool_files
        .iter()
        .map(|path| PoolSource::new(path, &pdf_options))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Plan { sources, filter })
}

/// The merged pool plus what was lost along the way.
#[derive(Debug, Default)]
struct Collected {
    pool: PoolCollection,
    unreadable: usize,
    malformed: usize,
    /// Identifiers repeated with different content inside a single file.
    duplicates: usize,
}

/// Loads, normalizes and parses every source in order, merging as it goes.
async fn collect_pool(sources: &[PoolSource], storage: &StorageManager) -> Result<Collected, AppError> {
    let mut collected = Collected::default();
    let mut origin: HashMap<String, &Path> = HashMap::new();

    for source in sources {
        tracing::info!("Reading {} ({:?})", source.path.display(), source.format);
        let raw = match source.load_lines().await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", source.path.display(), e);
                collected.unreadable += 1;
                continue;
            }
        };

        let lines = normalize_lines(&raw);
        storage.save_normalized(&source.path, &lines)?;

        let report = parse_lines(&lines);
        tracing::info!(
            "{}: {} question(s) parsed, {} malformed dropped, {} repeated",
            source.path.display(),
            report.pool.len(),
            report.dropped.len(),
            report.duplicates.len()
        );
        collected.malformed += report.dropped.len();
        collected.duplicates += report.duplicates.len();
        for dropped in &report.dropped {
            tracing::debug!("{}:{}: {}", source.path.display(), dropped.line, dropped.reason);
        }

        let identifiers: Vec<String> = report.pool.iter().map(|r| r.identifier.clone()).collect();
        for changed in collected.pool.merge(report.pool) {
            let earlier = origin.get(changed.as_str()).copied().unwrap_or(source.path.as_path());
            tracing::warn!(
                "Question {} in {} replaces a different version from {}",
                changed,
                source.path.display(),
                earlier.display()
            );
        }
        for identifier in identifiers {
            origin.insert(identifier, source.path.as_path());
        }
    }

    Ok(collected)
}

/// Drills the records when asked to; returns what should be written out.
fn run_quiz(args: &Args, records: Vec<QuestionRecord>) -> Result<Vec<QuestionRecord>, AppError> {
    if !(args.ask_questions || args.shuffle_abcd) {
        return Ok(records);
    }
    if records.is_empty() {
        tracing::info!("No questions to ask");
        return Ok(records);
    }

    let options = QuizOptions {
        shuffle_choices: args.shuffle_abcd,
        keep_all_of_the_above: args.keep_all_of_the_above,
        unseen: if args.keep_unseen {
            UnseenPolicy::Include
        } else {
            UnseenPolicy::Exclude
        },
    };
    let mut frontend = TerminalFrontend::new()?;
    let report = QuizEngine::new(options, rand::thread_rng()).run(records, &mut frontend)?;
    let tally = report.tally;
    tracing::info!(
        "Quiz finished: {} correct, {} incorrect, {} skipped, {} not asked",
        tally.correct,
        tally.incorrect,
        tally.skipped,
        tally.remaining()
    );
    Ok(report.residual)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments and set up logging (RUST_LOG wins over -v)
    let args = Args::parse();
    utils::logging::setup_logging(args.verbose);
    tracing::debug!("Starting with args: {:?}", args);

    // 2. Validate everything before touching any file
    let plan = validate(&args)?;
    let storage = StorageManager::new(
        OutputTarget::from_arg(args.output_file.as_deref()),
        args.debug_dir.as_deref(),
    )?;

    // 3. Extract, normalize, parse and merge
    let collected = collect_pool(&plan.sources, &storage).await?;
    tracing::info!(
        "Collected {} question(s) from {} file(s): {} malformed dropped, {} repeated, {} file(s) unreadable",
        collected.pool.len(),
        plan.sources.len(),
        collected.malformed,
        collected.duplicates,
        collected.unreadable
    );
    if collected.pool.is_empty() {
        return Err(AppError::NoRecords(plan.sources.len()));
    }

    // 4. Filter
    let selected = plan.filter.apply(collected.pool);
    if selected.is_empty() {
        tracing::warn!("No questions left after filtering");
    }

    // 5. Quiz
    let records = run_quiz(&args, selected.into_records())?;

    // 6. Output
    tracing::info!("Outputting {} question(s)", records.len());
    storage.save_pool(&format_records(&records))?;

    Ok(())
}
