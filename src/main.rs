//! # Academic trivia
//!
//! Builds a pool of short, license-cleared and deduplicated trivia sentences out of
//! open academic sources (OAI-PMH repositories, Dataverse, DataCite, course catalogs).
//!
//! ## Getting started
//!
//! ```sh
//! academic-trivia 1.1.0
//! license-aware academic trivia pool builder.
//!
//! USAGE:
//!     academic-trivia <SUBCOMMAND>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! SUBCOMMANDS:
//!     build    Harvest sources and build a deduplicated trivia pool
//!     check    Report exact duplicates across trivia module files
//!     help     Prints this message or the help of the given subcommand(s)
//! ```
use structopt::StructOpt;

use academic_trivia::config::{load_sources, load_whitelist};
use academic_trivia::dedup::NearDuplicateIndex;
use academic_trivia::error::Error;
use academic_trivia::pipeline::{Pipeline, PoolBuilder};
use academic_trivia::processing;
use academic_trivia::sources::HttpClient;

#[macro_use]
extern crate log;

mod cli;

fn build(b: cli::Build) -> Result<(), Error> {
    let sources = load_sources(&b.config)?;
    let whitelist = load_whitelist(b.license_whitelist.as_deref())?;
    let client = HttpClient::new()?;

    let mut builder = PoolBuilder::from_config(&sources, &client)?
        .with_whitelist(&whitelist)
        .with_target(b.target)
        .with_similarity(b.similarity)?
        .with_max_sentences(b.max_sentences)
        .with_factual_only(b.factual_only);

    if let Some(path) = b.index.as_deref().filter(|path| path.exists()) {
        builder = builder.with_index(NearDuplicateIndex::load(path)?);
    }

    let result = builder.run()?;

    for report in result.reports.iter().filter(|report| report.error.is_some()) {
        warn!("[{}] skipped: {:?}", report.id, report.error);
    }

    result.pool.write(&b.out)?;
    if let Some(path) = b.index.as_deref() {
        result.index.save(path)?;
    }

    println!(
        "Pool size: {}/{} -> {}",
        result.pool.items.len(),
        b.target,
        b.out.display()
    );
    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opt = cli::Trivia::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::Trivia::Build(b) => build(b)?,
        cli::Trivia::Check(c) => {
            let duplicates = processing::check(&c.src)?;
            if duplicates.is_empty() {
                println!("No duplicates detected.");
            } else {
                println!("Duplicates found:");
                for (file, first_file) in duplicates {
                    println!("{}\t{}", file, first_file);
                }
            }
        }
    };
    Ok(())
}
