//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "academic-trivia",
    about = "license-aware academic trivia pool builder."
)]
/// Holds every command that is callable by the `academic-trivia` command.
pub enum Trivia {
    #[structopt(about = "Harvest sources and build a deduplicated trivia pool")]
    Build(Build),
    #[structopt(about = "Report exact duplicates across trivia module files")]
    Check(Check),
}

#[derive(Debug, StructOpt)]
/// Build command and parameters.
///
/// ```sh
/// academic-trivia-build 1.1.0
/// Harvest sources and build a deduplicated trivia pool
///
/// USAGE:
///     academic-trivia build [FLAGS] [OPTIONS] --config <config>
///
/// FLAGS:
///         --factual_only    only keep sentences written in a factual tone
///     -h, --help            Prints help information
///     -V, --version         Prints version information
///
/// OPTIONS:
///         --config <config>                          source configuration file
///         --index <index>                            near-duplicate index snapshot
///         --license_whitelist <license-whitelist>    license whitelist file
///         --max_sentences <max-sentences>            sentences kept per record [default: 2]
///         --out <out>                                pool destination [default: data/academic_trivia_pool.json]
///         --similarity <similarity>                  near-duplicate similarity threshold [default: 0.80]
///         --target <target>                          number of items to collect [default: 1200]
/// ```
pub struct Build {
    #[structopt(
        parse(from_os_str),
        long = "config",
        help = "source configuration file (JSON)"
    )]
    pub config: PathBuf,
    #[structopt(
        parse(from_os_str),
        long = "out",
        help = "pool destination",
        default_value = "data/academic_trivia_pool.json"
    )]
    pub out: PathBuf,
    #[structopt(
        long = "target",
        help = "number of items to collect",
        default_value = "1200"
    )]
    pub target: usize,
    #[structopt(
        long = "similarity",
        help = "near-duplicate similarity threshold, within [0, 1]",
        default_value = "0.80"
    )]
    pub similarity: f64,
    #[structopt(
        parse(from_os_str),
        long = "license_whitelist",
        help = "license whitelist file (JSON). Built-in defaults are used if missing."
    )]
    pub license_whitelist: Option<PathBuf>,
    #[structopt(
        long = "factual_only",
        help = "only keep sentences written in a factual tone"
    )]
    pub factual_only: bool,
    #[structopt(
        long = "max_sentences",
        help = "sentences kept per record",
        default_value = "2"
    )]
    pub max_sentences: usize,
    #[structopt(
        parse(from_os_str),
        long = "index",
        help = "near-duplicate index snapshot. Loaded if present, rewritten after the build."
    )]
    pub index: Option<PathBuf>,
}

#[derive(Debug, StructOpt)]
/// Check command and parameters.
pub struct Check {
    #[structopt(
        parse(from_os_str),
        help = "directory of trivia module files",
        default_value = "data/academic_trivia"
    )]
    pub src: PathBuf,
}
