use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

use bam_mates::extract::{self, ExtractOpt};
use bam_mates::io::fastq::OutputFormat;
use bam_mates::pair::{self, PairOpt};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "bam-mates", author, version, about = "Decode BAM reads and re-pair split Hi-C mates", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode reads of a BAM into text blocks or FASTQ (bam2fastq)
    Extract {
        /// Input BAM file
        input: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Overwrite the output file if it exists
        #[arg(short = 'f', long)]
        force: bool,
        /// Do not extract reads that are aligned
        #[arg(short = 'a', long = "skip-aligned")]
        skip_aligned: bool,
        /// Do not extract reads that are not aligned
        #[arg(short = 'u', long = "skip-unaligned")]
        skip_unaligned: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Pair up split mates from two name-sorted BAMs (pair2mates)
    Pair {
        /// First-mate BAM, sorted by read name
        input1: String,
        /// Second-mate BAM, sorted by read name
        input2: String,
        /// Output BAM (e.g. name.paired.bam)
        #[arg(short, long)]
        output: String,
        /// Min distance for valid pairs
        #[arg(short = 'm', long = "min-distance", visible_short_alias = 'd', default_value_t = pair::DEFAULT_MIN_DISTANCE)]
        min_distance: u64,
        /// Overwrite the output file if it exists
        #[arg(short = 'f', long)]
        force: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        // one diagnostic line, causes joined
        eprintln!("bam-mates: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract { input, output, force, skip_aligned, skip_unaligned, format } => {
            let opt = ExtractOpt { force, skip_aligned, skip_unaligned, format };
            extract::extract_with_opt(&input, output.as_deref(), opt)?;
        }
        Commands::Pair { input1, input2, output, min_distance, force } => {
            let opt = PairOpt { min_distance, force };
            pair::pair_mates_with_opt(&input1, &input2, &output, opt)?;
        }
    }
    Ok(())
}
