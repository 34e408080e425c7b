mod defaults;
mod utils;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use const_format::concatcp;
use itertools::Itertools;
use regex::Regex;
use simple_error::{SimpleResult, bail};

use self::utils::{canonicalize_string_path, check_required_filename};
use crate::resources::worker_budget;

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(rename_all = "kebab_case")]
pub struct Settings {
    /// Directory for all pipeline output (must not already exist unless --clobber is given)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_output"))]
    pub output_dir: Utf8PathBuf,

    /// Genome reference in FASTA format
    #[arg(long = "ref", value_name = "FILE")]
    pub ref_filename: String,

    /// Target regions in BED format. Joint variant output is restricted to these coordinates.
    #[arg(long = "targets", value_name = "FILE")]
    pub targets_filename: String,

    /// Child sample, given as NAME=FASTQ
    #[arg(long, value_name = "NAME=FASTQ")]
    pub child: String,

    /// Father sample, given as NAME=FASTQ
    #[arg(long, value_name = "NAME=FASTQ")]
    pub father: String,

    /// Mother sample, given as NAME=FASTQ
    #[arg(long, value_name = "NAME=FASTQ")]
    pub mother: String,

    /// Number of threads to use. Defaults to all logical cpus detected, and is always
    /// capped by --max-workers.
    #[arg(long = "threads", value_name = "THREAD_COUNT")]
    thread_count_option: Option<usize>,

    /// This value will be filled in from thread_count_option and max_workers
    #[arg(hide = true, default_value_t = 0)]
    pub thread_count: usize,

    /// Hard cap on the concurrent worker count regardless of detected host capacity
    #[arg(long, value_name = "COUNT", default_value_t = defaults::MAX_WORKER_CEILING)]
    pub max_workers: usize,

    /// Minimum QUAL score for a joint call to pass filtration
    #[arg(long, default_value_t = defaults::MIN_QUAL)]
    pub min_qual: f64,

    /// Minimum total read depth for a joint call to pass filtration
    #[arg(long, default_value_t = defaults::MIN_DEPTH)]
    pub min_depth: u32,

    /// Keep transient joint-call workspace files after the run completes
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Overwrite an existing output directory
    #[arg(long)]
    pub clobber: bool,

    /// Turn on extra debug logging
    #[arg(long)]
    pub debug: bool,

    /// Aligner executable used for reference indexing and read alignment
    #[arg(hide = true, long, value_name = "EXE", default_value = "bwa")]
    pub bwa_bin: String,

    /// samtools executable used for reference/alignment indexing and sorting
    #[arg(hide = true, long, value_name = "EXE", default_value = "samtools")]
    pub samtools_bin: String,

    /// gatk executable used for per-sample calling and joint genotyping
    #[arg(hide = true, long, value_name = "EXE", default_value = "gatk")]
    pub gatk_bin: String,

    /// bcftools executable used for joint call set filtration
    #[arg(hide = true, long, value_name = "EXE", default_value = "bcftools")]
    pub bcftools_bin: String,
}

/// One trio sample input parsed from its NAME=FASTQ command-line value
#[derive(Debug, PartialEq, Eq)]
pub struct SampleInput {
    pub name: String,
    pub reads_filename: Utf8PathBuf,
}

/// All per-sample input values, derived from the command line at validation time
pub struct TrioInput {
    pub child: SampleInput,
    pub father: SampleInput,
    pub mother: SampleInput,
}

impl TrioInput {
    fn samples(&self) -> [&SampleInput; 3] {
        [&self.child, &self.father, &self.mother]
    }
}

/// Checks if a directory does not exist
///
pub fn check_novel_dirname(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.exists() {
        bail!("{} already exists: \"{}\"", label, dirname);
    }
    Ok(())
}

/// Parse and format-check one NAME=FASTQ sample argument
///
/// File existence is checked separately so that this step stays a pure format check.
///
fn parse_sample_arg(arg: &str, label: &str) -> SimpleResult<SampleInput> {
    let Some((name, reads_filename)) = arg.split_once('=') else {
        bail!("Invalid --{label} value '{arg}': expected NAME=FASTQ");
    };

    let name_pattern = Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap();
    if !name_pattern.is_match(name) {
        bail!(
            "Invalid --{label} sample name '{name}': only alphanumerics, '_', '.' and '-' are allowed"
        );
    }
    if reads_filename.is_empty() {
        bail!("Invalid --{label} value '{arg}': empty read file path");
    }

    Ok(SampleInput {
        name: name.to_string(),
        reads_filename: Utf8PathBuf::from(reads_filename),
    })
}

fn validate_sample_input(mut sample: SampleInput, label: &str) -> SimpleResult<SampleInput> {
    check_required_filename(sample.reads_filename.as_str(), &format!("{label} read"))?;
    sample.reads_filename = sample.reads_filename.canonicalize_utf8().unwrap();
    Ok(sample)
}

/// Validate settings and update parameters that can't be processed automatically by clap
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_settings_impl(
    mut settings: Settings,
) -> SimpleResult<(Settings, TrioInput)> {
    if let Some(count) = settings.thread_count_option {
        if count == 0 {
            bail!("--threads argument must be greater than 0");
        }
    }
    if settings.max_workers == 0 {
        bail!("--max-workers argument must be greater than 0");
    }
    settings.thread_count = worker_budget(
        settings.thread_count_option.unwrap_or_else(num_cpus::get),
        settings.max_workers,
    );

    if settings.min_qual < 0.0 {
        bail!("--min-qual argument must not be negative");
    }

    let trio_input = TrioInput {
        child: validate_sample_input(parse_sample_arg(&settings.child, "child")?, "child")?,
        father: validate_sample_input(parse_sample_arg(&settings.father, "father")?, "father")?,
        mother: validate_sample_input(parse_sample_arg(&settings.mother, "mother")?, "mother")?,
    };

    if !trio_input.samples().iter().map(|x| &x.name).all_unique() {
        bail!("Trio sample names must be distinct");
    }

    check_required_filename(&settings.ref_filename, "reference")?;
    check_required_filename(&settings.targets_filename, "target regions")?;
    settings.ref_filename = canonicalize_string_path(&settings.ref_filename);
    settings.targets_filename = canonicalize_string_path(&settings.targets_filename);

    Ok((settings, trio_input))
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> (Settings, TrioInput) {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {}", msg);
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_arg() {
        let sample = parse_sample_arg("NA12878=/data/child.fastq.gz", "child").unwrap();
        assert_eq!(
            sample,
            SampleInput {
                name: "NA12878".to_string(),
                reads_filename: Utf8PathBuf::from("/data/child.fastq.gz"),
            }
        );
    }

    #[test]
    fn test_parse_sample_arg_rejects_missing_separator() {
        assert!(parse_sample_arg("NA12878", "child").is_err());
    }

    #[test]
    fn test_parse_sample_arg_rejects_bad_name() {
        assert!(parse_sample_arg("NA 12878=/data/child.fastq.gz", "child").is_err());
        assert!(parse_sample_arg("=/data/child.fastq.gz", "child").is_err());
    }

    #[test]
    fn test_parse_sample_arg_rejects_empty_path() {
        assert!(parse_sample_arg("NA12878=", "child").is_err());
    }

    fn write_test_file(dir: &tempfile::TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, b"x").unwrap();
        path.to_str().unwrap().to_string()
    }

    fn get_test_settings(dir: &tempfile::TempDir) -> Settings {
        let reads = write_test_file(dir, "reads.fastq");
        Settings {
            output_dir: Utf8PathBuf::from("test_output"),
            ref_filename: write_test_file(dir, "ref.fa"),
            targets_filename: write_test_file(dir, "targets.bed"),
            child: format!("child1={reads}"),
            father: format!("father1={reads}"),
            mother: format!("mother1={reads}"),
            thread_count_option: Some(4),
            thread_count: 0,
            max_workers: 16,
            min_qual: 30.0,
            min_depth: 10,
            keep_intermediates: false,
            clobber: false,
            debug: false,
            bwa_bin: "bwa".to_string(),
            samtools_bin: "samtools".to_string(),
            gatk_bin: "gatk".to_string(),
            bcftools_bin: "bcftools".to_string(),
        }
    }

    #[test]
    fn test_validate_settings_fills_thread_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = get_test_settings(&dir);
        settings.thread_count_option = Some(64);

        let (settings, trio_input) = validate_and_fix_settings_impl(settings).unwrap();

        // The requested thread count is clamped to the worker ceiling
        assert_eq!(settings.thread_count, 16);
        assert_eq!(trio_input.child.name, "child1");
    }

    #[test]
    fn test_validate_settings_rejects_duplicate_sample_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = get_test_settings(&dir);
        let reads = write_test_file(&dir, "reads2.fastq");
        settings.father = format!("child1={reads}");

        assert!(validate_and_fix_settings_impl(settings).is_err());
    }
}
