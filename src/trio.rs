//! Trio sample configuration and derived artifact paths
//!
//! The trio is modeled as a named-field record rather than an indexed collection, so that
//! no downstream logic can depend on a sample's position in a list to identify its family
//! role.
//!

use camino::{Utf8Path, Utf8PathBuf};

use crate::cli::TrioInput;
use crate::filenames::{ALIGNMENT_DIR, CALL_DIR};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SampleRole {
    Child,
    Father,
    Mother,
}

/// Per-sample configuration, immutable after construction
pub struct SampleConfig {
    pub role: SampleRole,
    pub name: String,

    /// Raw read input for this sample in FASTQ format
    pub reads_filename: Utf8PathBuf,

    /// Derived sorted alignment output path
    pub sorted_bam_filename: Utf8PathBuf,

    /// Derived per-sample variant call output path
    pub gvcf_filename: Utf8PathBuf,
}

impl SampleConfig {
    fn new(role: SampleRole, name: &str, reads_filename: &Utf8Path, output_dir: &Utf8Path) -> Self {
        Self {
            role,
            name: name.to_string(),
            reads_filename: reads_filename.to_owned(),
            sorted_bam_filename: output_dir
                .join(ALIGNMENT_DIR)
                .join(format!("{name}.sorted.bam")),
            gvcf_filename: output_dir.join(CALL_DIR).join(format!("{name}.g.vcf.gz")),
        }
    }
}

pub struct Trio {
    pub child: SampleConfig,
    pub father: SampleConfig,
    pub mother: SampleConfig,
}

impl Trio {
    pub fn new(trio_input: &TrioInput, output_dir: &Utf8Path) -> Self {
        Self {
            child: SampleConfig::new(
                SampleRole::Child,
                &trio_input.child.name,
                &trio_input.child.reads_filename,
                output_dir,
            ),
            father: SampleConfig::new(
                SampleRole::Father,
                &trio_input.father.name,
                &trio_input.father.reads_filename,
                output_dir,
            ),
            mother: SampleConfig::new(
                SampleRole::Mother,
                &trio_input.mother.name,
                &trio_input.mother.reads_filename,
                output_dir,
            ),
        }
    }

    /// All trio samples in canonical child, father, mother order
    ///
    /// This order is fixed for launch/reporting purposes only, family roles are always
    /// identified through the named fields.
    ///
    pub fn samples(&self) -> [&SampleConfig; 3] {
        [&self.child, &self.father, &self.mother]
    }

    pub fn sample_names(&self) -> Vec<&str> {
        self.samples().map(|x| x.name.as_str()).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::cli::SampleInput;

    fn test_trio_input() -> TrioInput {
        TrioInput {
            child: SampleInput {
                name: "NA12878".to_string(),
                reads_filename: Utf8PathBuf::from("/data/NA12878.fastq.gz"),
            },
            father: SampleInput {
                name: "NA12891".to_string(),
                reads_filename: Utf8PathBuf::from("/data/NA12891.fastq.gz"),
            },
            mother: SampleInput {
                name: "NA12892".to_string(),
                reads_filename: Utf8PathBuf::from("/data/NA12892.fastq.gz"),
            },
        }
    }

    #[test]
    fn test_trio_derived_paths() {
        let trio = Trio::new(&test_trio_input(), Utf8Path::new("/run/out"));

        assert_eq!(
            trio.child.sorted_bam_filename,
            Utf8PathBuf::from("/run/out/alignments/NA12878.sorted.bam")
        );
        assert_eq!(
            trio.mother.gvcf_filename,
            Utf8PathBuf::from("/run/out/calls/NA12892.g.vcf.gz")
        );
    }

    #[test]
    fn test_trio_sample_order() {
        let trio = Trio::new(&test_trio_input(), Utf8Path::new("/run/out"));

        assert_eq!(trio.sample_names(), vec!["NA12878", "NA12891", "NA12892"]);

        let roles = trio.samples().map(|x| x.role);
        assert_eq!(
            roles,
            [SampleRole::Child, SampleRole::Father, SampleRole::Mother]
        );
    }
}
