use std::io::Write;

use anyhow::Result;

use crate::record::{self, SequencedRead};
use crate::util::dna::PHRED_OFFSET;

/// Phred score written per base in FASTQ when a read has no qualities.
pub const FASTQ_DEFAULT_QUALITY: u8 = 1;

/// 输出格式：逐条 `key=value` 文本块，或标准四行 FASTQ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Fastq,
}

/// A read decoded into printable form, oriented as sequenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRead {
    pub name: String,
    pub flag: u16,
    pub seq: String,
    /// Phred+33 bytes, one per base; `None` when the record stores no qualities.
    pub qual: Option<Vec<u8>>,
    pub lane_id: i32,
}

impl DecodedRead {
    pub fn from_record<R: SequencedRead + ?Sized>(rec: &R) -> Self {
        Self {
            name: record::read_display_name(rec),
            flag: u16::from(rec.read_flags()),
            seq: record::decoded_sequence(rec),
            qual: record::decoded_qualities(rec),
            lane_id: record::lane_id(rec),
        }
    }

    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Text => {
                write!(out, "name={}\nflag={}\nseq={}\nqual=", self.name, self.flag, self.seq)?;
                out.write_all(self.qual.as_deref().unwrap_or(b"*"))?;
                writeln!(out, "\nlane_id={}", self.lane_id)?;
            }
            OutputFormat::Fastq => {
                write!(out, "@{}\n{}\n+\n", self.name, self.seq)?;
                match &self.qual {
                    Some(q) => out.write_all(q)?,
                    None => out.write_all(&self.placeholder_quality())?,
                }
                out.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    // FASTQ needs one quality byte per base even when none were recorded
    fn placeholder_quality(&self) -> Vec<u8> {
        vec![FASTQ_DEFAULT_QUALITY + PHRED_OFFSET; self.seq.len()]
    }
}
