//! BAM → 文本/FASTQ：逐条解码 read 的序列与质量值。

use std::io::{BufWriter, Write};

use anyhow::{anyhow, Context, Result};
use log::info;
use noodles::bam;

use crate::io::bam as bam_io;
use crate::io::fastq::{DecodedRead, OutputFormat};
use crate::record::SequencedRead;

#[derive(Clone, Copy, Debug, Default)]
pub struct ExtractOpt {
    /// Overwrite an existing output file.
    pub force: bool,
    /// Drop reads that are aligned.
    pub skip_aligned: bool,
    /// Drop reads that are not aligned.
    pub skip_unaligned: bool,
    pub format: OutputFormat,
}

impl ExtractOpt {
    pub fn keeps<R: SequencedRead + ?Sized>(&self, record: &R) -> bool {
        let unmapped = record.read_flags().is_unmapped();
        !((unmapped && self.skip_unaligned) || (!unmapped && self.skip_aligned))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub records_read: u64,
    pub records_written: u64,
}

/// Decode every kept record of `reader` into `out`.
pub fn extract_records<R, W>(reader: &mut bam::io::Reader<R>, out: &mut W, opt: ExtractOpt) -> Result<ExtractStats>
where
    R: std::io::Read,
    W: Write + ?Sized,
{
    let mut stats = ExtractStats::default();
    let mut record = bam::Record::default();
    while reader.read_record(&mut record)? != 0 {
        stats.records_read += 1;
        if !opt.keeps(&record) {
            continue;
        }
        DecodedRead::from_record(&record).write_to(out, opt.format)?;
        stats.records_written += 1;
    }
    Ok(stats)
}

/// 读取 BAM 并输出解码后的 read；`out_path` 为空时写到标准输出。
pub fn extract_with_opt(in_path: &str, out_path: Option<&str>, opt: ExtractOpt) -> Result<ExtractStats> {
    let (mut reader, _header) = bam_io::open_reader(in_path)?;

    let mut out: Box<dyn Write> = if let Some(p) = out_path {
        bam_io::check_output(p, opt.force)?;
        let fh = std::fs::File::create(p).map_err(|e| anyhow!("cannot create '{}': {}", p, e))?;
        Box::new(BufWriter::new(fh))
    } else {
        Box::new(BufWriter::new(std::io::stdout()))
    };

    let stats = extract_records(&mut reader, &mut out, opt)
        .with_context(|| format!("failed while decoding '{}'", in_path))?;
    out.flush()?;

    info!("{}: {} records read, {} written", in_path, stats.records_read, stats.records_written);
    Ok(stats)
}
