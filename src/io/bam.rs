use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use noodles::bam;
use noodles::bgzf;
use noodles::sam;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::RecordBuf;

use crate::pair::{RecordSink, RecordSource};

/// 打开 BAM 文件并读取头部。
pub fn open_reader(path: &str) -> Result<(bam::io::Reader<impl Read>, sam::Header)> {
    let mut reader = bam::io::reader::Builder
        .build_from_path(path)
        .map_err(|e| anyhow!("cannot open BAM '{}': {}", path, e))?;
    let header = reader
        .read_header()
        .with_context(|| format!("cannot read header of '{}'", path))?;
    Ok((reader, header))
}

/// Refuse to clobber an existing file unless `force` is set.
pub fn check_output(path: &str, force: bool) -> Result<()> {
    if Path::new(path).exists() && !force {
        anyhow::bail!("{} exists, use option -f to overwrite", path);
    }
    Ok(())
}

/// Reference sequence names in header order, indexed by reference id.
pub fn reference_names(header: &sam::Header) -> Vec<Vec<u8>> {
    header.reference_sequences().keys().map(|name| name.to_vec()).collect()
}

/// Sequential BAM input yielding owned, mutable records.
pub struct BamSource<R> {
    reader: bam::io::Reader<R>,
    header: sam::Header,
    path: String,
}

impl<R: Read> BamSource<R> {
    pub fn new(reader: bam::io::Reader<R>, header: sam::Header, path: &str) -> Self {
        Self { reader, header, path: path.to_string() }
    }

    pub fn header(&self) -> &sam::Header {
        &self.header
    }
}

impl<R: Read> RecordSource for BamSource<R> {
    type Record = RecordBuf;

    fn next_record(&mut self) -> Result<Option<RecordBuf>> {
        let mut record = RecordBuf::default();
        let n = self
            .reader
            .read_record_buf(&self.header, &mut record)
            .with_context(|| format!("malformed record in '{}'", self.path))?;
        Ok(if n == 0 { None } else { Some(record) })
    }
}

pub fn open_source(path: &str) -> Result<BamSource<impl Read>> {
    let (reader, header) = open_reader(path)?;
    Ok(BamSource::new(reader, header, path))
}

/// BGZF-compressed BAM output.
pub struct BamSink {
    writer: bam::io::Writer<bgzf::Writer<File>>,
    header: sam::Header,
    path: String,
}

impl BamSink {
    /// 创建输出文件并写入头部。
    pub fn create(path: &str, header: sam::Header) -> Result<Self> {
        let file = File::create(path).map_err(|e| anyhow!("cannot create '{}': {}", path, e))?;
        let mut writer = bam::io::Writer::new(file);
        writer
            .write_header(&header)
            .with_context(|| format!("cannot write header to '{}'", path))?;
        Ok(Self { writer, header, path: path.to_string() })
    }

    /// Flush and write the BGZF EOF block.
    pub fn finish(mut self) -> Result<()> {
        self.writer.try_finish().with_context(|| format!("close failed for '{}'", self.path))
    }
}

impl RecordSink<RecordBuf> for BamSink {
    fn write_record(&mut self, record: &RecordBuf) -> Result<()> {
        self.writer
            .write_alignment_record(&self.header, record)
            .with_context(|| format!("cannot write record to '{}'", self.path))
    }
}
