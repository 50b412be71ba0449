//! 双文件配对：按 read 名称同步推进两个已按自然序排序的 BAM 流，
//! 重建 Hi-C 拆分比对的 mate 关系并输出满足距离条件的配对。

use std::cmp::Ordering;

use anyhow::Result;
use log::{debug, info};
use noodles::core::Position;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::RecordBuf;

use crate::io::bam as bam_io;
use crate::record::{self, SequencedRead};
use crate::util::natural::{is_sorted_by_name, natural_cmp};

/// paired, proper pair, reverse, first in pair
pub const FIRST_MATE_FLAGS: u16 = 83;
/// paired, proper pair, mate reverse, second in pair
pub const SECOND_MATE_FLAGS: u16 = 163;

pub const DEFAULT_MIN_DISTANCE: u64 = 10_000;

/// A stream of records read in order, `None` at end of stream.
pub trait RecordSource {
    type Record;
    fn next_record(&mut self) -> Result<Option<Self::Record>>;
}

pub trait RecordSink<R> {
    fn write_record(&mut self, record: &R) -> Result<()>;
}

/// Pairing fields of an alignment record. Positions are 0-based.
pub trait MateRecord: SequencedRead {
    fn reference_id(&self) -> Option<usize>;
    fn start(&self) -> Option<i64>;
    fn set_mate_info(
        &mut self,
        flags: Flags,
        mate_reference_id: Option<usize>,
        mate_start: Option<i64>,
        template_length: i64,
    );
}

impl MateRecord for RecordBuf {
    fn reference_id(&self) -> Option<usize> {
        self.reference_sequence_id()
    }

    fn start(&self) -> Option<i64> {
        self.alignment_start().map(|p| usize::from(p) as i64 - 1)
    }

    fn set_mate_info(
        &mut self,
        flags: Flags,
        mate_reference_id: Option<usize>,
        mate_start: Option<i64>,
        template_length: i64,
    ) {
        *self.flags_mut() = flags;
        *self.mate_reference_sequence_id_mut() = mate_reference_id;
        *self.mate_alignment_start_mut() =
            mate_start.and_then(|s| usize::try_from(s + 1).ok()).and_then(Position::new);
        *self.template_length_mut() = template_length as i32;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PairOpt {
    /// Mates must be strictly farther apart than this to be emitted.
    pub min_distance: u64,
    /// Overwrite an existing output file.
    pub force: bool,
}

impl Default for PairOpt {
    fn default() -> Self {
        Self { min_distance: DEFAULT_MIN_DISTANCE, force: false }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PairStats {
    pub records_read1: u64,
    pub records_read2: u64,
    pub skipped1: u64,
    pub skipped2: u64,
    pub names_matched: u64,
    pub pairs_emitted: u64,
    pub rejected_distance: u64,
    pub rejected_reference: u64,
}

/// Reference name tables of the two inputs, so that reference ids from
/// different headers can be compared by name.
#[derive(Clone, Debug, Default)]
pub struct ReferenceNames {
    pub first: Vec<Vec<u8>>,
    pub second: Vec<Vec<u8>>,
}

impl ReferenceNames {
    pub fn same_reference(&self, id1: Option<usize>, id2: Option<usize>) -> bool {
        match (id1.and_then(|i| self.first.get(i)), id2.and_then(|i| self.second.get(i))) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Advance1,
    Advance2,
    Compare,
    EmitPair,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Eligibility {
    Eligible,
    TooClose,
    NotSameReference,
}

// Names of a stream must never decrease under `natural_cmp`.
#[derive(Default)]
struct SortCheck {
    last: Option<Vec<u8>>,
}

impl SortCheck {
    fn observe(&mut self, stream: u8, name: &[u8]) {
        if cfg!(debug_assertions) {
            if let Some(prev) = &self.last {
                debug_assert!(
                    is_sorted_by_name([prev.as_slice(), name]),
                    "input {} is not sorted by read name: {:?} before {:?}",
                    stream,
                    String::from_utf8_lossy(prev),
                    String::from_utf8_lossy(name)
                );
            }
            self.last = Some(name.to_vec());
        }
    }
}

/// 归并配对状态机。
///
/// 前置条件：两个输入都必须已按 [`natural_cmp`] 排序（如 `samtools sort -n`）。
/// 算法不检查这一点（debug 构建下会断言），乱序输入会静默地漏配或错配。
///
/// 任一输入耗尽即停止，另一输入中剩余的记录不会被读取或输出。
pub struct MergePairer<S1, S2>
where
    S1: RecordSource,
    S2: RecordSource,
{
    src1: S1,
    src2: S2,
    refs: ReferenceNames,
    opt: PairOpt,
    cur1: Option<S1::Record>,
    cur2: Option<S2::Record>,
    check1: SortCheck,
    check2: SortCheck,
    stats: PairStats,
}

impl<S1, S2, R> MergePairer<S1, S2>
where
    S1: RecordSource<Record = R>,
    S2: RecordSource<Record = R>,
    R: MateRecord,
{
    pub fn new(src1: S1, src2: S2, refs: ReferenceNames, opt: PairOpt) -> Self {
        Self {
            src1,
            src2,
            refs,
            opt,
            cur1: None,
            cur2: None,
            check1: SortCheck::default(),
            check2: SortCheck::default(),
            stats: PairStats::default(),
        }
    }

    /// Run to completion, writing every eligible pair (first mate, then second) to `sink`.
    pub fn run<W: RecordSink<R>>(mut self, sink: &mut W) -> Result<PairStats> {
        // prefetch one record per stream
        self.advance1()?;
        self.advance2()?;
        let mut state = self.next_state();

        loop {
            state = match state {
                State::Advance1 => {
                    self.stats.skipped1 += 1;
                    self.advance1()?;
                    self.next_state()
                }
                State::Advance2 => {
                    self.stats.skipped2 += 1;
                    self.advance2()?;
                    self.next_state()
                }
                State::Compare => match (&self.cur1, &self.cur2) {
                    (Some(r1), Some(r2)) => match natural_cmp(r1.pair_name(), r2.pair_name()) {
                        Ordering::Less => State::Advance1,
                        Ordering::Greater => State::Advance2,
                        Ordering::Equal => State::EmitPair,
                    },
                    _ => State::Done,
                },
                State::EmitPair => {
                    self.stats.names_matched += 1;
                    self.emit_pair(sink)?;
                    self.advance1()?;
                    self.advance2()?;
                    self.next_state()
                }
                State::Done => break,
            };
        }

        Ok(self.stats)
    }

    fn next_state(&self) -> State {
        if self.cur1.is_some() && self.cur2.is_some() {
            State::Compare
        } else {
            State::Done
        }
    }

    fn advance1(&mut self) -> Result<()> {
        self.cur1 = self.src1.next_record()?;
        if let Some(r) = &self.cur1 {
            self.stats.records_read1 += 1;
            self.check1.observe(1, r.pair_name());
        }
        Ok(())
    }

    fn advance2(&mut self) -> Result<()> {
        self.cur2 = self.src2.next_record()?;
        if let Some(r) = &self.cur2 {
            self.stats.records_read2 += 1;
            self.check2.observe(2, r.pair_name());
        }
        Ok(())
    }

    fn eligibility(&self, r1: &R, r2: &R) -> Eligibility {
        let mapped = !r1.read_flags().is_unmapped() && !r2.read_flags().is_unmapped();
        if !mapped || !self.refs.same_reference(r1.reference_id(), r2.reference_id()) {
            return Eligibility::NotSameReference;
        }
        match (r1.start(), r2.start()) {
            (Some(p1), Some(p2)) if (p1 - p2).unsigned_abs() > self.opt.min_distance => {
                Eligibility::Eligible
            }
            (Some(_), Some(_)) => Eligibility::TooClose,
            _ => Eligibility::NotSameReference,
        }
    }

    fn emit_pair<W: RecordSink<R>>(&mut self, sink: &mut W) -> Result<()> {
        let (Some(r1), Some(r2)) = (self.cur1.as_ref(), self.cur2.as_ref()) else {
            return Ok(());
        };
        match self.eligibility(r1, r2) {
            Eligibility::Eligible => {}
            Eligibility::TooClose => {
                self.stats.rejected_distance += 1;
                debug!("{}: mates too close", String::from_utf8_lossy(r1.pair_name()));
                return Ok(());
            }
            Eligibility::NotSameReference => {
                self.stats.rejected_reference += 1;
                debug!("{}: mates not on the same reference", String::from_utf8_lossy(r1.pair_name()));
                return Ok(());
            }
        }

        let (Some(r1), Some(r2)) = (self.cur1.as_mut(), self.cur2.as_mut()) else {
            return Ok(());
        };
        let (id1, id2) = (r1.reference_id(), r2.reference_id());
        // eligibility guarantees both starts are present
        let (p1, p2) = (r1.start().unwrap_or(0), r2.start().unwrap_or(0));
        r1.set_mate_info(Flags::from(FIRST_MATE_FLAGS), id2, Some(p2), p1 - p2);
        r2.set_mate_info(Flags::from(SECOND_MATE_FLAGS), id1, Some(p1), p2 - p1);

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "{}: paired {} / {}, insert size {}",
                String::from_utf8_lossy(r1.pair_name()),
                record::cigar_string(&*r1)?,
                record::cigar_string(&*r2)?,
                p1 - p2
            );
        }

        sink.write_record(r1)?;
        sink.write_record(r2)?;
        self.stats.pairs_emitted += 1;
        Ok(())
    }
}

/// 读取两个按名称排序的 BAM，输出满足距离条件的 mate 配对到 `output`。
///
/// 输出头部沿用第一个输入的头部。
pub fn pair_mates_with_opt(input1: &str, input2: &str, output: &str, opt: PairOpt) -> Result<PairStats> {
    bam_io::check_output(output, opt.force)?;
    let src1 = bam_io::open_source(input1)?;
    let src2 = bam_io::open_source(input2)?;

    let refs = ReferenceNames {
        first: bam_io::reference_names(src1.header()),
        second: bam_io::reference_names(src2.header()),
    };
    let mut sink = bam_io::BamSink::create(output, src1.header().clone())?;

    info!("pairing '{}' with '{}' (min distance {})", input1, input2, opt.min_distance);
    let stats = MergePairer::new(src1, src2, refs, opt).run(&mut sink)?;
    sink.finish()?;

    info!(
        "read {} + {} records, {} names matched, {} pairs written to '{}'",
        stats.records_read1, stats.records_read2, stats.names_matched, stats.pairs_emitted, output
    );
    info!(
        "rejected {} pairs closer than {} bp, {} on different references or unmapped",
        stats.rejected_distance, opt.min_distance, stats.rejected_reference
    );
    Ok(stats)
}
