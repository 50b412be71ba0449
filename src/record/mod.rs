//! 比对记录的只读视图：显示名、lane、CIGAR 字符串以及序列/质量解码。

use std::io;

use noodles::bam;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::RecordBuf;

use crate::util::dna;

/// Read-level access the decoder needs, over both lazy BAM records and
/// owned record buffers.
pub trait SequencedRead {
    /// Stored read (pair) name; empty when the record has none.
    fn pair_name(&self) -> &[u8];
    fn read_flags(&self) -> Flags;
    /// Number of bases.
    fn read_length(&self) -> usize;
    /// One 4-bit code per base.
    fn base_codes(&self) -> Vec<u8>;
    /// Raw Phred scores, no offset.
    fn raw_qualities(&self) -> Vec<u8>;
    fn cigar_ops(&self) -> io::Result<Vec<Op>>;
}

impl SequencedRead for bam::Record {
    fn pair_name(&self) -> &[u8] {
        self.name().map_or(&[][..], |n| <_ as AsRef<[u8]>>::as_ref(n))
    }

    fn read_flags(&self) -> Flags {
        self.flags()
    }

    fn read_length(&self) -> usize {
        self.sequence().len()
    }

    fn base_codes(&self) -> Vec<u8> {
        let seq = self.sequence();
        dna::unpack_codes(seq.as_ref(), seq.len())
    }

    fn raw_qualities(&self) -> Vec<u8> {
        self.quality_scores().as_ref().to_vec()
    }

    fn cigar_ops(&self) -> io::Result<Vec<Op>> {
        self.cigar().iter().collect()
    }
}

impl SequencedRead for RecordBuf {
    fn pair_name(&self) -> &[u8] {
        self.name().map_or(&[][..], |n| <_ as AsRef<[u8]>>::as_ref(n))
    }

    fn read_flags(&self) -> Flags {
        self.flags()
    }

    fn read_length(&self) -> usize {
        self.sequence().len()
    }

    fn base_codes(&self) -> Vec<u8> {
        self.sequence().as_ref().iter().map(|&b| dna::code_for_base(b)).collect()
    }

    fn raw_qualities(&self) -> Vec<u8> {
        self.quality_scores().as_ref().to_vec()
    }

    fn cigar_ops(&self) -> io::Result<Vec<Op>> {
        Ok(self.cigar().as_ref().to_vec())
    }
}

/// 双端 read 在名称后追加 `/1` 或 `/2`；记录本身的名称不会被修改。
pub fn read_display_name<R: SequencedRead + ?Sized>(record: &R) -> String {
    let mut name = String::from_utf8_lossy(record.pair_name()).into_owned();
    let flags = record.read_flags();
    if flags.is_segmented() {
        name.push_str(if flags.is_first_segment() { "/1" } else { "/2" });
    }
    name
}

/// Lane number from field 1 of a colon-delimited read name, 0 when absent
/// or not numeric. Empty fields are skipped, so `INST::7` yields 7.
pub fn lane_id<R: SequencedRead + ?Sized>(record: &R) -> i32 {
    lane_from_name(record.pair_name())
}

pub fn lane_from_name(name: &[u8]) -> i32 {
    let mut fields = name.split(|&b| b == b':').filter(|f| !f.is_empty());
    match (fields.next(), fields.next()) {
        (Some(_), Some(field)) => leading_int(field),
        _ => 0,
    }
}

// sscanf("%d") semantics: optional whitespace and sign, then leading digits
fn leading_int(field: &[u8]) -> i32 {
    let s = field.trim_ascii_start();
    let (neg, digits) = match s.first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    let value = if neg { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// 解码后的碱基序列，负链 read 输出反向互补。
pub fn decoded_sequence<R: SequencedRead + ?Sized>(record: &R) -> String {
    dna::decode_sequence(&record.base_codes(), record.read_flags().is_reverse_complemented())
}

/// Phred+33 qualities in sequencing orientation, `None` when the read has none.
pub fn decoded_qualities<R: SequencedRead + ?Sized>(record: &R) -> Option<Vec<u8>> {
    let raw = record.raw_qualities();
    if dna::is_missing_quality(&raw, record.read_length()) {
        return None;
    }
    Some(dna::decode_quality(&raw, record.read_flags().is_reverse_complemented()))
}

/// CIGAR string restricted to operations that consume the read (M, I, S, =, X).
pub fn cigar_string<R: SequencedRead + ?Sized>(record: &R) -> io::Result<String> {
    let mut out = String::new();
    for op in record.cigar_ops()? {
        if let Some(c) = query_op_char(op.kind()) {
            out.push_str(&op.len().to_string());
            out.push(c);
        }
    }
    Ok(out)
}

fn query_op_char(kind: Kind) -> Option<char> {
    match kind {
        Kind::Match => Some('M'),
        Kind::Insertion => Some('I'),
        Kind::SoftClip => Some('S'),
        Kind::SequenceMatch => Some('='),
        Kind::SequenceMismatch => Some('X'),
        Kind::Deletion | Kind::Skip | Kind::HardClip | Kind::Pad => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::BString;
    use noodles::sam::alignment::record_buf::{Cigar, QualityScores, Sequence};

    fn rec(name: &str, flags: u16, seq: &[u8], qual: &[u8]) -> RecordBuf {
        RecordBuf::builder()
            .set_name(BString::from(name))
            .set_flags(Flags::from(flags))
            .set_sequence(Sequence::from(seq.to_vec()))
            .set_quality_scores(QualityScores::from(qual.to_vec()))
            .build()
    }

    #[test]
    fn display_name_unpaired_is_verbatim() {
        let r = rec("HWI:7:1101:1000:2000", 0, b"ACGT", &[30; 4]);
        assert_eq!(read_display_name(&r), "HWI:7:1101:1000:2000");
    }

    #[test]
    fn display_name_paired_suffix() {
        let r1 = rec("frag1", 0x1 | 0x40, b"A", &[30]);
        let r2 = rec("frag1", 0x1 | 0x80, b"A", &[30]);
        assert_eq!(read_display_name(&r1), "frag1/1");
        assert_eq!(read_display_name(&r2), "frag1/2");
        // stored name untouched
        assert_eq!(r1.pair_name(), b"frag1");
    }

    #[test]
    fn lane_from_structured_name() {
        assert_eq!(lane_from_name(b"INST:7:TILE:100:200"), 7);
        assert_eq!(lane_from_name(b"singlefield"), 0);
        assert_eq!(lane_from_name(b"INST:lane:3"), 0);
        assert_eq!(lane_from_name(b"INST:12abc:3"), 12);
        assert_eq!(lane_from_name(b"INST:"), 0);
        assert_eq!(lane_from_name(b""), 0);
        assert_eq!(lane_from_name(b"INST:-2"), -2);
    }

    #[test]
    fn lane_skips_empty_fields() {
        assert_eq!(lane_from_name(b"INST::7:TILE"), 7);
        assert_eq!(lane_from_name(b":INST:5"), 5);
        assert_eq!(lane_from_name(b"INST::"), 0);
    }

    #[test]
    fn lane_of_record() {
        let r = rec("M001:3:FC:1:1101:15589:1331", 0, b"A", &[30]);
        assert_eq!(lane_id(&r), 3);
    }

    #[test]
    fn reverse_read_is_reverse_complemented() {
        let fwd = rec("r", 0, b"AACG", &[10, 20, 30, 40]);
        assert_eq!(decoded_sequence(&fwd), "AACG");
        assert_eq!(decoded_qualities(&fwd).as_deref(), Some(&b"+5?I"[..]));

        let rev = rec("r", 0x10, b"AACG", &[10, 20, 30, 40]);
        assert_eq!(decoded_sequence(&rev), "CGTT");
        assert_eq!(decoded_qualities(&rev).as_deref(), Some(&b"I?5+"[..]));
    }

    #[test]
    fn absent_qualities_are_reported_missing() {
        let none = rec("r", 0, b"ACGT", &[]);
        assert_eq!(decoded_qualities(&none), None);
        let filled = rec("r", 0x10, b"ACGT", &[0xFF; 4]);
        assert_eq!(decoded_qualities(&filled), None);
        let empty = rec("r", 0, b"", &[]);
        assert_eq!(decoded_qualities(&empty), Some(Vec::new()));
    }

    #[test]
    fn decoding_is_repeatable() {
        let r = rec("r", 0x10, b"ACGTNACGTN", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let first = (decoded_sequence(&r), decoded_qualities(&r), read_display_name(&r));
        for _ in 0..3 {
            assert_eq!(first, (decoded_sequence(&r), decoded_qualities(&r), read_display_name(&r)));
        }
    }

    #[test]
    fn cigar_keeps_query_ops_only() {
        let ops = vec![
            Op::new(Kind::SoftClip, 5),
            Op::new(Kind::Match, 40),
            Op::new(Kind::Deletion, 2),
            Op::new(Kind::Insertion, 1),
            Op::new(Kind::Match, 10),
            Op::new(Kind::HardClip, 3),
        ];
        let r = RecordBuf::builder().set_cigar(Cigar::from(ops)).build();
        assert_eq!(cigar_string(&r).unwrap(), "5S40M1I10M");
    }
}
