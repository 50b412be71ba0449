//! BAM 4-bit 碱基编码与 Phred+33 质量值的解码。

/// BAM nibble code space, index = 4-bit code.
pub const CODE_ALPHABET: &[u8; 16] = b"=ACMGRSVTWYHKDBN";

/// Phred+33 (Sanger / Illumina 1.8+) offset.
pub const PHRED_OFFSET: u8 = 33;

/// Highest score that still prints as a single visible ASCII byte (`~`).
pub const PHRED_MAX: u8 = 93;

/// BAM fills the quality block with this byte when the read has no qualities (SAM `*`).
pub const MISSING_QUALITY: u8 = 0xFF;

/// 正链查表：{1:A, 2:C, 4:G, 8:T, 15:N}，其余编码一律为 N。
#[inline]
pub fn base_for_code(code: u8) -> u8 {
    match code {
        1 => b'A',
        2 => b'C',
        4 => b'G',
        8 => b'T',
        15 => b'N',
        _ => b'N',
    }
}

/// 互补查表：{1:T, 2:G, 4:C, 8:A, 15:N}，其余编码一律为 N。
#[inline]
pub fn complement_for_code(code: u8) -> u8 {
    match code {
        1 => b'T',
        2 => b'G',
        4 => b'C',
        8 => b'A',
        15 => b'N',
        _ => b'N',
    }
}

/// Inverse of [`CODE_ALPHABET`]; unknown letters map to 15 (N).
#[inline]
pub fn code_for_base(b: u8) -> u8 {
    let up = b.to_ascii_uppercase();
    CODE_ALPHABET
        .iter()
        .position(|&c| c == up)
        .map(|i| i as u8)
        .unwrap_or(15)
}

/// Split packed BAM sequence bytes (high nibble first) into one code per base.
pub fn unpack_codes(packed: &[u8], len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    for &byte in packed {
        if out.len() == len {
            break;
        }
        out.push(byte >> 4);
        if out.len() < len {
            out.push(byte & 0x0F);
        }
    }
    out
}

/// 将 4-bit 编码序列解码为碱基字符串。
///
/// `is_reverse` 为 true 时按互补表解码并整体反转，即得到反向互补序列，
/// 与比对到负链的 read 的原始测序方向一致。
pub fn decode_sequence(codes: &[u8], is_reverse: bool) -> String {
    let bases: Vec<u8> = if is_reverse {
        codes.iter().rev().map(|&c| complement_for_code(c)).collect()
    } else {
        codes.iter().map(|&c| base_for_code(c)).collect()
    };
    // every byte produced above is ASCII
    bases.into_iter().map(char::from).collect()
}

/// 原始 Phred 质量值 +33 转为可打印字节；负链 read 同时反转顺序以对齐碱基。
///
/// 每个质量值恰好输出一个字节，超过 [`PHRED_MAX`] 的值截断为 `~`。
pub fn decode_quality(raw: &[u8], is_reverse: bool) -> Vec<u8> {
    let shift = |&q: &u8| q.min(PHRED_MAX) + PHRED_OFFSET;
    if is_reverse {
        raw.iter().rev().map(shift).collect()
    } else {
        raw.iter().map(shift).collect()
    }
}

/// True when a read of `len` bases carries no quality scores: either none
/// were stored or the whole block is [`MISSING_QUALITY`].
pub fn is_missing_quality(raw: &[u8], len: usize) -> bool {
    len > 0 && (raw.is_empty() || raw.iter().all(|&q| q == MISSING_QUALITY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_forward_codes() {
        assert_eq!(decode_sequence(&[1, 2, 4, 8, 15], false), "ACGTN");
    }

    #[test]
    fn decode_reverse_codes() {
        assert_eq!(decode_sequence(&[1, 2, 4, 8, 15], true), "NACGT");
        // A,A,C,G -> complement T,T,G,C -> reversed C,G,T,T
        assert_eq!(decode_sequence(&[1, 1, 2, 4], true), "CGTT");
    }

    #[test]
    fn unknown_codes_fall_back_to_n() {
        assert_eq!(decode_sequence(&[0, 3, 5, 9], false), "NNNN");
        assert_eq!(decode_sequence(&[0, 3, 5, 9], true), "NNNN");
    }

    #[test]
    fn decode_keeps_length() {
        let codes = vec![1u8; 151];
        assert_eq!(decode_sequence(&codes, false).len(), 151);
        assert_eq!(decode_sequence(&codes, true).len(), 151);
        assert_eq!(decode_sequence(&[], true), "");
    }

    #[test]
    fn quality_offsets_by_33() {
        assert_eq!(decode_quality(&[0], false), b"!");
        assert_eq!(decode_quality(&[40], false), b"I");
        assert_eq!(decode_quality(&[0, 10, 40], false), b"!+I");
        assert_eq!(decode_quality(&[0, 10, 40], true), b"I+!");
    }

    #[test]
    fn quality_is_one_printable_byte_per_base() {
        let q = decode_quality(&[93, 94, 200, 255], false);
        assert_eq!(q, b"~~~~");
        assert!(q.iter().all(|b| (b'!'..=b'~').contains(b)));
        assert_eq!(decode_quality(&[94, 0], true), b"!~");
    }

    #[test]
    fn missing_quality_detection() {
        assert!(is_missing_quality(&[0xFF; 4], 4));
        assert!(is_missing_quality(&[], 4));
        assert!(!is_missing_quality(&[], 0));
        assert!(!is_missing_quality(&[0xFF, 30], 2));
        assert!(!is_missing_quality(&[0, 0], 2));
    }

    #[test]
    fn unpack_odd_length() {
        // A C | G T | N pad
        let packed = [0x12, 0x48, 0xF0];
        assert_eq!(unpack_codes(&packed, 5), vec![1, 2, 4, 8, 15]);
        assert_eq!(unpack_codes(&packed, 4), vec![1, 2, 4, 8]);
        assert!(unpack_codes(&[], 0).is_empty());
    }

    #[test]
    fn code_for_base_roundtrips_alphabet() {
        for (i, &b) in CODE_ALPHABET.iter().enumerate() {
            assert_eq!(code_for_base(b) as usize, i);
        }
        assert_eq!(code_for_base(b'a'), 1);
        assert_eq!(code_for_base(b'?'), 15);
    }
}
