//! # bam-mates
//!
//! Hi-C / 双端测序 BAM 处理工具集。
//!
//! 本 crate 提供两类功能：
//!
//! - **解码**：将 BAM 中 4-bit 打包的碱基与原始质量值解码为文本，
//!   负链 read 自动输出反向互补（`extract` 子命令）
//! - **配对**：同步推进两个按名称排序的 BAM，重建拆分比对的 mate 关系，
//!   输出距离超过阈值的配对（`pair` 子命令）
//!
//! ## 快速示例
//!
//! ```rust
//! use std::cmp::Ordering;
//! use bam_mates::util::{dna, natural};
//!
//! // A,A,C,G 在负链上解码为反向互补 C,G,T,T
//! assert_eq!(dna::decode_sequence(&[1, 1, 2, 4], true), "CGTT");
//! assert_eq!(dna::decode_quality(&[0, 40], false), b"!I");
//!
//! // 数字串按数值比较
//! assert_eq!(natural::natural_cmp(b"read2", b"read10"), Ordering::Less);
//! ```
//!
//! ## 模块说明
//!
//! - [`util`] — 4-bit 碱基解码、质量值编码、自然序比较
//! - [`record`] — 记录视图：显示名、lane、CIGAR、序列/质量解码
//! - [`io`] — BAM 读写（noodles）与文本/FASTQ 输出
//! - [`extract`] — BAM → 文本/FASTQ
//! - [`pair`] — 双输入归并配对

pub mod io;
pub mod util;
pub mod record;
pub mod extract;
pub mod pair;
