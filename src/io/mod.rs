pub mod bam;
pub mod fastq;
