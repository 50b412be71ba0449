pub mod dna;
pub mod natural;
