// Library exports for synpost
pub mod cluster_out;
pub mod config;
pub mod engine;
pub mod fasta;
pub mod mgaps;
pub mod offsets;
pub mod remap;
pub mod synteny;
