//! Benchmark support for Trellis.
//!
//! Provides the synthetic lineitem-style workload generator shared by the
//! criterion benches and the CLI's `bench` subcommand.

pub mod data;
