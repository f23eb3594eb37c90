//! Synthetic TPC-H-flavoured data generation.
//!
//! Generates deterministic row containers from a seed so benchmark runs
//! and CLI bench invocations are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use trellis_common::{DataType, FormatType, Schema, Value};
use trellis_format::{RecordBuilder, RootBuilder};

/// Textual schema of the synthetic lineitem table.
pub const LINEITEM_SCHEMA: &str = "0 4 1 0 ORDERKEY\n\
                                   1 3 0 0 LINENUMBER\n\
                                   2 13 0 0 EXTENDEDPRICE\n\
                                   3 13 0 0 DISCOUNT\n\
                                   4 14 0 1 SHIPDATE\n\
                                   5 15 0 1 COMMENT\n";

/// Upper bound (exclusive) of generated EXTENDEDPRICE values.
///
/// Prices are uniform in `[0, PRICE_RANGE)`, which makes a selectivity
/// target a simple threshold computation.
pub const PRICE_RANGE: f64 = 100_000.0;

const COMMENT_WORDS: &[&str] = &[
    "carefully", "quickly", "final", "pending", "regular", "express", "ironic", "even",
    "special", "bold",
];

/// Returns the parsed lineitem schema.
pub fn lineitem_schema() -> Schema {
    Schema::from_string(LINEITEM_SCHEMA).expect("static schema parses")
}

/// Predicate threshold selecting roughly `selectivity` of generated rows
/// with `EXTENDEDPRICE,gt,<threshold>`.
pub fn price_threshold(selectivity: f64) -> f64 {
    (1.0 - selectivity.clamp(0.0, 1.0)) * PRICE_RANGE
}

fn random_date(rng: &mut StdRng) -> String {
    let year = rng.gen_range(1992..=1998);
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=28);
    format!("{year:04}-{month:02}-{day:02}")
}

fn random_comment(rng: &mut StdRng) -> String {
    let n = rng.gen_range(2..=5);
    (0..n)
        .map(|_| COMMENT_WORDS[rng.gen_range(0..COMMENT_WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generates one serialized row container with `num_rows` records.
///
/// Record ids start at `first_rid`; roughly 2% of comments are null.
pub fn generate_container(num_rows: u32, first_rid: i64, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut root = RootBuilder::new(FormatType::Row, LINEITEM_SCHEMA, "tpch", "LINEITEM");

    for i in 0..num_rows {
        let rid = first_rid + i64::from(i);
        let mut rec = RecordBuilder::new(rid);
        rec.append(&Value::Int64(rid), DataType::Int64).unwrap();
        rec.append(&Value::Int32(rng.gen_range(1..=7)), DataType::Int32)
            .unwrap();
        rec.append(
            &Value::Double(rng.gen_range(0.0..PRICE_RANGE)),
            DataType::Double,
        )
        .unwrap();
        rec.append(&Value::Double(rng.gen_range(0.0..0.1)), DataType::Double)
            .unwrap();
        rec.append(&Value::Date(random_date(&mut rng)), DataType::Date)
            .unwrap();
        if rng.gen_bool(0.02) {
            rec.set_nullbit(5);
            rec.append(&Value::Null, DataType::String).unwrap();
        } else {
            rec.append(&Value::Str(random_comment(&mut rng)), DataType::String)
                .unwrap();
        }
        root.push(rec, false);
    }
    root.finish()
}

/// Generates a sharded workload: `num_rows` records split into objects of
/// `rows_per_obj` records each.
pub fn generate_objects(num_rows: u32, rows_per_obj: u32, seed: u64) -> Vec<Vec<u8>> {
    assert!(rows_per_obj > 0, "rows_per_obj must be positive");
    let mut objects = Vec::new();
    let mut first_rid = 0i64;
    let mut remaining = num_rows;
    while remaining > 0 {
        let n = remaining.min(rows_per_obj);
        objects.push(generate_container(n, first_rid, seed ^ first_rid as u64));
        first_rid += i64::from(n);
        remaining -= n;
    }
    objects
}
