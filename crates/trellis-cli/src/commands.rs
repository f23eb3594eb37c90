//! Subcommand implementations.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use trellis_bench::data::{generate_objects, lineitem_schema, price_threshold};
use trellis_format::{columnar_to_row, row_to_columnar, RootView, Table};
use trellis_query::print::{columnar_as_csv, format_row_container, row_container_as_csv, CsvOptions};
use trellis_query::{preds_from_string, process_columnar, process_rows, Schema};

use trellis_common::constants::META_DATA_SCHEMA;

/// Renders a container file.
pub fn print_container(
    input: &Path,
    columnar: bool,
    header: bool,
    dump: bool,
    max_rows: u64,
) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

    if dump {
        if columnar {
            bail!("--dump is only supported for row containers");
        }
        print!("{}", format_row_container(&bytes)?);
        return Ok(());
    }

    let opts = CsvOptions {
        header,
        verbose: false,
        max_rows,
    };
    let (text, printed) = if columnar {
        columnar_as_csv(&bytes, &opts)?
    } else {
        row_container_as_csv(&bytes, &opts)?
    };
    print!("{text}");
    info!(printed, "rendered container");
    Ok(())
}

fn table_schema_of(bytes: &[u8], columnar: bool) -> Result<Schema> {
    let text = if columnar {
        let table = Table::from_buffer(bytes)?;
        table
            .metadata_value(META_DATA_SCHEMA)
            .context("columnar container lacks a data schema")?
            .to_string()
    } else {
        RootView::decode(bytes)?.data_schema
    };
    Ok(Schema::from_string(&text)?)
}

/// Runs one pushdown scan and prints or writes the result container.
pub fn scan(
    input: &Path,
    project: &str,
    select: &str,
    columnar: bool,
    output: Option<&Path>,
) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

    let tbl_schema = table_schema_of(&bytes, columnar)?;
    let query_schema = Schema::from_colnames(&tbl_schema, project);
    if query_schema.is_empty() {
        bail!("projection {project:?} matches no columns");
    }

    let result = if columnar {
        if select.trim() != "*" && !select.trim().is_empty() {
            bail!("predicates are not supported on columnar containers");
        }
        process_columnar(&tbl_schema, &query_schema, &bytes)?
    } else {
        let mut preds = preds_from_string(&tbl_schema, select)?;
        let out = process_rows(&tbl_schema, &query_schema, &mut preds, &bytes, None)?;
        if let Some(code) = out.errcode {
            warn!(?code, "scan finished with errors: {}", out.errmsg);
        }
        info!(rows_out = out.rows_out, "scan complete");
        out.buffer
    };

    match output {
        Some(path) => {
            fs::write(path, &result).with_context(|| format!("writing {}", path.display()))?;
        }
        None => {
            let opts = CsvOptions::default();
            let (text, _) = if columnar {
                columnar_as_csv(&result, &opts)?
            } else {
                row_container_as_csv(&result, &opts)?
            };
            print!("{text}");
        }
    }
    Ok(())
}

/// Converts between the row and columnar layouts.
pub fn transform(input: &Path, output: &Path, to_columnar: bool) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

    let result = if to_columnar {
        row_to_columnar(&bytes)?.to_buffer()
    } else {
        let table = Table::from_buffer(&bytes)?;
        columnar_to_row(&table)?
    };

    fs::write(output, &result).with_context(|| format!("writing {}", output.display()))?;
    info!(
        from = %input.display(),
        to = %output.display(),
        bytes = result.len(),
        "transform complete"
    );
    Ok(())
}

/// Generates a sharded synthetic workload and times a filtered scan.
pub fn bench(
    num_rows: u32,
    rows_per_obj: u32,
    range_size: u32,
    selectivity: f64,
    pool: &str,
) -> Result<()> {
    if rows_per_obj == 0 {
        bail!("--rows-per-obj must be positive");
    }

    let schema = lineitem_schema();
    let query = Schema::from_colnames(&schema, "ORDERKEY,EXTENDEDPRICE");
    let pred_str = format!(";EXTENDEDPRICE,gt,{}", price_threshold(selectivity));

    let objects = generate_objects(num_rows, rows_per_obj, 42);
    info!(objects = objects.len(), num_rows, "workload generated");

    let start = Instant::now();
    let mut rows_matched: u64 = 0;
    for object in &objects {
        let nrows = RootView::decode(object)?.nrows;
        if range_size == 0 {
            let mut preds = preds_from_string(&schema, &pred_str)?;
            let out = process_rows(&schema, &query, &mut preds, object, None)?;
            rows_matched += u64::from(out.rows_out);
        } else {
            // Index-style reads: explicit row-number ranges per request.
            let mut lo = 0u32;
            while lo < nrows {
                let hi = nrows.min(lo + range_size);
                let rnums: Vec<u32> = (lo..hi).collect();
                let mut preds = preds_from_string(&schema, &pred_str)?;
                let out = process_rows(&schema, &query, &mut preds, object, Some(&rnums))?;
                rows_matched += u64::from(out.rows_out);
                lo = hi;
            }
        }
    }
    let elapsed = start.elapsed();

    println!(
        "pool={pool} objects={} rows={num_rows} selectivity={selectivity} \
         matched={rows_matched} elapsed={:.3}s",
        objects.len(),
        elapsed.as_secs_f64()
    );
    Ok(())
}
