//! PGDB maintenance CLI.
//!
//! Drives the prime database engine from the command line: status
//! display, batch generation, queries, shard merge, raw import/export.
//!
//! Usage:
//!   pgdb <db-path> <command> [args]
//!
//! Commands:
//!   status [--json]          Show database status
//!   run <count>              Generate <count> new primes (SIGINT checkpoints and exits)
//!   nth <n>                  Print the nth prime (1-based)
//!   gaps <block-size>        Print average-gap blocks as CSV rows
//!   density <grid-size>      Count primes below grid-size^2
//!   merge <shard>...         Replace the database with concatenated shard files
//!   export <out-file>        Write the raw encoded database to a file
//!   import <in-file>         Replace the database with a raw encoded file

use std::path::PathBuf;

use anyhow::{bail, Context};
use pgdb::{CancelToken, PrimeDb};

fn print_usage() {
    eprintln!("Usage: pgdb <db-path> <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status [--json]          Show database status");
    eprintln!("  run <count>              Generate <count> new primes");
    eprintln!("  nth <n>                  Print the nth prime (1-based)");
    eprintln!("  gaps <block-size>        Print average-gap blocks as CSV rows");
    eprintln!("  density <grid-size>      Count primes below grid-size^2");
    eprintln!("  merge <shard>...         Replace the database with concatenated shards");
    eprintln!("  export <out-file>        Write the raw encoded database to a file");
    eprintln!("  import <in-file>         Replace the database with a raw encoded file");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  -V, --version  Print version information");
    eprintln!("  -h, --help     Print this help message");
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("pgdb {}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("pgdb {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Append-only prime gap database engine");
        println!();
        print_usage();
        std::process::exit(0);
    }

    if args.len() < 3 {
        print_usage();
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("[pgdb] error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> anyhow::Result<()> {
    let db_path = PathBuf::from(&args[1]);
    if args[1].starts_with("--") {
        bail!("db-path '{}' looks like a flag, not a path", args[1]);
    }
    let command = args[2].as_str();
    let rest = &args[3..];

    let mut db = PrimeDb::open(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;

    match command {
        "status" => {
            let status = db.status();
            if rest.iter().any(|a| a == "--json") {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("primes:         {}", status.prime_count);
                println!("highest prime:  {}", status.highest_prime);
                println!("next candidate: {}", status.next_candidate);
                println!("encoded bytes:  {}", status.encoded_bytes);
            }
        }
        "run" => {
            let target: usize = parse_arg(rest, 0, "count")?;
            let cancel = CancelToken::new();
            // SIGINT/SIGTERM flip the token; the batch finishes the
            // current candidate, checkpoints and returns.
            signal_hook::flag::register(signal_hook::consts::SIGINT, cancel.flag())?;
            signal_hook::flag::register(signal_hook::consts::SIGTERM, cancel.flag())?;

            eprintln!(
                "[pgdb] generating {} primes from candidate {}",
                target,
                db.next_candidate()
            );
            let step = (target / 10).max(1);
            let outcome = db.run_batch(target, &cancel, |p| {
                if p.appended % step == 0 || p.appended == p.target {
                    eprintln!(
                        "[pgdb] {}/{} ({:.0}%)",
                        p.appended,
                        p.target,
                        p.fraction() * 100.0
                    );
                }
            })?;
            if outcome.completed {
                eprintln!(
                    "[pgdb] batch complete: {} primes appended, highest checked {}",
                    outcome.appended, outcome.highest_checked
                );
            } else {
                eprintln!(
                    "[pgdb] batch cancelled after {} primes; progress checkpointed",
                    outcome.appended
                );
            }
            println!("{}", db.highest_known());
        }
        "nth" => {
            let n: u64 = parse_arg(rest, 0, "n")?;
            match db.nth_prime(n) {
                Ok(p) => println!("{p}"),
                Err(e) => bail!("{} ({})", e, e.code()),
            }
        }
        "gaps" => {
            let block_size: usize = parse_arg(rest, 0, "block-size")?;
            println!("start_index,average_gap");
            for block in db.average_gap_per_block(block_size) {
                println!("{},{}", block.start_index, block.average_gap);
            }
        }
        "density" => {
            let size: u64 = parse_arg(rest, 0, "grid-size")?;
            let limit = size
                .checked_mul(size)
                .ok_or_else(|| anyhow::anyhow!("grid-size {size} squared overflows u64"))?;
            let set = db.density_below(limit);
            println!("{} primes <= {}", set.len(), limit);
        }
        "merge" => {
            if rest.is_empty() {
                bail!("merge requires at least one shard file");
            }
            let mut shards = Vec::with_capacity(rest.len());
            for path in rest {
                shards.push(
                    std::fs::read(path).with_context(|| format!("reading shard {path}"))?,
                );
            }
            let count = db.merge_shards(&shards)?;
            eprintln!("[pgdb] merged {} shards: {} primes", rest.len(), count);
        }
        "export" => {
            let out = rest
                .first()
                .ok_or_else(|| anyhow::anyhow!("export requires an output file"))?;
            std::fs::write(out, db.export_raw())
                .with_context(|| format!("writing {out}"))?;
            eprintln!("[pgdb] exported to {out}");
        }
        "import" => {
            let input = rest
                .first()
                .ok_or_else(|| anyhow::anyhow!("import requires an input file"))?;
            let bytes =
                std::fs::read(input).with_context(|| format!("reading {input}"))?;
            let count = db.import_raw(&bytes)?;
            eprintln!("[pgdb] imported {input}: {count} primes");
        }
        other => {
            bail!("unknown command '{other}'");
        }
    }

    Ok(())
}

fn parse_arg<T: std::str::FromStr>(rest: &[String], idx: usize, name: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    rest.get(idx)
        .ok_or_else(|| anyhow::anyhow!("missing argument <{name}>"))?
        .parse()
        .with_context(|| format!("invalid <{name}>"))
}
