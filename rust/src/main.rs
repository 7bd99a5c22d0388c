use std::env;
use std::io::{self, Write};
use std::process;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use kinoid::{ID_LENGTH, IdCodec, decode, validate};

const LOG_ENV: &str = "KINOID_LOG";
const DEFAULT_BENCH_COUNT: usize = 1_000_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct EmitOpts {
    count: usize,
    json: bool,
}

fn print_help() {
    eprintln!(
        "kinoid - process-unique sortable id generator CLI\n\n\
Usage:\n  kinoid next\n  kinoid stream [--count <n>]\n  kinoid decode <id> [--json]\n  kinoid validate <id>\n  kinoid healthcheck [--json]\n  kinoid bench [--count <n>]\n\n\
Environment:\n  {LOG_ENV}=<filter>   log filter for stderr output (default: warn)\n"
    );
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_flags(args: &[String], allow_count: bool, allow_json: bool) -> Result<EmitOpts, String> {
    let mut opts = EmitOpts::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--count" if allow_count => {
                if i + 1 >= args.len() {
                    return Err("missing value for --count".to_string());
                }
                opts.count = args[i + 1]
                    .parse::<usize>()
                    .map_err(|_| "invalid integer for --count".to_string())?;
                i += 2;
            }
            "--json" if allow_json => {
                opts.json = true;
                i += 1;
            }
            _ => return Err(format!("unknown flag: {}", args[i])),
        }
    }

    Ok(opts)
}

fn new_codec() -> Result<IdCodec, String> {
    IdCodec::new().map_err(|e| e.to_string())
}

fn run_next(args: &[String]) -> Result<(), String> {
    parse_flags(args, false, false)?;
    let mut codec = new_codec()?;
    println!("{}", codec.encode().map_err(|e| e.to_string())?);
    Ok(())
}

fn run_stream(args: &[String]) -> Result<(), String> {
    let opts = parse_flags(args, true, false)?;
    let mut codec = new_codec()?;
    let mut stdout = io::stdout().lock();
    let mut emitted = 0usize;

    loop {
        if opts.count > 0 && emitted >= opts.count {
            break;
        }
        let id = codec.encode().map_err(|e| e.to_string())?;
        writeln!(stdout, "{id}").map_err(|e| e.to_string())?;
        stdout.flush().map_err(|e| e.to_string())?;
        emitted += 1;
    }

    debug!(emitted, "stream finished");
    Ok(())
}

fn run_decode(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("decode requires an id".to_string());
    }

    let id = &args[0];
    let opts = parse_flags(&args[1..], false, true)?;

    match decode(id) {
        Ok(parsed) => {
            if opts.json {
                println!(
                    "{}",
                    serde_json::to_string(&parsed).map_err(|e| e.to_string())?
                );
            } else {
                println!("id={}", parsed.id);
                println!("date={}", parsed.date.to_rfc3339());
                println!("singularity={}", parsed.singularity);
                println!("pid={}", parsed.pid);
            }
            Ok(())
        }
        Err(err) => {
            if opts.json {
                println!(
                    "{}",
                    serde_json::to_string(&err).map_err(|e| e.to_string())?
                );
            }
            Err(err.to_string())
        }
    }
}

fn run_validate(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("validate requires an id".to_string());
    }
    parse_flags(&args[1..], false, false)?;

    let ok = validate(&args[0]);
    println!("{}", if ok { "true" } else { "false" });
    if ok {
        Ok(())
    } else {
        Err("invalid kinoid".to_string())
    }
}

fn run_healthcheck(args: &[String]) -> Result<(), String> {
    let opts = parse_flags(args, false, true)?;
    let mut codec = new_codec()?;

    let first = codec.encode().map_err(|e| e.to_string())?;
    let sample = codec.encode().map_err(|e| e.to_string())?;
    let ok = first < sample
        && decode(&sample).is_ok_and(|d| d.pid == codec.pid())
        && sample.len() == ID_LENGTH;

    if opts.json {
        let payload = json!({
            "ok": ok,
            "pid": codec.pid(),
            "sample_id": sample,
        });
        println!(
            "{}",
            serde_json::to_string(&payload).map_err(|e| e.to_string())?
        );
    } else {
        println!(
            "ok={} pid={} sample={}",
            if ok { "true" } else { "false" },
            codec.pid(),
            sample
        );
    }

    if ok {
        Ok(())
    } else {
        Err("healthcheck failed".to_string())
    }
}

fn run_bench(args: &[String]) -> Result<(), String> {
    let mut opts = parse_flags(args, true, false)?;
    if opts.count == 0 {
        opts.count = DEFAULT_BENCH_COUNT;
    }

    let mut codec = new_codec()?;
    info!(count = opts.count, "bench started");

    let start = Instant::now();
    for _ in 0..opts.count {
        codec.encode().map_err(|e| e.to_string())?;
    }
    let elapsed = start.elapsed();

    let sample = codec.encode().map_err(|e| e.to_string())?;
    let decoded = decode(&sample).map_err(|e| e.to_string())?;

    let nanos = elapsed.as_nanos().max(1);
    let payload = json!({
        "impl": "rust",
        "id": sample,
        "id_length": sample.len(),
        "computed_on": decoded.date.to_rfc3339(),
        "singularity": decoded.singularity,
        "pid": decoded.pid,
        "n": opts.count,
        "elapsed_ms": elapsed.as_secs_f64() * 1000.0,
        "ns_per_op": nanos as f64 / opts.count as f64,
        "ops_per_sec": (opts.count as u128 * 1_000_000_000 / nanos) as u64,
    });
    println!(
        "{}",
        serde_json::to_string(&payload).map_err(|e| e.to_string())?
    );
    Ok(())
}

fn main() {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        print_help();
        process::exit(2);
    }

    if args[0] == "-h" || args[0] == "--help" || args[0] == "help" {
        print_help();
        return;
    }

    let cmd = args[0].as_str();
    let rest = &args[1..];

    let res = match cmd {
        "next" => run_next(rest),
        "stream" => run_stream(rest),
        "decode" | "parse" => run_decode(rest),
        "validate" => run_validate(rest),
        "healthcheck" => run_healthcheck(rest),
        "bench" => run_bench(rest),
        _ => Err(format!("unknown command: {}", cmd)),
    };

    if let Err(err) = res {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
