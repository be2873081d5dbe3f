use anyhow::{Context, Result};
use chrono::{Datelike, Local, Offset, TimeZone};
use clap::Parser;

use datephrase::{DaylightRule, Reference};

/// Resolve date expressions against the local clock and print each result
/// as seconds since the Unix epoch.
#[derive(Parser)]
#[command(name = "datephrase", version, about)]
struct Args {
    /// Date expressions, one per argument.
    #[arg(required = true)]
    expressions: Vec<String>,
}

fn east_seconds(instant: i64) -> Option<i64> {
    Local
        .timestamp_opt(instant, 0)
        .single()
        .map(|dt| i64::from(dt.offset().fix().local_minus_utc()))
}

/// Standard-time seconds east of UTC for the local zone, taken as the
/// smaller of the midwinter and midsummer offsets.
fn standard_east_seconds() -> Option<i64> {
    let year = Local::now().year();
    let sample = |month| {
        Local
            .with_ymd_and_hms(year, month, 1, 12, 0, 0)
            .single()
            .map(|dt| i64::from(dt.offset().fix().local_minus_utc()))
    };
    Some(sample(1)?.min(sample(7)?))
}

fn local_daylight(instant: i64) -> bool {
    match (east_seconds(instant), standard_east_seconds()) {
        (Some(at), Some(standard)) => at > standard,
        _ => false,
    }
}

fn local_reference() -> Result<Reference> {
    let now = Local::now();
    let standard = standard_east_seconds().context("cannot read the local zone offset")?;
    Ok(Reference::with_daylight_rule(
        now.timestamp(),
        -standard / 60,
        DaylightRule::Lookup(local_daylight),
    ))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let reference = local_reference()?;

    let mut failed = false;
    for expr in &args.expressions {
        if expr == "now" {
            println!("{}", reference.instant);
            continue;
        }
        match datephrase::resolve(expr, &reference) {
            Ok(t) => println!("{t}"),
            Err(_) => {
                eprintln!("datephrase: `{expr}' not a valid date");
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
    Ok(())
}
