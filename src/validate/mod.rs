use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use crate::export::webapp::REQUIRED;
use crate::telemetry::{self};
use crate::telemetry::emit::Meta;
use crate::telemetry::ops::validate::Phase as ValidatePhase;

pub mod checks;

#[derive(Args, Debug)]
pub struct ValidateCmd {
    /// Exported CSV to inspect
    pub csv: PathBuf,
    /// Required columns (comma-separated); defaults to the import keys
    #[arg(long, value_delimiter = ',')]
    pub require: Vec<String>,
}

pub async fn run(args: ValidateCmd) -> Result<()> {
    let log = telemetry::validate();
    let _g = log.root_span_kv([("csv", args.csv.display().to_string())]).entered();
    let t0 = Instant::now();

    let required: Vec<String> = if args.require.is_empty() {
        REQUIRED.iter().map(|s| s.to_string()).collect()
    } else {
        args.require.clone()
    };

    let bytes = {
        let _s = log.span(&ValidatePhase::Read).entered();
        tokio::fs::read(&args.csv).await.with_context(|| format!("reading {}", args.csv.display()))?
    };
    let findings = {
        let _s = log.span(&ValidatePhase::Check).entered();
        checks::inspect(&bytes, &required).with_context(|| format!("parsing {}", args.csv.display()))?
    };

    log.info(format!("🔎 {} — rows={} columns={}", args.csv.display(), findings.rows, findings.columns));
    if findings.utf8_valid { log.info("✅ encoding: UTF-8"); } else { log.warn("⚠️ encoding: not valid UTF-8"); }
    if findings.cr_count == 0 { log.info("✅ line endings: LF only"); }
    else { log.warn(format!("⚠️ line endings: {} carriage return(s)", findings.cr_count)); }

    for f in &findings.required {
        if f.missing_column {
            log.warn(format!("❌ {}: MISSING COLUMN", f.field));
        } else if f.blank > 0 {
            let samples: Vec<String> = f.sample_rows.iter().map(|r| r.to_string()).collect();
            log.warn(format!("⚠️ {}: {} blank value(s), e.g. rows {}", f.field, f.blank, samples.join(", ")));
        } else {
            log.info(format!("✅ {}: no blanks", f.field));
        }
    }
    for n in &findings.non_printable {
        log.warn(format!("⚠️ {}: non-printable {} in {} row(s), first at row {}", n.column, n.chars.join(" "), n.rows, n.first_row));
    }
    if findings.is_clean() { log.info("🎉 file looks import-ready"); }

    if telemetry::config::json_mode() {
        log.result(&findings, Some(Meta { duration_ms: Some(t0.elapsed().as_millis()), run_id: None }))?;
    }
    Ok(())
}
