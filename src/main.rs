use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use laz_triage::pipeline::TriagePipeline;

#[derive(Parser)]
#[command(
    name = "laz-triage",
    version,
    about = "Audits a LAS/LAZ tree for misclassified ground points, reports corrupt files, \
             and quarantines offenders into <root>/orig/"
)]
struct Cli {
    /// Base directory to audit
    root: PathBuf,
}

fn main() {
    // Diagnostics go to stderr; per-file outcome lines stay on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,laz_triage=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let code = match TriagePipeline::new().run(&cli.root) {
        Ok(summary) => {
            println!(
                "scanned {} files: {} clean, {} misclassified, {} unreadable",
                summary.files_scanned,
                summary.clean_count,
                summary.misclassified_count,
                summary.unreadable_count
            );
            if summary.misclassified_count > 0 {
                println!(
                    "quarantined {} files ({} renamed, {} skipped)",
                    summary.quarantined_count, summary.renamed_count, summary.skipped_count
                );
            }
            for error in &summary.quarantine_errors {
                eprintln!("quarantine failure: {error}");
            }
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("usage: laz-triage <base directory>");
            1
        }
    };
    std::process::exit(code);
}
