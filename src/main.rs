/*!
 * Command-line interface for ClipTree
 */

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

use cliptree::config::{Args, Config};
use cliptree::error::ClipTreeError;
use cliptree::logger::init_logger;
use cliptree::pipeline::{build_bundle, deliver};
use cliptree::report::{ReportFormat, Reporter};
use cliptree::SystemClipboard;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "cliptree", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    init_logger(args.verbose, args.quiet);

    let config = Config::from_args(args);
    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let progress = if config.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len}")
        {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    };
    progress.set_prefix("📂 Reading");

    let result = build_bundle(&config, Arc::new(progress.clone()));
    progress.finish_and_clear();

    let bundle = match result {
        Ok(bundle) => bundle,
        Err(ClipTreeError::NoContent) => {
            eprintln!("No valid files to copy.");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let destination = match deliver(&bundle, &config, &SystemClipboard) {
        Ok(destination) => destination,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.clip {
        eprintln!("Contents copied to clipboard successfully.");
    }

    if !config.quiet {
        let reporter = Reporter::new(ReportFormat::ConsoleTable);
        reporter.print_report(&bundle.report(destination));
    }

    ExitCode::SUCCESS
}
