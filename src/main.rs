use std::io::Write;

use anyhow::{Context, Result};
use log::{Level, info};

use digit_classifier::{ConsoleRenderer, CsvRenderer, TrainingConfig, run};

const TRAIN_FILE: &str = "train.csv";
const TEST_FILE: &str = "test.csv";
const DIAGNOSTICS_DIR: &str = "diagnostics";

fn main() -> Result<()> {
    init_logger();

    let config = TrainingConfig::default();
    let report = run(TRAIN_FILE, TEST_FILE, &config)
        .with_context(|| format!("training on {TRAIN_FILE} / {TEST_FILE} failed"))?;

    report
        .render(&mut ConsoleRenderer::stdout())
        .context("failed to print diagnostics")?;

    let mut csv = CsvRenderer::new(DIAGNOSTICS_DIR)
        .with_context(|| format!("cannot create {DIAGNOSTICS_DIR}/"))?;
    report
        .render(&mut csv)
        .context("failed to write diagnostics")?;
    info!("diagnostics written to {}", csv.out_dir().display());

    Ok(())
}

/// Info records print as bare lines so progress output reads as plain text.
fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            if record.level() == Level::Info {
                writeln!(buf, "{}", record.args())
            } else {
                writeln!(buf, "[{}] {}", record.level(), record.args())
            }
        })
        .init();
}
