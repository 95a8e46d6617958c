use std::io::Write;

use anyhow::{Context, Result};

use digit_classifier::{
    ConsoleRenderer, CsvRenderer, DiagnosticRenderer, FisherLDA, load_dataset,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    println!("=== Fisher LDA projection of digits 0, 1 and 2 ===\n");

    let train = load_dataset("train.csv", &[0, 1, 2]).context("cannot load train.csv")?;
    let test = load_dataset("test.csv", &[0, 1, 2]).context("cannot load test.csv")?;

    let mut lda = FisherLDA::new().n_components(2);
    let projection = lda.fit_transform(&train).context("LDA fit failed")?;
    let test_projection = lda.transform(&test.features)?;

    if let Some(values) = &lda.eigenvalues {
        println!("Discriminant eigenvalues: {values:.4}");
    }

    let mut console = ConsoleRenderer::stdout();
    println!("\nTraining set:");
    console.projection_scatter(&projection, &train.splits)?;
    println!("\nTesting set:");
    console.projection_scatter(&test_projection, &test.splits)?;

    let mut csv = CsvRenderer::new("diagnostics/lda")?;
    csv.projection_scatter(&projection, &train.splits)?;
    println!("\nProjection written to {}", csv.out_dir().join("projection.csv").display());

    Ok(())
}
