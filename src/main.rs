// src/main.rs

use muddle::errors::MuddleError;
use muddle::label::label_list_to_string;
use muddle::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        report_error(&err);
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}

fn report_error(err: &anyhow::Error) {
    eprintln!("muddle error: {err:#}");

    let Some(muddle_err) = err.downcast_ref::<MuddleError>() else {
        return;
    };
    if let MuddleError::ActionFailed {
        label, diagnostics, ..
    } = muddle_err
    {
        eprintln!("failed label: {label}");
        if !diagnostics.is_empty() {
            eprintln!("{diagnostics}");
        }
    }
    let asserted = muddle_err.asserted_before_failure();
    if !asserted.is_empty() {
        eprintln!("asserted before stopping: {}", label_list_to_string(asserted));
    }
}
