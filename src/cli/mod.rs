// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses the command line with `clap` and routes to Layer 2.
// All business logic lives in the application layer.
//
//   1. `train`     - k-fold training plus majority vote
//   2. `aggregate` - majority vote over existing submissions
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AggregateArgs, Commands, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "watson-kfold",
    version = "0.1.0",
    about = "K-fold training and majority-vote ensembling for an NLI classifier."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Aggregate(args) => run_aggregate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::KFoldUseCase;

    let config = args.resolve()?;
    tracing::info!(
        "Starting {}-fold training '{}' on data in: {}",
        config.n_splits,
        config.exp_name,
        config.data_dir.display()
    );

    let submission = KFoldUseCase::new(config).execute()?;
    tracing::info!("Final submission has {} rows", submission.len());

    println!("training is finished!");
    Ok(())
}

fn run_aggregate(args: AggregateArgs) -> Result<()> {
    use crate::application::aggregate_use_case::AggregateUseCase;

    let merged = AggregateUseCase::new(args.inputs, args.output.clone()).execute()?;
    println!("Wrote {} rows to {}", merged.len(), args.output.display());
    Ok(())
}
