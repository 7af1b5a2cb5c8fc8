mod bootstrap_helpers;
mod commands;
mod doctor;
mod startup_wiring;

use anyhow::Result;
use brief_cli::{Cli, CliCommand};
use clap::Parser;

use crate::bootstrap_helpers::init_tracing;
use crate::commands::{
    execute_analyze_command, execute_compose_command, execute_history_command,
    execute_refine_command, execute_view_command,
};
use crate::doctor::{collect_doctor_checks, render_doctor_report};

async fn run_cli(cli: Cli) -> Result<()> {
    match &cli.command {
        CliCommand::Analyze {
            file,
            instructions,
            export,
            format,
        } => {
            execute_analyze_command(
                &cli,
                file,
                instructions.clone(),
                export.as_deref(),
                *format,
            )
            .await
        }
        CliCommand::History { format } => execute_history_command(&cli, *format),
        CliCommand::View {
            id,
            search,
            export,
            format,
        } => execute_view_command(&cli, id, search.as_deref(), export.as_deref(), *format),
        CliCommand::Refine {
            id,
            feedback,
            original_input,
            output,
        } => execute_refine_command(&cli, id, feedback, original_input, output.as_deref()).await,
        CliCommand::Compose {
            files,
            instructions,
            output,
        } => execute_compose_command(&cli, files, instructions.clone(), output.as_deref()).await,
        CliCommand::Doctor => {
            println!("{}", render_doctor_report(&collect_doctor_checks(&cli)));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_cli(cli).await
}
