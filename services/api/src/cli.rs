use crate::demo::{run_demo, run_import, run_template, DemoArgs, ImportArgs, TemplateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hr_intake::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "HR Intake",
    about = "Bulk-import and endorse agency applicants from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print or save the CSV import template
    Template(TemplateArgs),
    /// Import a CSV of applicants, validate every slot and optionally endorse them
    Import(ImportArgs),
    /// Run an in-memory endorsement batch that includes an existing employee
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Agency recorded on every endorsement made through this server
    #[arg(long, default_value = "agency-local")]
    pub(crate) agency: String,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            agency: "agency-local".to_string(),
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Template(args) => run_template(args),
        Command::Import(args) => run_import(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
