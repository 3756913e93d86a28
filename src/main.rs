mod bridge;
mod browser;
mod cards;
mod cli;
mod db;
mod error;
mod fmt;
mod models;
mod paginate;
mod preview;
mod search;
mod settings;
mod store;
mod tabs;
mod task_dialog;
mod tasks;
mod tui;
mod view;

use std::fs::OpenOptions;

use clap::Parser;

use cli::records::RecordsQuery;
use cli::{Cli, Commands, Context, TasksCommands};
use settings::Settings;

/// Log to `<data_dir>/cajero.log` so output never lands on the terminal UI;
/// stderr when the file cannot be opened.
fn init_logging(settings: &Settings) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(settings.log_path());
    if let Ok(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    let ctx = Context::new(cli.db);
    init_logging(&ctx.settings);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(ctx, data_dir),
        Commands::Accounts => cli::accounts::list(&ctx),
        Commands::Records {
            caja,
            tab,
            search,
            field,
            page,
            page_size,
            csv,
        } => cli::records::run(
            &ctx,
            RecordsQuery {
                caja,
                tab,
                search,
                field,
                page,
                page_size,
                csv,
            },
        ),
        Commands::Browse { caja } => cli::browse::run(&ctx, caja),
        Commands::Toggle { caja, id, yes } => cli::toggle::run(&ctx, &caja, &id, yes),
        Commands::Preview { file, caja } => cli::preview::run(&ctx, &file, caja.as_deref()),
        Commands::Import {
            file,
            caja,
            force,
            skip,
        } => cli::import::run(&ctx, &file, caja.as_deref(), force, &skip),
        Commands::Tasks { command } => match command {
            TasksCommands::List { movement_id } => cli::tasks::list(&ctx, &movement_id),
            TasksCommands::Add { movement_id, file } => cli::tasks::add(&ctx, &movement_id, &file),
            TasksCommands::Delete { movement_id } => cli::tasks::delete(&ctx, &movement_id),
        },
        Commands::Status => cli::status::run(&ctx),
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
