use anyhow::Result;
use clap::Parser;
use clienthub::cli::{Cli, Command};
use clienthub::commands::{self, Settings};
use clienthub::config::Config;
use clienthub::logging::{init_tracing, LogTarget};

fn main() -> Result<()> {
    let args = Cli::parse();
    let config = Config::load(args.config.as_deref())?;
    let command = args.command.unwrap_or(Command::Tui);

    let log_file = match command {
        Command::Tui => Some(config.log_file()?),
        _ => None,
    };
    let target = match &log_file {
        Some(path) => LogTarget::File(path),
        None => LogTarget::Stderr,
    };
    init_tracing(args.verbose, args.quiet, config.log_filter.as_deref(), target)?;

    let settings = Settings {
        config,
        store_override: args.store,
    };
    match command {
        Command::Init => commands::init(&settings),
        Command::List {
            status,
            priority,
            search,
        } => commands::list(&settings, status, priority, search),
        Command::Add {
            title,
            assignee,
            description,
            priority,
            due,
            status,
        } => commands::add(&settings, title, assignee, description, priority, due, status),
        Command::Edit {
            id,
            title,
            description,
            assignee,
            priority,
            due,
            clear_due,
            status,
        } => commands::edit(
            &settings,
            id,
            title,
            description,
            assignee,
            priority,
            due,
            clear_due,
            status,
        ),
        Command::Toggle { id } => commands::toggle(&settings, id),
        Command::Move { id, column } => commands::move_task(&settings, id, column),
        Command::Delete { id } => commands::delete(&settings, id),
        Command::Board => commands::board(&settings),
        Command::Calendar { month } => commands::calendar(&settings, month),
        Command::Stats => commands::show_stats(&settings),
        Command::Tui => commands::tui(&settings),
    }
}
