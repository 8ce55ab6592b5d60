use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "clienthub",
    version,
    about = "Client project task board: list, calendar and kanban views"
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Decrease log verbosity (-q, -qq)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
    /// Config file to read instead of the per-user one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Task file to use instead of the located one
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project task file in the current directory
    Init,
    /// List tasks in store order
    List {
        /// Only tasks with this status (Pending, "In Progress", Completed)
        #[arg(long)]
        status: Option<String>,
        /// Only tasks with this priority (low, medium, high)
        #[arg(long)]
        priority: Option<String>,
        /// Case-insensitive text search over title, description and assignee
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a new task
    Add {
        /// Title of the task
        title: String,
        /// Person the task is assigned to
        #[arg(long, short = 'a')]
        assignee: String,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Due date in YYYY-MM-DD format
        #[arg(long)]
        due: Option<String>,
        /// Pending, "In Progress" or Completed
        #[arg(long, default_value = "Pending")]
        status: String,
    },
    /// Edit an existing task
    Edit {
        /// Task id to edit
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, short = 'a')]
        assignee: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Set due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        status: Option<String>,
    },
    /// Flip a task between completed and pending
    Toggle {
        /// Task id
        id: i64,
    },
    /// Move a task to a kanban column
    Move {
        /// Task id
        id: i64,
        /// Destination column: todo, in-progress or done
        column: String,
    },
    /// Delete a task
    Delete {
        /// Task id
        id: i64,
    },
    /// Print the kanban columns
    Board,
    /// Print a month of the calendar
    Calendar {
        /// Month to show in YYYY-MM format (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Print task counts
    Stats,
    /// Launch the interactive board
    Tui,
}
