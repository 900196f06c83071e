use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tickie", about = "Todo list with due dates and reminders")]
pub struct Cli {
    /// Path to the SQLite database [default: ~/.tickie/tickie.db]
    #[arg(long, env = "TICKIE_DB", global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a todo (prompts for missing values on a terminal)
    Add {
        /// What needs doing
        label: Option<String>,
        /// Due date (YYYY-MM-DD)
        date: Option<String>,
        /// Print the created todo as JSON
        #[arg(long)]
        json: bool,
    },

    /// List todos in the saved sort order
    List {
        /// Which todos to show (all, active, completed)
        #[arg(short, long)]
        filter: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one todo
    Show {
        /// Todo id
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Flip a todo between open and completed
    Toggle {
        /// Todo id
        id: String,
    },

    /// Remove a todo
    Rm {
        /// Todo id
        id: String,
    },

    /// Change a todo's label and/or due date
    Edit {
        /// Todo id
        id: String,
        /// New label
        #[arg(short, long)]
        label: Option<String>,
        /// New due date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Remove every completed todo
    ClearCompleted,

    /// Show or set the sort order
    /// (dueAsc, dueDesc, createdAsc, createdDesc, nameAsc, nameDesc)
    Sort {
        /// New sort order
        order: Option<String>,
    },

    /// Check for overdue and due-today todos
    Remind {
        /// Run a single check and exit
        #[arg(long)]
        once: bool,
    },

    /// Interactive todo panel
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        poll_interval: u64,
    },

    /// Speak the JSON message protocol over stdin/stdout
    Serve,
}
