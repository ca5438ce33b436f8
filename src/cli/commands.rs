use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agenda", about = concat!("agenda v", env!("CARGO_PKG_VERSION"), " - meeting agendas, notes and action items"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an agenda workspace in the current directory
    Init(InitArgs),
    /// Create an agenda
    Add(AddArgs),
    /// List agendas, grouped by month
    List(ListArgs),
    /// Show an agenda with all of its items
    Show(IdArg),
    /// Change fields of an agenda
    Edit(EditArgs),
    /// Set an agenda's status
    Status(StatusArgs),
    /// Delete an agenda and everything attached to it
    Rm(IdArg),
    /// Add a note
    Note(NoteArgs),
    /// Add a to-do item
    Todo(TodoArgs),
    /// Add an action item
    Action(ActionArgs),
    /// Add a follow-up item
    Followup(FollowupArgs),
    /// Flip the completed flag of a to-do or follow-up
    Toggle(ToggleArgs),
    /// Set an action item's status
    ActionStatus(ActionStatusArgs),
    /// Delete a note, to-do, action item or follow-up
    RmItem(RmItemArgs),
    /// Show counts across all agendas
    Stats,
    /// Show recently modified agendas
    Recent(RecentArgs),
    /// Write all agendas as JSON
    Export(ExportArgs),
    /// Merge agendas from a JSON export
    Import(ImportArgs),
    /// Render an agenda as HTML (or the plain-text summary)
    Render(RenderArgs),
    /// Email an agenda
    Send(SendArgs),
    /// View or change email settings and the distribution list
    Email(EmailCmd),
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing .agenda/config.toml
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Agenda records
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    /// Agenda ID
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Meeting topic
    pub topic: String,
    /// Who presents
    #[arg(long, short)]
    pub presenter: String,
    /// Meeting date (YYYY-MM-DD)
    #[arg(long, short)]
    pub date: String,
    /// Start time (HH:MM)
    #[arg(long, short)]
    pub time: String,
    /// Length in minutes
    #[arg(long, default_value_t = 60)]
    pub duration: u32,
    /// Longer description
    #[arg(long)]
    pub description: Option<String>,
    /// Related link as NAME=URL or just URL (repeatable)
    #[arg(long = "url", action = ArgAction::Append)]
    pub urls: Vec<String>,
    /// File to attach (repeatable)
    #[arg(long = "attach", action = ArgAction::Append)]
    pub attachments: Vec<String>,
    /// Topic image file
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Case-insensitive match on topic or presenter
    #[arg(long, short)]
    pub search: Option<String>,
    /// Only agendas with this status (scheduled, in-progress, completed)
    #[arg(long)]
    pub status: Option<String>,
    /// date-desc (default), date-asc, topic-asc, topic-desc
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Agenda ID
    pub id: String,
    #[arg(long)]
    pub topic: Option<String>,
    #[arg(long)]
    pub presenter: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    /// Remove the description
    #[arg(long)]
    pub clear_description: bool,
    /// New date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    /// New start time (HH:MM)
    #[arg(long)]
    pub time: Option<String>,
    /// New length in minutes
    #[arg(long)]
    pub duration: Option<u32>,
    /// New status
    #[arg(long)]
    pub status: Option<String>,
    /// Replace the related links (NAME=URL, repeatable)
    #[arg(long = "url", action = ArgAction::Append)]
    pub urls: Vec<String>,
    /// Remove all related links
    #[arg(long, conflicts_with = "urls")]
    pub clear_urls: bool,
    /// Add an attachment (repeatable)
    #[arg(long = "attach", action = ArgAction::Append)]
    pub attachments: Vec<String>,
    /// Remove all attachments before adding any given with --attach
    #[arg(long)]
    pub clear_attachments: bool,
    /// Replace the topic image
    #[arg(long, conflicts_with = "clear_image")]
    pub image: Option<String>,
    /// Remove the topic image
    #[arg(long)]
    pub clear_image: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Agenda ID
    pub id: String,
    /// scheduled, in-progress or completed
    pub status: String,
}

// ---------------------------------------------------------------------------
// Sub-items
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct NoteArgs {
    /// Agenda ID
    pub id: String,
    /// Note text
    pub content: String,
}

#[derive(Args)]
pub struct TodoArgs {
    /// Agenda ID
    pub id: String,
    /// What needs doing
    pub task: String,
    /// low, medium or high
    #[arg(long, default_value = "medium")]
    pub priority: String,
    #[arg(long, default_value = "")]
    pub assignee: String,
}

#[derive(Args)]
pub struct ActionArgs {
    /// Agenda ID
    pub id: String,
    /// The action to take
    pub action: String,
    /// Who owns it
    #[arg(long)]
    pub owner: String,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: String,
    /// low, medium or high
    #[arg(long, default_value = "medium")]
    pub priority: String,
}

#[derive(Args)]
pub struct FollowupArgs {
    /// Agenda ID
    pub id: String,
    /// Follow-up text
    pub content: String,
    /// low, medium or high
    #[arg(long, default_value = "medium")]
    pub priority: String,
}

#[derive(Args)]
pub struct ToggleArgs {
    /// Agenda ID
    pub id: String,
    /// todo or followup
    pub kind: String,
    /// Item ID
    pub item_id: String,
}

#[derive(Args)]
pub struct ActionStatusArgs {
    /// Agenda ID
    pub id: String,
    /// Action item ID
    pub item_id: String,
    /// pending, in-progress or completed
    pub status: String,
}

#[derive(Args)]
pub struct RmItemArgs {
    /// Agenda ID
    pub id: String,
    /// note, todo, action or followup
    pub kind: String,
    /// Item ID
    pub item_id: String,
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecentArgs {
    /// Maximum number of agendas to show
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
}

// ---------------------------------------------------------------------------
// Import / export / rendering
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file to import ("-" for stdin)
    pub file: String,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Agenda ID
    pub id: String,
    /// Sections to include, comma-separated: urls,notes,todos,actions,followups
    #[arg(long)]
    pub sections: Option<String>,
    /// Note order: oldest-first or newest-first (default from config)
    #[arg(long)]
    pub note_order: Option<String>,
    /// Print the plain-text summary instead of HTML
    #[arg(long)]
    pub plain: bool,
    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct SendArgs {
    /// Agenda ID
    pub id: String,
    /// Recipient address (repeatable)
    #[arg(long = "to", action = ArgAction::Append)]
    pub to: Vec<String>,
    /// Also send to the saved distribution list (implied when no --to is given)
    #[arg(long)]
    pub list: bool,
    /// Subject line (default: "Meeting Agenda: <topic> - <date>")
    #[arg(long)]
    pub subject: Option<String>,
    /// Sections to include, comma-separated: urls,notes,todos,actions,followups
    #[arg(long)]
    pub sections: Option<String>,
    /// Print the message instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// Email settings
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct EmailCmd {
    #[command(subcommand)]
    pub action: Option<EmailAction>,
}

#[derive(Subcommand)]
pub enum EmailAction {
    /// Show the current settings (default)
    Show,
    /// Change SMTP settings
    Set(EmailSetArgs),
    /// Add an address to the distribution list
    AddRecipient(AddressArg),
    /// Remove an address from the distribution list
    RemoveRecipient(AddressArg),
}

#[derive(Args)]
pub struct EmailSetArgs {
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    /// Sender address, also used as the SMTP login
    #[arg(long)]
    pub sender: Option<String>,
    /// SMTP password (prefer the AGENDA_SMTP_PASSWORD environment variable)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct AddressArg {
    /// Email address
    pub address: String,
}
