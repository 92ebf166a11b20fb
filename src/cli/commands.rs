use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hl", about = concat!("hotlist v", env!("CARGO_PKG_VERSION"), " - today's actions, tracked in your notes"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different vault directory
    #[arg(short = 'C', long = "vault", global = true)]
    pub vault: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .hotlist/config.toml in the vault
    Init(InitArgs),
    /// Show the hotlist, pinned items first
    List,
    /// Put an action from a note on the hotlist
    Add(AddArgs),
    /// Take an item off the hotlist (the note is left alone)
    Remove(IdArg),
    /// Pin an item to the top
    Pin(IdArg),
    /// Unpin an item
    Unpin(IdArg),
    /// Move a pinned item to another pinned item's position
    Reorder(ReorderArgs),
    /// Mark an item's line as waiting-for ([w])
    Waiting(IdArg),
    /// Check an item's line off ([x])
    Done(IdArg),
    /// Re-locate every tracked line in its note
    Reconcile,
    /// Archive and clear the hotlist if the daily clear is due
    Clear(ClearArgs),
    /// Move lines marked with the legacy tag onto the hotlist
    Migrate,
    /// Watch the vault and reconcile after changes
    Watch,
    /// View the recovery log
    Recovery(RecoveryArgs),
    /// Change settings in config.toml
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct IdArg {
    /// Item id (any unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Note containing the action (vault-relative path)
    pub file: String,
    /// Action text as shown, without checkbox or tags
    pub text: String,
    /// Category to file the item under
    #[arg(long)]
    pub category: Option<String>,
    /// Treat as a general action even outside the general actions file
    #[arg(long)]
    pub general: bool,
    /// Pin the new item
    #[arg(long)]
    pub pin: bool,
}

#[derive(Args)]
pub struct ReorderArgs {
    /// Pinned item to move
    pub dragged: String,
    /// Pinned item whose position it takes
    pub target: String,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Clear now regardless of the configured time
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Set the daily clear time (HH:MM), or "off" to disable
    ClearTime(ClearTimeArgs),
}

#[derive(Args)]
pub struct ClearTimeArgs {
    pub value: String,
}
