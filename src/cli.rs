// Replay Keeper CLI binary

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use replay_keeper_lib::assets::{self, PortraitCache, PortraitLibrary, QuoteBook};
use replay_keeper_lib::commands::{self, AddReplayRequest, BatchResult};
use replay_keeper_lib::constants::{PORTRAIT_SIZE_MAIN, PORTRAIT_SIZE_SMALL};
use replay_keeper_lib::db::schema::{Replay, ReplayUpdate, TextColumn};
use replay_keeper_lib::export::ExportFormat;
use replay_keeper_lib::filter::{RecordedFilter, ReplayFilter, SortColumn, SortOrder, SortSpec, TagMode};
use replay_keeper_lib::jobs::spawn_sweeper;
use replay_keeper_lib::preferences::PreferenceStore;
use replay_keeper_lib::{AppConfig, CatalogState};

#[derive(Parser)]
#[command(name = "rkm")]
#[command(about = "Replay Keeper - A catalog for personal replay recordings", long_about = None)]
#[command(version)]
struct Cli {
    /// App home directory (defaults to RKM_HOME, then the platform data dir)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Catalog file to use for this run instead of the remembered one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Case-insensitive text matched against name, description and tags
    #[arg(short, long)]
    search: Option<String>,
    /// Tag to filter by (repeatable)
    #[arg(short, long = "tag")]
    tags: Vec<String>,
    /// Require every tag instead of any
    #[arg(long)]
    all_tags: bool,
    /// Only recorded replays
    #[arg(long, conflicts_with = "not_recorded")]
    recorded: bool,
    /// Only replays not yet recorded
    #[arg(long)]
    not_recorded: bool,
    /// Sort column (insertion, file_name, timestamp, ufc, recorded, video_link, description, date_added, tags)
    #[arg(long, default_value = "insertion")]
    sort: SortColumn,
    /// Sort descending
    #[arg(long)]
    desc: bool,
}

impl FilterArgs {
    fn filter(&self) -> ReplayFilter {
        ReplayFilter {
            search: self.search.clone().unwrap_or_default(),
            tags: self.tags.clone(),
            tag_mode: if self.all_tags { TagMode::All } else { TagMode::Any },
            recorded: if self.recorded {
                RecordedFilter::Recorded
            } else if self.not_recorded {
                RecordedFilter::NotRecorded
            } else {
                RecordedFilter::All
            },
        }
    }

    fn sort(&self) -> SortSpec {
        let order = if self.desc { SortOrder::Descending } else { SortOrder::Ascending };
        SortSpec::new(self.sort, order)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new catalog and switch to it
    New,

    /// List catalogs in the active folder
    Catalogs,

    /// Switch to an existing catalog file
    Use {
        /// Catalog file
        path: PathBuf,
    },

    /// Add a replay
    Add {
        /// Character used in the generated file name (defaults to the filename-character preference)
        #[arg(short, long)]
        character: Option<String>,
        /// In-game timestamp
        #[arg(long, default_value = "")]
        timestamp: String,
        /// Link to the replay video
        #[arg(long, default_value = "")]
        link: String,
        /// Free-text description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
    },

    /// List replays in the active catalog
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show replay details
    Show {
        /// Replay UFC
        ufc: String,
    },

    /// Edit replay fields
    Edit {
        /// Replay UFC
        ufc: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        timestamp: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },

    /// Mark a replay as recorded or not
    Recorded {
        /// Replay UFC
        ufc: String,
        #[arg(action = ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        value: bool,
    },

    /// Move replays to the recycle bin
    Delete {
        #[arg(required = true)]
        ufcs: Vec<String>,
        /// Delete outright instead of recycling
        #[arg(long)]
        permanent: bool,
    },

    /// List the recycle bin
    Bin,

    /// Restore replays from the recycle bin
    Restore {
        #[arg(required = true)]
        ufcs: Vec<String>,
    },

    /// Permanently remove replays from the recycle bin
    Purge {
        #[arg(required = true)]
        ufcs: Vec<String>,
    },

    /// Permanently remove everything in the recycle bin
    EmptyBin,

    /// Purge recycle-bin entries past the retention period
    Sweep {
        /// Retention in days (defaults to the configured period)
        #[arg(long)]
        days: Option<i64>,
        /// Keep sweeping on the configured interval until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// List the tag vocabulary
    Tags,

    /// Find and replace text in one column
    Replace {
        /// Column (file_name, timestamp, video_link, description, tags)
        column: TextColumn,
        find: String,
        replace: String,
        /// Only count matching replays
        #[arg(long)]
        dry_run: bool,
    },

    /// Rename video files after their replays
    Rename {
        /// Replay UFC (repeatable, paired with --file in order)
        #[arg(long = "ufc", required = true)]
        ufcs: Vec<String>,
        /// Video file (repeatable)
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,
        /// Character for the new names (defaults to the rename-character preference)
        #[arg(short, long)]
        character: Option<String>,
    },

    /// Export the filtered view to CSV or JSON
    Export {
        /// Output file
        output: PathBuf,
        /// Format (csv or json); inferred from the extension if omitted
        #[arg(long)]
        format: Option<ExportFormat>,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Back up the active catalog
    Backup,

    /// Restore a catalog backup into the active folder and switch to it
    RestoreBackup {
        /// Backup file
        path: PathBuf,
    },

    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsAction>,
    },

    /// Print a random quote
    Quote {
        /// Character (defaults to a random alt character)
        character: Option<String>,
    },

    /// List portraits
    Portraits {
        /// Only portraits for this character
        character: Option<String>,
        /// List rank badges instead of character portraits
        #[arg(long)]
        rank: bool,
        /// Decode each portrait to check it loads
        #[arg(long)]
        check: bool,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Print all preferences as JSON
    Show,
    /// Set one preference
    Set { key: String, value: String },
}

struct Session {
    config: AppConfig,
    prefs: PreferenceStore,
    state: CatalogState,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut session = open_session(cli.home, cli.catalog)?;

    match cli.command {
        Commands::New => cmd_new(&mut session),
        Commands::Catalogs => cmd_catalogs(&session),
        Commands::Use { path } => cmd_use(&mut session, path),
        Commands::Add { character, timestamp, link, description, tags } => {
            cmd_add(&session, character, timestamp, link, description, tags)
        }
        Commands::List { filter } => cmd_list(&session, &filter),
        Commands::Show { ufc } => cmd_show(&session, &ufc),
        Commands::Edit { ufc, name, timestamp, link, description, tags } => {
            let updates = ReplayUpdate {
                file_name: name,
                timestamp,
                video_link: link,
                extended_desc: description,
                tags,
                ..Default::default()
            };
            cmd_edit(&session, &ufc, updates)
        }
        Commands::Recorded { ufc, value } => cmd_recorded(&session, &ufc, value),
        Commands::Delete { ufcs, permanent } => cmd_delete(&session, &ufcs, permanent),
        Commands::Bin => cmd_bin(&session),
        Commands::Restore { ufcs } => {
            report_batch("Restored", &commands::restore_replays(&session.state, &ufcs)?)
        }
        Commands::Purge { ufcs } => {
            report_batch("Purged", &commands::purge_replays(&session.state, &ufcs)?)
        }
        Commands::EmptyBin => {
            let removed = commands::empty_recycle_bin(&session.state)?;
            println!("Removed {} replays from the recycle bin", removed);
            Ok(())
        }
        Commands::Sweep { days, watch } => cmd_sweep(&session, days, watch),
        Commands::Tags => cmd_tags(&session),
        Commands::Replace { column, find, replace, dry_run } => {
            cmd_replace(&session, column, &find, &replace, dry_run)
        }
        Commands::Rename { ufcs, files, character } => cmd_rename(&session, &ufcs, &files, character),
        Commands::Export { output, format, filter } => cmd_export(&session, output, format, &filter),
        Commands::Backup => {
            let path = commands::backup_active_catalog(&session.state, &session.config)?;
            println!("Backed up to {}", path.display());
            Ok(())
        }
        Commands::RestoreBackup { path } => {
            let info = commands::restore_catalog_backup(&session.state, &session.config, &mut session.prefs, &path)?;
            println!("Restored UDC-{} to {} ({} replays)", info.udc, info.path, info.replay_count);
            Ok(())
        }
        Commands::Prefs { action } => cmd_prefs(&mut session, action),
        Commands::Quote { character } => cmd_quote(&session, character),
        Commands::Portraits { character, rank, check } => cmd_portraits(&session, character, rank, check),
    }
}

/// Resolve paths, load preferences and pick the catalog for this run.
fn open_session(home: Option<PathBuf>, catalog: Option<PathBuf>) -> Result<Session> {
    let config = AppConfig::resolve(home)?;
    config.ensure_folders()
        .with_context(|| format!("Could not create folders under {}", config.home.display()))?;
    let mut prefs = PreferenceStore::load(&config.preferences_path);
    let state = CatalogState::new();

    match catalog {
        // A one-off override is not remembered
        Some(path) => state.set_catalog(Some(path))?,
        None => {
            commands::restore_last_session(&state, &mut prefs)?;
        }
    }

    Ok(Session { config, prefs, state })
}

fn cmd_new(session: &mut Session) -> Result<()> {
    let info = commands::create_catalog(&session.state, &session.config, &mut session.prefs)?;
    println!("Created catalog UDC-{} at {}", info.udc, info.path);
    Ok(())
}

fn cmd_catalogs(session: &Session) -> Result<()> {
    let listings = commands::list_catalogs(&session.state, &session.config)?;

    if listings.is_empty() {
        println!("No catalogs in {}. Use 'rkm new' to create one.", session.config.active_db_folder.display());
        return Ok(());
    }

    for listing in listings {
        let marker = if listing.is_active { "*" } else { " " };
        println!("{} {}", marker, listing.file_name);
    }

    Ok(())
}

fn cmd_use(session: &mut Session, path: PathBuf) -> Result<()> {
    let path = resolve_catalog_path(&session.config, path);
    let info = commands::open_catalog(&session.state, &mut session.prefs, &path)?;
    println!("Using catalog UDC-{} ({} replays, {} in recycle bin)", info.udc, info.replay_count, info.recycled_count);
    Ok(())
}

fn cmd_add(
    session: &Session,
    character: Option<String>,
    timestamp: String,
    video_link: String,
    description: String,
    tags: String,
) -> Result<()> {
    let character = character
        .or_else(|| session.prefs.get().filename_character.clone())
        .or_else(|| session.prefs.main_character().map(str::to_string))
        .ok_or_else(|| anyhow::anyhow!("No character given. Pass --character or set filename_character."))?;

    let request = AddReplayRequest {
        character,
        timestamp,
        video_link,
        description,
        tags,
    };
    let replay = commands::add_replay(&session.state, &request)?;
    println!("Added {} as {}", replay.ufc, replay.file_name);
    Ok(())
}

fn cmd_list(session: &Session, args: &FilterArgs) -> Result<()> {
    let info = require_catalog(session)?;
    let replays = commands::list_visible(&session.state, &args.filter(), &args.sort())?;

    println!("Catalog: UDC-{} ({} replays total)", info.udc, info.replay_count);
    println!();

    if replays.is_empty() {
        println!("No replays found. Use 'rkm add' to add one.");
        return Ok(());
    }

    print_replay_table(&replays);
    println!();
    println!("Showing {} of {} replays", replays.len(), info.replay_count);

    Ok(())
}

fn cmd_show(session: &Session, ufc: &str) -> Result<()> {
    let replay = commands::get_replay(&session.state, ufc)?;

    println!("Replay {}", replay.ufc);
    println!("  File name:    {}", replay.file_name);
    if let Some(renamed) = &replay.renamed_filename {
        println!("  Renamed file: {}", renamed);
    }
    println!("  Timestamp:    {}", replay.timestamp);
    println!("  Recorded:     {}", yes_no(replay.recorded));
    println!("  Video link:   {}", replay.video_link);
    println!("  Tags:         {}", replay.tags);
    println!("  Date added:   {}", replay.date_added);
    if !replay.extended_desc.is_empty() {
        println!();
        println!("{}", replay.extended_desc);
    }

    Ok(())
}

fn cmd_edit(session: &Session, ufc: &str, updates: ReplayUpdate) -> Result<()> {
    if updates.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }
    commands::edit_replay(&session.state, ufc, &updates)?;
    println!("Updated {}", ufc);
    Ok(())
}

fn cmd_recorded(session: &Session, ufc: &str, value: bool) -> Result<()> {
    commands::set_recorded(&session.state, ufc, value)?;
    println!("{} recorded: {}", ufc, yes_no(value));
    Ok(())
}

fn cmd_delete(session: &Session, ufcs: &[String], permanent: bool) -> Result<()> {
    let result = commands::delete_replays(&session.state, ufcs, permanent)?;
    let verb = if permanent { "Deleted" } else { "Moved to recycle bin" };
    report_batch(verb, &result)
}

fn cmd_bin(session: &Session) -> Result<()> {
    let recycled = commands::list_recycle_bin(&session.state)?;

    if recycled.is_empty() {
        println!("Recycle bin is empty.");
        return Ok(());
    }

    println!("{:>10}  {:>19}  {}", "UFC", "Deleted", "File Name");
    println!("{}", "-".repeat(70));
    for entry in &recycled {
        println!(
            "{:>10}  {:>19}  {}",
            entry.replay.ufc,
            entry.deleted_date,
            truncate(&entry.replay.file_name, 37)
        );
    }
    println!();
    println!(
        "{} replays. Entries older than {} days are purged automatically.",
        recycled.len(),
        session.config.retention_days
    );

    Ok(())
}

fn cmd_sweep(session: &Session, days: Option<i64>, watch: bool) -> Result<()> {
    let days = days.unwrap_or(session.config.retention_days);

    if !watch {
        let purged = commands::sweep_now(&session.state, days)?;
        println!("Purged {} expired replays (retention {} days)", purged, days);
        return Ok(());
    }

    require_catalog(session)?;
    let _handle = spawn_sweeper(session.state.shared(), session.config.sweep_interval, days)
        .context("Failed to start recycle-bin sweeper")?;
    println!(
        "Sweeping every {}s with {}-day retention. Press Ctrl-C to stop.",
        session.config.sweep_interval.as_secs(),
        days
    );
    loop {
        std::thread::park();
    }
}

fn cmd_tags(session: &Session) -> Result<()> {
    let tags = commands::list_tags(&session.state)?;

    if tags.is_empty() {
        println!("No tags in this catalog.");
        return Ok(());
    }

    for tag in &tags {
        println!("{}", tag);
    }

    Ok(())
}

fn cmd_replace(session: &Session, column: TextColumn, find: &str, replace: &str, dry_run: bool) -> Result<()> {
    if dry_run {
        let matched = commands::preview_replace(&session.state, column, find)?;
        println!("{} replays contain '{}' in {}", matched, find, column.column_name());
        return Ok(());
    }

    let result = commands::replace_text(&session.state, column, find, replace)?;
    println!("Replaced '{}' with '{}' in {} replays", find, replace, result.changed);
    Ok(())
}

fn cmd_rename(session: &Session, ufcs: &[String], files: &[PathBuf], character: Option<String>) -> Result<()> {
    let report = commands::rename_replay_files(&session.state, &session.prefs, ufcs, files, character.as_deref())?;

    for (ufc, path) in &report.renamed {
        println!("  {} -> {}", ufc, path.display());
    }
    for (ufc, reason) in &report.failed {
        println!("  {} FAILED: {}", ufc, reason);
    }
    println!();
    println!("Renamed: {}  Failed: {}", report.renamed.len(), report.failed.len());

    Ok(())
}

fn cmd_export(session: &Session, output: PathBuf, format: Option<ExportFormat>, args: &FilterArgs) -> Result<()> {
    let written = commands::export_visible(&session.state, &args.filter(), &args.sort(), &output, format)?;
    println!("Exported {} replays to {}", written, output.display());
    Ok(())
}

fn cmd_prefs(session: &mut Session, action: Option<PrefsAction>) -> Result<()> {
    match action.unwrap_or(PrefsAction::Show) {
        PrefsAction::Show => {
            println!("{}", serde_json::to_string_pretty(session.prefs.get())?);
            println!();
            println!("File: {}", session.prefs.path().display());
        }
        PrefsAction::Set { key, value } => {
            session.prefs.set_by_key(&key, &value)?;
            println!("Set {}", key);
        }
    }
    Ok(())
}

fn cmd_quote(session: &Session, character: Option<String>) -> Result<()> {
    let quotes = QuoteBook::load(&session.config.quotes_path);
    let mut rng = rand::thread_rng();

    match character {
        Some(character) => {
            println!("{}: {}", character, quotes.quote_or_placeholder(&character, &mut rng));
        }
        None => {
            let portraits = PortraitLibrary::scan(&session.config.portraits_dir);
            let frame = assets::next_frame(&session.prefs.get().alt_characters, &portraits, &quotes, &mut rng)
                .ok_or_else(|| anyhow::anyhow!("No alt characters set. Use 'rkm prefs set alt_characters ...'."))?;
            println!("{}: {}", frame.character, frame.quote);
            if let Some(portrait) = frame.portrait {
                println!("  portrait: {}", portrait.display());
            }
        }
    }

    Ok(())
}

fn cmd_portraits(session: &Session, character: Option<String>, rank: bool, check: bool) -> Result<()> {
    let (dir, size) = if rank {
        (&session.config.rank_portraits_dir, PORTRAIT_SIZE_SMALL)
    } else {
        (&session.config.portraits_dir, PORTRAIT_SIZE_MAIN)
    };
    let library = PortraitLibrary::scan(dir);

    if library.is_empty() {
        println!("No portraits in {}", dir.display());
        return Ok(());
    }

    let mut cache = PortraitCache::new(session.config.portrait_cache_capacity);
    let mut shown = 0;
    let mut broken = 0;

    let wanted = character.as_deref().map(|c| library.portraits_for(c));

    for entry in library.entries() {
        if let Some(wanted) = &wanted {
            if !wanted.contains(&entry.path) {
                continue;
            }
        }
        shown += 1;

        let status = if check {
            if cache.load(&entry.path, size, size).is_loaded() {
                "ok"
            } else {
                broken += 1;
                "unreadable"
            }
        } else {
            ""
        };
        println!("{:<24}  {:<10}  {}", entry.display_name, status, entry.path.display());
    }

    println!();
    println!("{} portraits", shown);
    if check && broken > 0 {
        println!("{} could not be decoded", broken);
    }

    Ok(())
}

// Helper functions

fn require_catalog(session: &Session) -> Result<commands::CatalogInfo> {
    commands::catalog_info(&session.state)?
        .ok_or_else(|| anyhow::anyhow!("No catalog open. Use 'rkm new' or 'rkm use <file>'."))
}

/// Bare file names are looked up in the active catalog folder.
fn resolve_catalog_path(config: &AppConfig, path: PathBuf) -> PathBuf {
    if path.components().count() == 1 && !path.exists() {
        config.active_db_folder.join(path)
    } else {
        path
    }
}

fn print_replay_table(replays: &[Replay]) {
    println!("{:>8}  {:>3}  {:<40}  {}", "UFC", "Rec", "File Name", "Tags");
    println!("{}", "-".repeat(70));
    for replay in replays {
        println!(
            "{:>8}  {:>3}  {:<40}  {}",
            replay.ufc,
            if replay.recorded { "yes" } else { "" },
            truncate(&replay.file_name, 40),
            replay.tags
        );
    }
}

fn report_batch(verb: &str, result: &BatchResult) -> Result<()> {
    println!("{}: {}", verb, result.done.len());
    for (ufc, reason) in &result.failed {
        println!("  {} FAILED: {}", ufc, reason);
    }
    if !result.all_succeeded() {
        anyhow::bail!("{} of {} replays failed", result.failed.len(), result.done.len() + result.failed.len());
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
