mod logging;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, Local};
use clap::{Args, Parser, Subcommand, ValueEnum};
use outlinewriter_core::{
    BackupRing, BackupStore, ItemRecord, Node, NodeEdit, NodeId, OutlineEditor, OutlineTree,
    SnapshotStore,
};
use outlinewriter_markdown::{export_markdown, export_plain_text, import_markdown};
use outlinewriter_search::search_hits;
use outlinewriter_settings::{Preferences, PreferencesStore};
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "outlinewriter-cli",
    about = "Command-line tools for OutlineWriter outlines",
    author,
    version
)]
struct Cli {
    /// 偏好設定檔；略過時使用預設值且不寫入磁碟。 / Preferences file; defaults are used (and nothing is written) when omitted.
    #[arg(long, global = true, value_name = "PATH")]
    preferences: Option<PathBuf>,
    /// 記錄層級，優先於 RUST_LOG。 / Log filter (e.g. `debug`); takes precedence over RUST_LOG.
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 建立空白大綱檔。 / Create an empty outline file.
    New(NewArgs),
    /// 顯示大綱樹或單一項目。 / Print the outline tree, or a single item.
    Show(ShowArgs),
    /// 新增項目。 / Add an item.
    Add(AddArgs),
    /// 修改項目標題、內容或標題狀態。 / Change an item's title, content or heading flag.
    Edit(EditArgs),
    /// 刪除項目及其子項目。 / Delete an item together with its descendants.
    Delete(DeleteArgs),
    /// 將項目縮排到前一個兄弟項目之下。 / Move an item under its previous sibling.
    Indent(ItemArgs),
    /// 將項目移出其父項目。 / Move an item out of its parent.
    Outdent(ItemArgs),
    /// 展開或收合項目。 / Expand or collapse one item or the whole outline.
    Expand(ExpandArgs),
    /// 匯出為 Markdown 或純文字。 / Export as annotated Markdown or plain text.
    Export(ExportArgs),
    /// 由 Markdown 匯入新大綱。 / Build a new outline file from Markdown.
    Import(ImportArgs),
    /// 搜尋標題與內容（不分大小寫）。 / Case-insensitive search over titles and content.
    Search(SearchArgs),
    /// 顯示統計資料。 / Print item count and content length.
    Stats(FileArgs),
    /// 管理備份。 / Manage backups stored next to the outline file.
    #[command(subcommand)]
    Backup(BackupCommand),
    /// 匯入/匯出偏好設定。 / Show, import or export preferences.
    #[command(subcommand)]
    Preferences(PreferencesCommand),
}

#[derive(Args)]
struct FileArgs {
    /// 大綱檔路徑。 / Outline file.
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

#[derive(Args)]
struct NewArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// 覆寫既有檔案。 / Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct ShowArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// 只顯示指定項目（含路徑與內容）。 / Show a single item with its breadcrumb and content.
    #[arg(long, value_name = "ID")]
    item: Option<u64>,
}

#[derive(Args)]
struct AddArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// 父項目識別碼；預設為頂層。 / Parent item id; top level when omitted.
    #[arg(long, value_name = "ID", conflicts_with = "after")]
    parent: Option<u64>,
    /// 插入在指定項目之後。 / Insert right after this item.
    #[arg(long, value_name = "ID")]
    after: Option<u64>,
    /// 在父項目中的位置（從 0 起算）。 / Position among the parent's children (0-based).
    #[arg(long, value_name = "N", conflicts_with = "after")]
    position: Option<usize>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    content: Option<String>,
    /// 標記為標題。 / Mark the new item as a heading.
    #[arg(long)]
    heading: bool,
}

#[derive(Args)]
struct EditArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    #[arg(value_name = "ID")]
    id: u64,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long, value_name = "true|false")]
    heading: Option<bool>,
}

#[derive(Args)]
struct DeleteArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    #[arg(value_name = "ID")]
    id: u64,
    /// 確認刪除。 / Confirm the deletion.
    #[arg(long)]
    yes: bool,
}

#[derive(Args)]
struct ItemArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    #[arg(value_name = "ID")]
    id: u64,
}

#[derive(Args)]
struct ExpandArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// 項目識別碼；略過時套用到全部項目。 / Item id; every item when omitted.
    #[arg(value_name = "ID")]
    id: Option<u64>,
    /// 收合而非展開。 / Collapse instead of expand.
    #[arg(long)]
    collapse: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum ExportFormat {
    #[value(alias = "md")]
    Markdown,
    #[value(alias = "txt")]
    Text,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
    format: ExportFormat,
    /// 輸出檔案；預設寫到標準輸出。 / Destination file; stdout when omitted.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ImportArgs {
    /// Markdown 來源檔。 / Markdown source file.
    #[arg(value_name = "TEXT_FILE")]
    input: PathBuf,
    /// 要建立的大綱檔。 / Outline file to create.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
    /// 覆寫既有大綱檔。 / Overwrite an existing outline file.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// 搜尋字串（純文字）。 / Literal text to look for.
    query: String,
}

#[derive(Subcommand)]
enum BackupCommand {
    /// 建立手動備份。 / Record a manual backup.
    Create(FileArgs),
    /// 列出備份（由舊到新）。 / List backups, oldest first.
    List(FileArgs),
    /// 由備份還原。 / Replace the outline with a backup.
    Restore(BackupRestoreArgs),
}

#[derive(Args)]
struct BackupRestoreArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// `backup list` 顯示的編號。 / Number shown by `backup list`.
    #[arg(value_name = "N")]
    number: usize,
}

#[derive(Subcommand)]
enum PreferencesCommand {
    /// 顯示目前偏好設定。 / Print the effective preferences as JSON.
    Show,
    /// 匯出目前偏好設定。 / Export current preferences.
    Export(PreferencesExportArgs),
    /// 匯入偏好設定 JSON（需要 --preferences）。 / Import preferences from JSON (requires --preferences).
    Import(PreferencesImportArgs),
}

#[derive(Args)]
struct PreferencesExportArgs {
    /// 輸出檔案路徑。 / Destination file path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Args)]
struct PreferencesImportArgs {
    /// 輸入檔案路徑。 / Source preferences JSON.
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        preferences,
        log_level,
        command,
    } = Cli::parse();
    let store = match &preferences {
        Some(path) => Some(PreferencesStore::load(path)?),
        None => None,
    };
    let prefs = store
        .as_ref()
        .map(|store| store.preferences().clone())
        .unwrap_or_default();
    logging::init_logging(log_level.as_deref(), &prefs.logging)?;
    debug!(preferences = ?preferences, "cli started");

    match command {
        Commands::New(args) => create_outline(args),
        Commands::Show(args) => show_outline(args),
        Commands::Add(args) => add_item(args, &prefs),
        Commands::Edit(args) => edit_item(args, &prefs),
        Commands::Delete(args) => delete_item(args, &prefs),
        Commands::Indent(args) => move_item(args, &prefs, Move::Indent),
        Commands::Outdent(args) => move_item(args, &prefs, Move::Outdent),
        Commands::Expand(args) => expand_items(args, &prefs),
        Commands::Export(args) => export_outline(args),
        Commands::Import(args) => import_outline(args, &prefs),
        Commands::Search(args) => search_outline(args),
        Commands::Stats(args) => print_stats(args),
        Commands::Backup(command) => execute_backup_command(command, &prefs),
        Commands::Preferences(command) => execute_preferences_command(command, store, &prefs),
    }
}

fn create_outline(args: NewArgs) -> Result<()> {
    if args.file.exists() && !args.force {
        bail!(
            "'{}' already exists; pass --force to overwrite it",
            args.file.display()
        );
    }
    save_outline(&args.file, &OutlineTree::new())?;
    println!("Created empty outline {}", args.file.display());
    Ok(())
}

fn show_outline(args: ShowArgs) -> Result<()> {
    let tree = load_outline(&args.file)?;
    if let Some(raw) = args.item {
        let node = require_node(&tree, raw)?;
        let breadcrumb: Vec<&str> = tree
            .ancestors(node.id())
            .into_iter()
            .map(Node::title)
            .collect();
        println!("{}", breadcrumb.join(" > "));
        println!("{}", describe(node));
        for line in node.content().lines() {
            println!("  {line}");
        }
        return Ok(());
    }
    if tree.is_empty() {
        println!("Outline is empty.");
        return Ok(());
    }
    for node in tree.iter() {
        println!("{}{}", "  ".repeat(node.level()), describe(node));
    }
    Ok(())
}

fn describe(node: &Node) -> String {
    let marker = if node.is_heading() { "# " } else { "" };
    let collapsed = if node.is_expanded() { "" } else { " (collapsed)" };
    format!(
        "{} [{}] {}{}{}",
        node.hierarchy_path(),
        node.id(),
        marker,
        node.title(),
        collapsed
    )
}

fn add_item(args: AddArgs, prefs: &Preferences) -> Result<()> {
    let mut editor = open_editor(&args.file, prefs)?;
    let id = match (args.after, args.parent) {
        (Some(after), _) => {
            require_node(editor.tree(), after)?;
            editor
                .add_item_after(Some(NodeId::new(after)))
                .ok_or_else(|| anyhow!("could not add item"))?
        }
        (None, parent) => {
            let parent = parent
                .map(|raw| require_node(editor.tree(), raw).map(|node| node.id()))
                .transpose()?;
            editor
                .add_item(parent, args.position)
                .ok_or_else(|| anyhow!("could not add item"))?
        }
    };

    let mut edit = NodeEdit::default();
    if let Some(title) = args.title {
        edit = edit.title(title);
    }
    if let Some(content) = args.content {
        edit = edit.content(content);
    }
    if args.heading {
        edit = edit.heading(true);
    }
    if !edit.is_empty() {
        editor.update_item(id, &edit);
    }

    persist(&args.file, editor.tree(), prefs)?;
    let path = editor
        .tree()
        .find_node(id)
        .map(|node| node.hierarchy_path().to_string())
        .unwrap_or_default();
    println!("Added item {id} at {path}");
    Ok(())
}

fn edit_item(args: EditArgs, prefs: &Preferences) -> Result<()> {
    let mut editor = open_editor(&args.file, prefs)?;
    let id = require_node(editor.tree(), args.id)?.id();
    let edit = NodeEdit {
        title: args.title,
        content: args.content,
        is_heading: args.heading,
    };
    if edit.is_empty() {
        bail!("nothing to change; pass --title, --content or --heading");
    }
    if editor.update_item(id, &edit) {
        persist(&args.file, editor.tree(), prefs)?;
        println!("Updated item {id}");
    } else {
        println!("Item {id} unchanged");
    }
    Ok(())
}

fn delete_item(args: DeleteArgs, prefs: &Preferences) -> Result<()> {
    let mut editor = open_editor(&args.file, prefs)?;
    let node = require_node(editor.tree(), args.id)?;
    let id = node.id();
    let removed = subtree_size(editor.tree(), id);
    if !args.yes {
        bail!(
            "refusing to delete item {id} ({removed} item(s) including descendants) without --yes"
        );
    }
    editor.delete_item(id);
    persist(&args.file, editor.tree(), prefs)?;
    println!("Deleted {removed} item(s)");
    Ok(())
}

fn subtree_size(tree: &OutlineTree, id: NodeId) -> usize {
    tree.find_node(id).map_or(0, |node| {
        1 + node
            .children()
            .iter()
            .map(|child| subtree_size(tree, *child))
            .sum::<usize>()
    })
}

#[derive(Clone, Copy)]
enum Move {
    Indent,
    Outdent,
}

fn move_item(args: ItemArgs, prefs: &Preferences, direction: Move) -> Result<()> {
    let mut editor = open_editor(&args.file, prefs)?;
    let id = require_node(editor.tree(), args.id)?.id();
    let (moved, verb) = match direction {
        Move::Indent => (editor.indent(id), "indented"),
        Move::Outdent => (editor.outdent(id), "outdented"),
    };
    if !moved {
        println!("Item {id} cannot be {verb}");
        return Ok(());
    }
    persist(&args.file, editor.tree(), prefs)?;
    let path = editor
        .tree()
        .find_node(id)
        .map(|node| node.hierarchy_path().to_string())
        .unwrap_or_default();
    println!("Item {id} {verb} to {path}");
    Ok(())
}

fn expand_items(args: ExpandArgs, prefs: &Preferences) -> Result<()> {
    let mut editor = open_editor(&args.file, prefs)?;
    let expanded = !args.collapse;
    let verb = if expanded { "Expanded" } else { "Collapsed" };
    match args.id {
        Some(raw) => {
            let id = require_node(editor.tree(), raw)?.id();
            editor.set_expanded(id, expanded);
            println!("{verb} item {id}");
        }
        None => {
            editor.set_all_expanded(expanded);
            println!("{verb} {} item(s)", editor.tree().len());
        }
    }
    save_outline(&args.file, editor.tree())
}

fn export_outline(args: ExportArgs) -> Result<()> {
    let tree = load_outline(&args.file)?;
    let text = match args.format {
        ExportFormat::Markdown => export_markdown(&tree),
        ExportFormat::Text => export_plain_text(&tree),
    };
    match args.output {
        Some(output) => {
            fs::write(&output, text.as_bytes())
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Exported {} item(s) to {}", tree.len(), output.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn import_outline(args: ImportArgs, prefs: &Preferences) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "'{}' already exists; pass --force to overwrite it",
            args.output.display()
        );
    }
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let import = import_markdown(&text)
        .with_context(|| format!("failed to import {}", args.input.display()))?;
    persist(&args.output, &import.tree, prefs)?;
    println!(
        "Imported {} item(s) from {} markdown into {}",
        import.tree.len(),
        import.dialect,
        args.output.display()
    );
    Ok(())
}

fn search_outline(args: SearchArgs) -> Result<()> {
    let tree = load_outline(&args.file)?;
    let hits = search_hits(&tree, &args.query);
    if hits.is_empty() {
        println!("No matches found.");
        return Ok(());
    }
    println!("Search \"{}\" ({} hits)", args.query, hits.len());
    for hit in &hits {
        let location = match (hit.in_title, hit.in_content) {
            (true, true) => "title, content",
            (true, false) => "title",
            _ => "content",
        };
        println!(
            "  {} [{}] {} ({location})",
            hit.node.hierarchy_path(),
            hit.node.id(),
            hit.node.title()
        );
    }
    Ok(())
}

fn print_stats(args: FileArgs) -> Result<()> {
    let tree = load_outline(&args.file)?;
    let headings = tree.iter().filter(|node| node.is_heading()).count();
    let depth = tree.iter().map(|node| node.level() + 1).max().unwrap_or(0);
    println!("Items: {}", tree.len());
    println!("Headings: {headings}");
    println!("Max depth: {depth}");
    println!("Content length: {}", tree.total_content_length());
    Ok(())
}

fn execute_backup_command(command: BackupCommand, prefs: &Preferences) -> Result<()> {
    match command {
        BackupCommand::Create(args) => {
            let tree = load_outline(&args.file)?;
            let store = BackupStore::new(backups_path(&args.file));
            let mut ring = load_backups(&store, prefs)?;
            let timestamp = ring.create(&tree).timestamp.clone();
            save_backups(&store, &ring)?;
            println!(
                "Created backup {timestamp} ({}/{})",
                ring.len(),
                ring.capacity()
            );
            Ok(())
        }
        BackupCommand::List(args) => {
            let store = BackupStore::new(backups_path(&args.file));
            let ring = load_backups(&store, prefs)?;
            if ring.is_empty() {
                println!("No backups.");
                return Ok(());
            }
            for (index, entry) in ring.iter().enumerate() {
                println!(
                    "  {}: {} ({} item(s))",
                    index + 1,
                    entry.timestamp,
                    count_records(&entry.data.items)
                );
            }
            Ok(())
        }
        BackupCommand::Restore(args) => {
            let mut editor = open_editor(&args.file, prefs)?;
            let store = BackupStore::new(backups_path(&args.file));
            let ring = load_backups(&store, prefs)?;
            let index = args
                .number
                .checked_sub(1)
                .ok_or_else(|| anyhow!("backup numbers start at 1"))?;
            let entry = ring
                .get(index)
                .ok_or_else(|| anyhow!("no backup #{}; {} available", args.number, ring.len()))?;
            let timestamp = entry.timestamp.clone();
            let tree = ring
                .restore(index)
                .ok_or_else(|| anyhow!("no backup #{}", args.number))?
                .with_context(|| format!("backup #{} is corrupt", args.number))?;
            editor.replace_tree(tree);
            save_outline(&args.file, editor.tree())?;
            println!("Restored backup {timestamp}");
            Ok(())
        }
    }
}

fn count_records(items: &[ItemRecord]) -> usize {
    items
        .iter()
        .map(|item| 1 + count_records(&item.children))
        .sum()
}

fn execute_preferences_command(
    command: PreferencesCommand,
    store: Option<PreferencesStore>,
    prefs: &Preferences,
) -> Result<()> {
    match command {
        PreferencesCommand::Show => {
            let payload = serde_json::to_string_pretty(prefs)?;
            println!("{payload}");
            Ok(())
        }
        PreferencesCommand::Export(args) => {
            match store {
                Some(store) => store.export_to(&args.output),
                None => PreferencesStore::new(args.output.clone(), prefs.clone()).save(),
            }
            .with_context(|| format!("failed to export preferences to {}", args.output.display()))?;
            println!("Exported preferences to {}", args.output.display());
            Ok(())
        }
        PreferencesCommand::Import(args) => {
            let Some(mut store) = store else {
                bail!("preferences import requires --preferences <PATH>");
            };
            store
                .import_from(&args.input)
                .with_context(|| format!("failed to import preferences from {}", args.input.display()))?;
            println!(
                "Imported preferences from {} into {}",
                args.input.display(),
                store.path().display()
            );
            Ok(())
        }
    }
}

fn load_outline(path: &Path) -> Result<OutlineTree> {
    SnapshotStore::new(path)
        .load()
        .with_context(|| format!("failed to load outline {}", path.display()))?
        .ok_or_else(|| {
            anyhow!(
                "outline '{}' does not exist; create it with `new` first",
                path.display()
            )
        })
}

fn save_outline(path: &Path, tree: &OutlineTree) -> Result<()> {
    SnapshotStore::new(path)
        .save(tree)
        .with_context(|| format!("failed to save outline {}", path.display()))
}

fn open_editor(path: &Path, prefs: &Preferences) -> Result<OutlineEditor> {
    Ok(OutlineEditor::from_tree(
        load_outline(path)?,
        prefs.editor_options(),
    ))
}

fn require_node(tree: &OutlineTree, raw: u64) -> Result<&Node> {
    tree.find_node(NodeId::new(raw))
        .ok_or_else(|| anyhow!("no item with id {raw}"))
}

/// Saves the outline, then records an automatic backup when one is due.
fn persist(path: &Path, tree: &OutlineTree, prefs: &Preferences) -> Result<()> {
    save_outline(path, tree)?;
    if !prefs.backup.enabled {
        return Ok(());
    }
    let store = BackupStore::new(backups_path(path));
    let mut ring = load_backups(&store, prefs)?;
    let interval = Duration::minutes(i64::from(prefs.backup.interval_minutes));
    if !ring.is_due(Local::now().naive_local(), interval) {
        return Ok(());
    }
    if ring.create_auto(tree).is_some() {
        save_backups(&store, &ring)?;
        info!(path = %store.path().display(), "automatic backup recorded");
    }
    Ok(())
}

fn backups_path(file: &Path) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(".backups.json");
    PathBuf::from(name)
}

fn load_backups(store: &BackupStore, prefs: &Preferences) -> Result<BackupRing> {
    store
        .load(prefs.backup.max_backups)
        .with_context(|| format!("failed to read backups {}", store.path().display()))
}

fn save_backups(store: &BackupStore, ring: &BackupRing) -> Result<()> {
    store
        .save(ring)
        .with_context(|| format!("failed to write backups {}", store.path().display()))
}
