mod init;
pub use init::cmd_init;

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, EmailSettingsUpdate};
use crate::io::store_io::atomic_write;
use crate::io::workspace::{self, Workspace};
use crate::mail::{self, SmtpMailer};
use crate::model::agenda::{AgendaStatus, UrlLink, parse_date, parse_time};
use crate::model::blob::Blob;
use crate::model::config::{NoteOrder, PersistMode};
use crate::model::items::{ActionStatus, Priority, SubItemKind};
use crate::ops::query::{ListQuery, SortOrder, group_by_month};
use crate::ops::store::{AgendaPatch, AgendaStore, NewAgenda};
use crate::render::{RenderOptions, Sections, render};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Flags shared by every command
pub struct Context {
    pub json: bool,
    /// Set by `-C`
    pub dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let dir = match cli.dir {
        Some(ref dir) => Some(
            std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        ),
        None => None,
    };
    let ctx = Context {
        json: cli.json,
        dir,
    };

    match cli.command {
        Commands::Init(args) => cmd_init(&ctx, args),

        // Read commands
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Show(args) => cmd_show(&ctx, args),
        Commands::Stats => cmd_stats(&ctx),
        Commands::Recent(args) => cmd_recent(&ctx, args),
        Commands::Export(args) => cmd_export(&ctx, args),
        Commands::Render(args) => cmd_render(&ctx, args),

        // Agenda writes
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Status(args) => cmd_status(&ctx, args),
        Commands::Rm(args) => cmd_rm(&ctx, args),
        Commands::Import(args) => cmd_import(&ctx, args),

        // Sub-items
        Commands::Note(args) => cmd_note(&ctx, args),
        Commands::Todo(args) => cmd_todo(&ctx, args),
        Commands::Action(args) => cmd_action(&ctx, args),
        Commands::Followup(args) => cmd_followup(&ctx, args),
        Commands::Toggle(args) => cmd_toggle(&ctx, args),
        Commands::ActionStatus(args) => cmd_action_status(&ctx, args),
        Commands::RmItem(args) => cmd_rm_item(&ctx, args),

        // Email
        Commands::Send(args) => cmd_send(&ctx, args),
        Commands::Email(args) => cmd_email(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir(ctx: &Context) -> Result<PathBuf, std::io::Error> {
    match &ctx.dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir(),
    }
}

fn load_workspace(ctx: &Context) -> Result<Workspace, Box<dyn std::error::Error>> {
    let start = start_dir(ctx)?;
    let root = workspace::discover_workspace(&start)?;
    let ws = workspace::load_workspace(&root)?;
    tracing::debug!(root = %ws.root.display(), "using workspace");
    Ok(ws)
}

fn open_store(ws: &Workspace) -> Result<AgendaStore, Box<dyn std::error::Error>> {
    if ws.config.store.persist == PersistMode::Session {
        tracing::warn!("store.persist is \"session\": changes are discarded when the command exits");
    }
    let store = AgendaStore::open(ws.persistence(), ws.config.limits)?;
    Ok(store)
}

fn load_store(ctx: &Context) -> Result<(Workspace, AgendaStore), Box<dyn std::error::Error>> {
    let ws = load_workspace(ctx)?;
    let store = open_store(&ws)?;
    Ok((ws, store))
}

fn parse_date_arg(s: &str) -> Result<chrono::NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{}' (expected YYYY-MM-DD)", s))
}

fn parse_time_arg(s: &str) -> Result<chrono::NaiveTime, String> {
    parse_time(s).ok_or_else(|| format!("invalid time '{}' (expected HH:MM)", s))
}

fn parse_status_arg(s: &str) -> Result<AgendaStatus, String> {
    AgendaStatus::parse(s).ok_or_else(|| {
        format!(
            "unknown status '{}' (expected: scheduled, in-progress, completed)",
            s
        )
    })
}

fn parse_priority_arg(s: &str) -> Result<Priority, String> {
    Priority::parse(s)
        .ok_or_else(|| format!("unknown priority '{}' (expected: low, medium, high)", s))
}

fn parse_action_status_arg(s: &str) -> Result<ActionStatus, String> {
    ActionStatus::parse(s).ok_or_else(|| {
        format!(
            "unknown action status '{}' (expected: pending, in-progress, completed)",
            s
        )
    })
}

fn parse_kind_arg(s: &str) -> Result<SubItemKind, String> {
    SubItemKind::parse(s).ok_or_else(|| {
        format!(
            "unknown item kind '{}' (expected: note, todo, action, followup)",
            s
        )
    })
}

/// `NAME=URL`, or a bare URL that doubles as its own name.
fn parse_url_arg(s: &str) -> Result<UrlLink, String> {
    let (name, url) = match s.split_once('=') {
        Some((name, url)) if !name.contains("://") => (name.trim(), url.trim()),
        _ => (s.trim(), s.trim()),
    };
    if url.is_empty() {
        return Err(format!("invalid link '{}' (expected NAME=URL)", s));
    }
    let name = if name.is_empty() { url } else { name };
    Ok(UrlLink {
        name: name.to_string(),
        url: url.to_string(),
    })
}

fn load_blob(path: &str) -> Result<Blob, String> {
    Blob::from_path(Path::new(path)).map_err(|e| format!("cannot read '{}': {}", path, e))
}

fn load_blobs(paths: &[String]) -> Result<Vec<Blob>, String> {
    paths.iter().map(|p| load_blob(p)).collect()
}

fn parse_sections_arg(s: Option<&str>) -> Result<Sections, String> {
    match s {
        None => Ok(Sections::default()),
        Some(list) => Sections::parse_list(list).map_err(|bad| {
            format!(
                "unknown section '{}' (expected: urls, notes, todos, actions, followups)",
                bad
            )
        }),
    }
}

fn note_order(ws: &Workspace, arg: Option<&str>) -> Result<NoteOrder, String> {
    match arg {
        None => Ok(ws.config.display.note_order),
        Some(s) => NoteOrder::parse(s).ok_or_else(|| {
            format!(
                "unknown note order '{}' (expected: oldest-first, newest-first)",
                s
            )
        }),
    }
}

fn print_created(ctx: &Context, id: &str) -> CmdResult {
    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&CreatedJson { id: id.to_string() })?
        );
    } else {
        println!("{}", id);
    }
    Ok(())
}

fn write_output(path: Option<&str>, content: &str) -> CmdResult {
    match path {
        Some(path) => {
            atomic_write(Path::new(path), content.as_bytes())?;
            eprintln!("wrote {}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let (_, store) = load_store(ctx)?;
    let status = args.status.as_deref().map(parse_status_arg).transpose()?;
    let sort = match args.sort.as_deref() {
        Some(s) => SortOrder::parse(s).ok_or_else(|| {
            format!(
                "unknown sort '{}' (expected: date-desc, date-asc, topic-asc, topic-desc)",
                s
            )
        })?,
        None => SortOrder::default(),
    };
    let query = ListQuery {
        search: args.search,
        status,
        sort,
    };
    let records = store.list(&query);
    let groups = group_by_month(&records);

    if ctx.json {
        let out: Vec<MonthGroupJson> = groups
            .iter()
            .map(|(month, records)| MonthGroupJson {
                month: month.clone(),
                agendas: records.iter().map(|r| agenda_to_summary_json(r)).collect(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if groups.is_empty() {
        println!("no agendas");
    } else {
        for line in format_month_groups(&groups) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_show(ctx: &Context, args: IdArg) -> CmdResult {
    let (ws, store) = load_store(ctx)?;
    let record = store.get(&args.id)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        for line in format_agenda_detail(record, ws.config.display.note_order) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_stats(ctx: &Context) -> CmdResult {
    let (_, store) = load_store(ctx)?;
    let stats = store.stats();
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        for line in format_stats(&stats) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_recent(ctx: &Context, args: RecentArgs) -> CmdResult {
    let (_, store) = load_store(ctx)?;
    let recent = store.recent(args.limit);
    if ctx.json {
        let items: Vec<AgendaSummaryJson> =
            recent.iter().map(|r| agenda_to_summary_json(r)).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for record in recent {
            println!("{}", format_recent_line(record));
        }
    }
    Ok(())
}

fn cmd_export(ctx: &Context, args: ExportArgs) -> CmdResult {
    let (_, store) = load_store(ctx)?;
    let mut text = store.export()?;
    text.push('\n');
    write_output(args.output.as_deref(), &text)
}

fn cmd_render(ctx: &Context, args: RenderArgs) -> CmdResult {
    let (ws, store) = load_store(ctx)?;
    let record = store.get(&args.id)?;
    let options = RenderOptions {
        sections: parse_sections_arg(args.sections.as_deref())?,
        note_order: note_order(&ws, args.note_order.as_deref())?,
        generated_at: Some(chrono::Local::now().naive_local()),
    };
    let rendered = render(record, &options);
    let content = if args.plain {
        rendered.plain_text
    } else {
        rendered.html
    };
    write_output(args.output.as_deref(), &content)
}

// ---------------------------------------------------------------------------
// Agenda writes
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let mut new = NewAgenda::new(
        args.topic,
        args.presenter,
        parse_date_arg(&args.date)?,
        parse_time_arg(&args.time)?,
        args.duration,
    );
    new.description = args.description;
    new.urls = args
        .urls
        .iter()
        .map(|u| parse_url_arg(u))
        .collect::<Result<_, _>>()?;
    new.attachments = load_blobs(&args.attachments)?;
    new.topic_image = args.image.as_deref().map(load_blob).transpose()?;

    let id = store.create(new)?.check()?;
    print_created(ctx, &id)
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let existing = store.get(&args.id)?;

    let mut patch = AgendaPatch {
        topic: args.topic,
        presenter: args.presenter,
        date: args.date.as_deref().map(parse_date_arg).transpose()?,
        time: args.time.as_deref().map(parse_time_arg).transpose()?,
        duration_minutes: args.duration,
        status: args.status.as_deref().map(parse_status_arg).transpose()?,
        ..Default::default()
    };
    if args.clear_description {
        patch.description = Some(None);
    } else if let Some(description) = args.description {
        patch.description = Some(Some(description));
    }
    if args.clear_image {
        patch.topic_image = Some(None);
    } else if let Some(path) = &args.image {
        patch.topic_image = Some(Some(load_blob(path)?));
    }
    if args.clear_urls {
        patch.urls = Some(Vec::new());
    } else if !args.urls.is_empty() {
        patch.urls = Some(
            args.urls
                .iter()
                .map(|u| parse_url_arg(u))
                .collect::<Result<_, _>>()?,
        );
    }
    if args.clear_attachments || !args.attachments.is_empty() {
        let mut attachments = if args.clear_attachments {
            Vec::new()
        } else {
            existing.attachments.clone()
        };
        attachments.extend(load_blobs(&args.attachments)?);
        patch.attachments = Some(attachments);
    }

    if patch.is_empty() {
        return Err("nothing to change (see `agenda edit --help`)".into());
    }
    store.update(&args.id, patch)?.check()?;
    if !ctx.json {
        println!("updated {}", args.id);
    }
    Ok(())
}

fn cmd_status(ctx: &Context, args: StatusArgs) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let status = parse_status_arg(&args.status)?;
    let patch = AgendaPatch {
        status: Some(status),
        ..Default::default()
    };
    store.update(&args.id, patch)?.check()?;
    if !ctx.json {
        println!("{} is {}", args.id, status.label());
    }
    Ok(())
}

fn cmd_rm(ctx: &Context, args: IdArg) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let removed = store.delete(&args.id)?.check()?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&removed)?);
    } else {
        println!("deleted {} ({})", removed.id, short_topic(&removed.topic));
    }
    Ok(())
}

fn cmd_import(ctx: &Context, args: ImportArgs) -> CmdResult {
    let text = if args.file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.file)
            .map_err(|e| format!("cannot read '{}': {}", args.file, e))?
    };
    let (_, mut store) = load_store(ctx)?;
    let summary = store.import(&text)?.check()?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "imported {} agenda(s), {} replaced",
            summary.accepted, summary.replaced
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sub-items
// ---------------------------------------------------------------------------

fn cmd_note(ctx: &Context, args: NoteArgs) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let id = store.add_note(&args.id, &args.content)?.check()?;
    print_created(ctx, &id)
}

fn cmd_todo(ctx: &Context, args: TodoArgs) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let priority = parse_priority_arg(&args.priority)?;
    let id = store
        .add_todo(&args.id, &args.task, priority, &args.assignee)?
        .check()?;
    print_created(ctx, &id)
}

fn cmd_action(ctx: &Context, args: ActionArgs) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let priority = parse_priority_arg(&args.priority)?;
    let due = parse_date_arg(&args.due)?;
    let id = store
        .add_action_item(&args.id, &args.action, &args.owner, due, priority)?
        .check()?;
    print_created(ctx, &id)
}

fn cmd_followup(ctx: &Context, args: FollowupArgs) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let priority = parse_priority_arg(&args.priority)?;
    let id = store
        .add_follow_up(&args.id, &args.content, priority)?
        .check()?;
    print_created(ctx, &id)
}

fn cmd_toggle(ctx: &Context, args: ToggleArgs) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let completed = match parse_kind_arg(&args.kind)? {
        SubItemKind::Todo => store.toggle_todo(&args.id, &args.item_id)?.check()?,
        SubItemKind::FollowUp => store.toggle_follow_up(&args.id, &args.item_id)?.check()?,
        other => {
            return Err(format!("cannot toggle a {} (only todo or followup)", other.as_str()).into());
        }
    };
    if ctx.json {
        let out = ToggledJson {
            id: args.item_id,
            completed,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let state = if completed { "done" } else { "open" };
        println!("{} is {}", args.item_id, state);
    }
    Ok(())
}

fn cmd_action_status(ctx: &Context, args: ActionStatusArgs) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let status = parse_action_status_arg(&args.status)?;
    store
        .set_action_status(&args.id, &args.item_id, status)?
        .check()?;
    if !ctx.json {
        println!("{} is {}", args.item_id, status.label());
    }
    Ok(())
}

fn cmd_rm_item(ctx: &Context, args: RmItemArgs) -> CmdResult {
    let (_, mut store) = load_store(ctx)?;
    let kind = parse_kind_arg(&args.kind)?;
    let removed = store
        .delete_sub_item(&args.id, kind, &args.item_id)?
        .check()?;
    if !ctx.json {
        if removed {
            println!("deleted {} {}", kind.as_str(), args.item_id);
        } else {
            println!("no {} {} on {}", kind.as_str(), args.item_id, args.id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

fn cmd_send(ctx: &Context, args: SendArgs) -> CmdResult {
    let (ws, store) = load_store(ctx)?;
    let record = store.get(&args.id)?;
    let config = mail::with_env_password(&ws.config.email);

    let mut recipients = args.to.clone();
    if args.list || args.to.is_empty() {
        for address in &config.distribution_list {
            if !recipients.iter().any(|r| r.eq_ignore_ascii_case(address)) {
                recipients.push(address.clone());
            }
        }
    }
    let options = RenderOptions {
        sections: parse_sections_arg(args.sections.as_deref())?,
        note_order: ws.config.display.note_order,
        generated_at: Some(chrono::Local::now().naive_local()),
    };

    if args.dry_run {
        let outgoing = mail::compose(
            record,
            &recipients,
            args.subject.as_deref(),
            &options,
            &config,
        )?;
        let message = mail::smtp::to_message(&outgoing)?;
        println!("{}", String::from_utf8_lossy(&message.formatted()));
        return Ok(());
    }

    let mailer = SmtpMailer::from_config(&config)?;
    let delivered = mail::send(
        record,
        &recipients,
        args.subject.as_deref(),
        &options,
        &config,
        &mailer,
    )?;
    if !ctx.json {
        println!("sent {} to {} recipient(s)", record.id, delivered);
    }
    Ok(())
}

fn cmd_email(ctx: &Context, args: EmailCmd) -> CmdResult {
    let ws = load_workspace(ctx)?;
    match args.action.unwrap_or(EmailAction::Show) {
        EmailAction::Show => {
            let config = mail::with_env_password(&ws.config.email);
            if ctx.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&email_settings_json(&config))?
                );
            } else {
                for line in format_email_settings(&config) {
                    println!("{}", line);
                }
            }
        }
        EmailAction::Set(set) => {
            if let Some(sender) = &set.sender {
                mail::parse_address(sender)?;
            }
            let update = EmailSettingsUpdate {
                smtp_host: set.host,
                smtp_port: set.port,
                sender: set.sender,
                password: set.password,
            };
            let (_, mut doc) = config_io::read_config(&ws.agenda_dir)?;
            config_io::set_email_settings(&mut doc, &update);
            config_io::write_config(&ws.agenda_dir, &doc)?;
            println!("email settings updated");
        }
        EmailAction::AddRecipient(arg) => {
            let address = arg.address.trim();
            mail::parse_address(address)?;
            let (_, mut doc) = config_io::read_config(&ws.agenda_dir)?;
            if config_io::add_recipient(&mut doc, address) {
                config_io::write_config(&ws.agenda_dir, &doc)?;
                println!("added {}", address);
            } else {
                println!("{} is already on the list", address);
            }
        }
        EmailAction::RemoveRecipient(arg) => {
            let address = arg.address.trim();
            let (_, mut doc) = config_io::read_config(&ws.agenda_dir)?;
            if config_io::remove_recipient(&mut doc, address) {
                config_io::write_config(&ws.agenda_dir, &doc)?;
                println!("removed {}", address);
            } else {
                return Err(format!("{} is not on the list", address).into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_arg_forms() {
        let link = parse_url_arg("Deck=https://example.com/deck?v=2").unwrap();
        assert_eq!(link.name, "Deck");
        assert_eq!(link.url, "https://example.com/deck?v=2");

        let link = parse_url_arg("https://example.com/a?b=c").unwrap();
        assert_eq!(link.name, "https://example.com/a?b=c");
        assert_eq!(link.url, "https://example.com/a?b=c");

        assert!(parse_url_arg("Deck=").is_err());
    }

    #[test]
    fn sections_arg_defaults_to_everything() {
        assert_eq!(parse_sections_arg(None).unwrap(), Sections::default());
        assert!(parse_sections_arg(Some("notes,nope")).is_err());
    }

    #[test]
    fn argument_parsers_reject_garbage() {
        assert!(parse_date_arg("2025-13-01").is_err());
        assert!(parse_time_arg("25:00").is_err());
        assert!(parse_status_arg("done-ish").is_err());
        assert!(parse_priority_arg("urgent").is_err());
        assert!(parse_action_status_arg("started").is_err());
        assert!(parse_kind_arg("comment").is_err());
        assert_eq!(parse_status_arg("in-progress"), Ok(AgendaStatus::InProgress));
    }
}
