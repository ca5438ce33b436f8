use std::fs;

use crate::cli::commands::InitArgs;
use crate::cli::handlers::Context;
use crate::io::workspace::{self, AGENDA_DIR};

const CONFIG_TOML_TEMPLATE: &str = r##"# agenda workspace settings

[store]
# Snapshot file, relative to .agenda/
file = "agendas.json"
# "file" writes every change to disk; "session" keeps changes in memory only
persist = "file"

[limits]
# Allowed meeting length in minutes
min_duration = 5
max_duration = 480

[display]
# "oldest-first" or "newest-first"
note_order = "oldest-first"

[email]
smtp_host = ""
smtp_port = 587
# Sender address, also used as the SMTP login
sender = ""
# Leave empty and set AGENDA_SMTP_PASSWORD instead to keep it out of this file
password = ""
# Addresses used by `agenda send` when no --to is given
distribution_list = []
"##;

pub fn cmd_init(ctx: &Context, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let root = match &ctx.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let agenda_dir = root.join(AGENDA_DIR);
    let config_path = agenda_dir.join("config.toml");

    if config_path.exists() && !args.force {
        return Err(format!(
            "agenda workspace already exists in {}/ (use --force to reset its config)",
            agenda_dir.display()
        )
        .into());
    }

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = workspace::discover_workspace(parent)
    {
        eprintln!(
            "Note: parent workspace found at {}/",
            parent_root.join(AGENDA_DIR).display()
        );
        eprintln!("Creating new workspace in ./{}/", AGENDA_DIR);
    }

    fs::create_dir_all(&agenda_dir)?;
    fs::write(&config_path, CONFIG_TOML_TEMPLATE)?;
    tracing::info!(path = %config_path.display(), "wrote workspace config");

    println!("Initialized agenda workspace in {}", agenda_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{AgendaConfig, NoteOrder, PersistMode};

    #[test]
    fn template_parses_to_defaults() {
        let config: AgendaConfig = toml::from_str(CONFIG_TOML_TEMPLATE).unwrap();
        assert_eq!(config.store.file, "agendas.json");
        assert_eq!(config.store.persist, PersistMode::File);
        assert_eq!(config.limits.min_duration, 5);
        assert_eq!(config.limits.max_duration, 480);
        assert_eq!(config.display.note_order, NoteOrder::OldestFirst);
        assert_eq!(config.email.smtp_port, 587);
        assert!(config.email.distribution_list.is_empty());
    }

    #[test]
    fn template_is_editable() {
        let doc: toml_edit::DocumentMut = CONFIG_TOML_TEMPLATE.parse().unwrap();
        assert!(doc.contains_table("email"));
    }
}
