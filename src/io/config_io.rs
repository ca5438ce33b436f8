use std::fs;
use std::path::Path;

use toml_edit::{Array, DocumentMut, Item, Table, value};

use crate::io::workspace::WorkspaceError;
use crate::model::config::AgendaConfig;

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for comment-preserving edits.
pub fn read_config(agenda_dir: &Path) -> Result<(AgendaConfig, DocumentMut), WorkspaceError> {
    let config_path = agenda_dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: AgendaConfig = toml::from_str(&config_text)?;
    let doc: DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(agenda_dir: &Path, doc: &DocumentMut) -> Result<(), WorkspaceError> {
    let config_path = agenda_dir.join("config.toml");
    crate::io::store_io::atomic_write(&config_path, doc.to_string().as_bytes())?;
    Ok(())
}

fn email_table(doc: &mut DocumentMut) -> Option<&mut Table> {
    if !doc.contains_table("email") {
        doc["email"] = Item::Table(Table::new());
    }
    doc["email"].as_table_mut()
}

/// Fields of `[email]` that can be set from the command line
#[derive(Debug, Default)]
pub struct EmailSettingsUpdate {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub sender: Option<String>,
    pub password: Option<String>,
}

/// Apply the given settings to the `[email]` table. Unset fields are left alone.
pub fn set_email_settings(doc: &mut DocumentMut, update: &EmailSettingsUpdate) {
    let Some(table) = email_table(doc) else {
        return;
    };
    if let Some(host) = &update.smtp_host {
        table["smtp_host"] = value(host.as_str());
    }
    if let Some(port) = update.smtp_port {
        table["smtp_port"] = value(i64::from(port));
    }
    if let Some(sender) = &update.sender {
        table["sender"] = value(sender.as_str());
    }
    if let Some(password) = &update.password {
        table["password"] = value(password.as_str());
    }
}

/// Append an address to the distribution list. Returns false if already present.
pub fn add_recipient(doc: &mut DocumentMut, address: &str) -> bool {
    let Some(table) = email_table(doc) else {
        return false;
    };
    if table.get("distribution_list").and_then(|i| i.as_array()).is_none() {
        table["distribution_list"] = value(Array::new());
    }
    let Some(list) = table["distribution_list"].as_array_mut() else {
        return false;
    };
    if list
        .iter()
        .any(|v| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case(address)))
    {
        return false;
    }
    list.push(address);
    true
}

/// Remove an address from the distribution list. Returns false if it was not there.
pub fn remove_recipient(doc: &mut DocumentMut, address: &str) -> bool {
    let Some(list) = doc
        .get_mut("email")
        .and_then(|e| e.get_mut("distribution_list"))
        .and_then(|l| l.as_array_mut())
    else {
        return false;
    };
    let before = list.len();
    list.retain(|v| !v.as_str().is_some_and(|s| s.eq_ignore_ascii_case(address)));
    list.len() != before
}
