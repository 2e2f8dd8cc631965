//! Command dispatch. Every mutation of field values goes through a
//! workbench edit session, so the validator always runs before a save.

use std::io::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use domain::session::Workbench;
use domain::{
    Clock, CoreError, IdGenerator, NewPartnership, PartnershipId, PartnershipRecord, SlotStorage,
    Timestamp,
};
use tracing::info;

use crate::args::EditFlags;

#[derive(Debug, PartialEq)]
pub enum Command {
    List,
    Search(String),
    Show(String),
    Create(EditFlags),
    Edit(String, EditFlags),
    Delete(String),
    Export,
}

impl Command {
    /// Parse the arguments after the program name. `Ok(None)` means the
    /// usage text should be shown.
    pub fn parse(args: &[String]) -> Result<Option<Self>, String> {
        let Some((cmd, rest)) = args.split_first() else {
            return Ok(None);
        };
        let id_arg = |what: &str| {
            rest.first()
                .cloned()
                .ok_or_else(|| format!("missing <id> for {}", what))
        };
        let cmd = match cmd.as_str() {
            "list" => Command::List,
            "search" => Command::Search(rest.join(" ")),
            "show" => Command::Show(id_arg("show")?),
            "create" => Command::Create(EditFlags::parse(rest)?),
            "edit" => Command::Edit(id_arg("edit")?, EditFlags::parse(&rest[1..])?),
            "delete" => Command::Delete(id_arg("delete")?),
            "export" => Command::Export,
            _ => return Ok(None),
        };
        Ok(Some(cmd))
    }
}

pub fn usage() -> String {
    format!(
        "{}\n\nUsage:\n  admin-cli list\n  admin-cli search <query>\n  admin-cli show <id>\n  \
         admin-cli create [flags]\n  admin-cli edit <id> [flags]\n  admin-cli delete <id>\n  \
         admin-cli export\n\nFlags:\n  --name <name>  --currency <USD|EUR|GBP>  --url <portal url>\n  \
         --fee <0-100>  --feature <name>  --no-feature <name>\n  \
         --instant-billing  --no-instant-billing",
        domain::about()
    )
}

fn io_err(e: io::Error) -> String {
    format!("write failed: {}", e)
}

fn parse_id(s: &str) -> Result<PartnershipId, String> {
    PartnershipId::new(s).map_err(|e| format!("{}: {}", e, s))
}

pub fn execute<S, C, G, W>(
    wb: &mut Workbench<S, C, G>,
    cmd: Command,
    out: &mut W,
) -> Result<(), String>
where
    S: SlotStorage,
    C: Clock,
    G: IdGenerator,
    W: Write,
{
    match cmd {
        Command::List => print_rows(out, &wb.store().list()),
        Command::Search(query) => print_rows(out, &wb.store().filter(&query)),
        Command::Show(id) => {
            let id = parse_id(&id)?;
            let rec = wb.store().find(&id).ok_or_else(|| format!("not found: {}", id))?;
            print_details(out, &rec)
        }
        Command::Create(flags) => {
            let session = wb
                .create_and_edit(NewPartnership::default())
                .map_err(|e| format!("create failed: {}", e))?;
            flags.apply(session.draft_mut());
            let rec = save(wb)?;
            info!(id = %rec.id, "partnership created");
            writeln!(out, "created: {} ({})", rec.id, rec.name).map_err(io_err)
        }
        Command::Edit(id, flags) => {
            let id = parse_id(&id)?;
            let session = wb.begin_edit(&id).map_err(|e| match e {
                CoreError::NotFound => format!("not found: {}", id),
                other => format!("edit failed: {}", other),
            })?;
            flags.apply(session.draft_mut());
            let rec = save(wb)?;
            info!(id = %rec.id, "partnership updated");
            writeln!(out, "updated: {} ({})", rec.id, rec.name).map_err(io_err)
        }
        Command::Delete(id) => {
            let id = parse_id(&id)?;
            if wb.delete(&id) {
                info!(id = %id, "partnership deleted");
                writeln!(out, "deleted: {}", id).map_err(io_err)
            } else {
                writeln!(out, "nothing to delete: {}", id).map_err(io_err)
            }
        }
        Command::Export => {
            let json = wb
                .store()
                .export_json()
                .map_err(|e| format!("export failed: {}", e))?;
            writeln!(out, "{}", json).map_err(io_err)
        }
    }
}

/// Save the open session; on failure report each field and abandon the
/// session, which discards an untouched placeholder.
fn save<S: SlotStorage, C: Clock, G: IdGenerator>(
    wb: &mut Workbench<S, C, G>,
) -> Result<PartnershipRecord, String> {
    match wb.save_edit() {
        Ok(rec) => Ok(rec),
        Err(CoreError::Validation(errors)) => {
            wb.cancel_edit();
            let lines: Vec<String> = errors
                .iter()
                .map(|(field, err)| format!("  {}: {}", field.as_str(), err.message))
                .collect();
            Err(format!("validation failed:\n{}", lines.join("\n")))
        }
        Err(e) => {
            wb.cancel_edit();
            Err(format!("save failed: {}", e))
        }
    }
}

fn print_rows<W: Write>(out: &mut W, rows: &[PartnershipRecord]) -> Result<(), String> {
    if rows.is_empty() {
        return writeln!(out, "No partnerships.").map_err(io_err);
    }
    for r in rows {
        let billing = if r.instant_billing { "  [instant billing]" } else { "" };
        writeln!(
            out,
            "{}  {:<24}  {}  {}{}",
            r.id, r.name, r.currency, r.portal_url, billing
        )
        .map_err(io_err)?;
    }
    Ok(())
}

fn print_details<W: Write>(out: &mut W, r: &PartnershipRecord) -> Result<(), String> {
    let features: Vec<&str> = r.features.iter().map(|f| f.as_str()).collect();
    let features = if features.is_empty() {
        "-".to_string()
    } else {
        features.join(", ")
    };
    writeln!(
        out,
        "id:              {}\nname:            {}\ncurrency:        {}\nportal url:      {}\n\
         features:        {}\nitem fee:        {}%\ninstant billing: {}\n\
         created:         {}\nlast update:     {}",
        r.id,
        r.name,
        r.currency,
        r.portal_url,
        features,
        r.item_fee_percent,
        if r.instant_billing { "yes" } else { "no" },
        format_timestamp(r.created_at),
        format_timestamp(r.last_update),
    )
    .map_err(io_err)
}

fn format_timestamp(ts: Option<Timestamp>) -> String {
    ts.and_then(|t| i64::try_from(t.as_millis()).ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "-".to_string())
}
