use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const USAGE: &str = "\
usage: group-ringtones <command> [args]

commands:
  get <group>            print the custom ringtone of a group
  set <group> <uri>      store a custom ringtone for a group
  clear <group>          remove the custom ringtone of a group
  pick <group> [uri]     apply a ringtone picker result (none or default clears)
  effective <group>      print the ringtone a group would play
  list [--json]          print every stored record
  export                 print the table in the legacy file format
  import <path>          merge a legacy ringtone file into the store
  help                   show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Get(i64),
    Set(i64, String),
    Clear(i64),
    Pick(i64, Option<String>),
    Effective(i64),
    List { json: bool },
    Export,
    Import(PathBuf),
    Help,
}

/// Map command line arguments (without the program name) to an action.
pub fn parse_args(args: &[String]) -> Result<AppAction> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] | ["help"] | ["--help"] | ["-h"] => Ok(AppAction::Help),

        ["get", group] => Ok(AppAction::Get(parse_group(group)?)),
        ["set", group, uri] => Ok(AppAction::Set(parse_group(group)?, uri.to_string())),
        ["clear", group] => Ok(AppAction::Clear(parse_group(group)?)),
        ["pick", group] => Ok(AppAction::Pick(parse_group(group)?, None)),
        ["pick", group, uri] => Ok(AppAction::Pick(parse_group(group)?, Some(uri.to_string()))),
        ["effective", group] => Ok(AppAction::Effective(parse_group(group)?)),

        ["list"] => Ok(AppAction::List { json: false }),
        ["list", "--json"] => Ok(AppAction::List { json: true }),
        ["export"] => Ok(AppAction::Export),
        ["import", path] => Ok(AppAction::Import(PathBuf::from(path))),

        [command, ..] => Err(AppError::Usage(format!(
            "unknown command or wrong arguments: {}",
            command
        ))),
    }
}

fn parse_group(raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 0 => Ok(id),
        _ => Err(AppError::InvalidGroupId(raw.to_string())),
    }
}
