//! Machine-readable description of the command tree
//!
//! Walks the clap [`Command`] built from the derive types, so every command
//! and flag declared in [`commands`](super::commands) is listed with no
//! extra registration.

use anyhow::Result;
use clap::{Arg, Command, CommandFactory};
use serde::Serialize;

use super::commands::Cli;

/// A command and its subcommands
#[derive(Debug, Clone, Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_about: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<String>,
    pub flags: Vec<FlagInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandInfo>,
}

/// A flag or positional argument
#[derive(Debug, Clone, Serialize)]
pub struct FlagInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub required: bool,
    pub global: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub positional: bool,
}

impl CommandInfo {
    /// Describe the whole CLI
    pub fn root() -> Self {
        Self::from_command(&Cli::command())
    }

    fn from_command(cmd: &Command) -> Self {
        Self {
            name: cmd.get_name().to_string(),
            about: cmd.get_about().map(|about| about.to_string()),
            long_about: cmd.get_long_about().map(|about| about.to_string()),
            aliases: cmd.get_visible_aliases().map(str::to_string).collect(),
            examples: cmd.get_after_help().and_then(|text| examples(&text.to_string())),
            flags: cmd
                .get_arguments()
                .filter(|arg| !arg.is_hide_set())
                .map(FlagInfo::from_arg)
                .collect(),
            subcommands: cmd
                .get_subcommands()
                .filter(|sub| !sub.is_hide_set())
                .map(Self::from_command)
                .collect(),
        }
    }

    /// Find a command by its path below this one
    pub fn find(&self, path: &[&str]) -> Option<&CommandInfo> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self
                .subcommands
                .iter()
                .find(|sub| sub.name == *head)
                .and_then(|sub| sub.find(rest)),
        }
    }

    pub fn flag(&self, name: &str) -> Option<&FlagInfo> {
        self.flags.iter().find(|flag| flag.name == name)
    }
}

impl FlagInfo {
    fn from_arg(arg: &Arg) -> Self {
        Self {
            name: arg
                .get_long()
                .map(str::to_string)
                .unwrap_or_else(|| arg.get_id().to_string()),
            short: arg.get_short(),
            help: arg.get_help().map(|help| help.to_string()),
            default: arg
                .get_default_values()
                .first()
                .map(|value| value.to_string_lossy().into_owned()),
            required: arg.is_required_set(),
            global: arg.is_global_set(),
            positional: arg.is_positional(),
        }
    }
}

/// Example lines of an `after_help` block, without the heading and indent
fn examples(after_help: &str) -> Option<String> {
    let body = after_help.trim().strip_prefix("Examples:")?;
    let lines: Vec<&str> = body
        .lines()
        .map(|line| line.strip_prefix("  ").unwrap_or(line))
        .collect();
    let text = lines.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Print the command tree as pretty JSON
pub fn print_command_list() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&CommandInfo::root())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_lists_global_flags() {
        let root = CommandInfo::root();
        assert_eq!(root.name, "ahrefs");

        let format = root.flag("format").unwrap();
        assert!(format.global);
        assert_eq!(format.default.as_deref(), Some("json"));
        assert_eq!(root.flag("output").unwrap().short, Some('o'));
        assert!(!root.flag("list-commands").unwrap().global);

        // hidden
        assert!(root.flag("base-url").is_none());
    }

    #[test]
    fn test_backlinks_flags() {
        let root = CommandInfo::root();
        let backlinks = root.find(&["site-explorer", "backlinks"]).unwrap();

        let target = backlinks.flag("target").unwrap();
        assert!(target.required);
        assert_eq!(backlinks.flag("limit").unwrap().default.as_deref(), Some("100"));
        assert_eq!(backlinks.flag("mode").unwrap().default.as_deref(), Some("domain"));
        assert!(backlinks.flag("where").is_some());
        assert!(backlinks.flag("order-by").is_some());

        let examples = backlinks.examples.as_deref().unwrap();
        assert!(examples.starts_with("# First 100 backlinks"));
        assert!(examples.contains("ahrefs site-explorer backlinks --target example.com"));
    }

    #[test]
    fn test_aliases_and_positionals() {
        let root = CommandInfo::root();
        let site_explorer = root.find(&["site-explorer"]).unwrap();
        assert_eq!(site_explorer.aliases, vec!["se".to_string()]);
        assert_eq!(site_explorer.subcommands.len(), 13);

        let set_key = root.find(&["config", "set-key"]).unwrap();
        let api_key = set_key.flag("api_key").unwrap();
        assert!(api_key.positional);
        assert!(api_key.required);
    }

    #[test]
    fn test_serialized_tree_omits_empty_parts() {
        let root = CommandInfo::root();
        let json = serde_json::to_value(root.find(&["config", "show"]).unwrap()).unwrap();
        assert_eq!(json["name"], "show");
        assert!(json.get("subcommands").is_none());
        assert!(json.get("aliases").is_none());
        assert!(json["flags"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_examples_strip_heading() {
        assert_eq!(
            examples("Examples:\n  # one\n  ahrefs se metrics --target a.com"),
            Some("# one\nahrefs se metrics --target a.com".to_string())
        );
        assert_eq!(examples("See the docs"), None);
    }
}
