pub mod json;
pub mod table;

use clap::ValueEnum;
use terseurl_storage::Permission;

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Comma separated flag names, or `-` when nothing is set.
pub fn permission_label(permission: &Permission) -> String {
    let flags = [
        (permission.owner, "owner"),
        (permission.read_summary, "read_summary"),
        (permission.read_visits, "read_visits"),
        (permission.write_terse, "write_terse"),
    ];

    let names: Vec<&str> = flags
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| *name)
        .collect();

    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_label() {
        assert_eq!(permission_label(&Permission::default()), "-");
        assert_eq!(permission_label(&Permission::owner()), "owner");
        assert_eq!(
            permission_label(&Permission::default().with_read_summary().with_write_terse()),
            "read_summary,write_terse"
        );
    }
}
