use std::collections::BTreeMap;

use anyhow::Result;
use comfy_table::{Cell, Table};
use terseurl_storage::Permission;

use super::permission_label;

pub fn print_table(table: Table) -> Result<()> {
    println!("{table}");
    Ok(())
}

/// Two level grant listing, outer key first.
pub fn grant_table(
    outer_header: &str,
    inner_header: &str,
    grants: &BTreeMap<String, BTreeMap<String, Permission>>,
) -> Table {
    let mut table = Table::new();
    table.set_header(vec![outer_header, inner_header, "Permissions"]);

    for (outer, inner) in grants {
        for (key, permission) in inner {
            table.add_row(vec![
                Cell::new(outer),
                Cell::new(key),
                Cell::new(permission_label(permission)),
            ]);
        }
    }

    table
}
