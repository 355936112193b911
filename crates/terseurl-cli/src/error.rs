use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let msg = err.to_string().to_lowercase();

    if msg.contains("out of sync") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Rebuild the reverse index from stored permissions with:");
        eprintln!("  {} terseurl-authz rebuild", "$".dimmed());
    }

    if msg.contains("not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  List what is stored with:");
        eprintln!("  {} terseurl-authz users", "$".dimmed());
    }

    if msg.contains("nothing to revoke") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Pass --all to remove all authorization data.");
    }

    if msg.contains("storage failure") || msg.contains("already open") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check that no other process holds the database and try again.");
    }

    std::process::exit(1);
}
