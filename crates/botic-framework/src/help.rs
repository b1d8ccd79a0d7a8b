//! Help text rendering.

use std::fmt::Write;

use botic_core::Command;

/// Renders the usage text for `bot_id` with one aligned row per command.
///
/// Rows appear in iteration order; [`CommandRouter`](crate::CommandRouter)
/// supplies commands sorted by name.
pub fn render<'a>(bot_id: &str, commands: impl IntoIterator<Item = &'a Command>) -> String {
    let commands: Vec<&Command> = commands.into_iter().collect();
    let width = commands
        .iter()
        .map(|c| c.name().chars().count())
        .max()
        .unwrap_or(0);

    let mut rows = String::new();
    for command in commands {
        let row = format!("\t{:<width$} {}", command.name(), command.help());
        let _ = writeln!(rows, "{}", row.trim_end());
    }

    format!(
        "{bot_id} bot usage:\n\
         \t@{bot_id} command-name [optional command-input-string]...\n\
         \n\
         Commands:\n\
         {rows}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandRouter;

    fn noop(name: &str, help: &str) -> Command {
        Command::new(name, help, |_event| async { Ok(()) })
    }

    #[test]
    fn test_one_row_per_command() {
        let router = CommandRouter::new()
            .with(noop("ping", "replies pong"))
            .with(noop("deploy", "ships the build"))
            .with(noop("status", "shows status"));

        let help = router.help("opsbot");
        for (name, text) in [
            ("ping", "replies pong"),
            ("deploy", "ships the build"),
            ("status", "shows status"),
        ] {
            let rows: Vec<&str> = help.lines().filter(|l| l.contains(name)).collect();
            assert_eq!(rows.len(), 1, "{name} in {help}");
            assert!(rows[0].contains(text));
        }
        assert!(help.matches("opsbot").count() >= 2);
        assert!(help.contains("@opsbot command-name"));
    }

    #[test]
    fn test_rows_are_sorted_and_aligned() {
        let router = CommandRouter::new()
            .with(noop("zeta", "last"))
            .with(noop("a", "first"))
            .with(noop("middle", "between"));

        let help = router.help("bot");
        let rows: Vec<&str> = help
            .split("Commands:\n")
            .nth(1)
            .unwrap_or_default()
            .lines()
            .collect();

        assert_eq!(rows, vec!["\ta      first", "\tmiddle between", "\tzeta   last"]);
    }

    #[test]
    fn test_empty_table_still_renders_usage() {
        let help = CommandRouter::new().help("bot");
        assert!(help.starts_with("bot bot usage:\n"));
        assert!(help.ends_with("Commands:\n"));
    }
}
