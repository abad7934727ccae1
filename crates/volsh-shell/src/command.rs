//! The static command table.

/// The closed set of shell commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// List a directory.
    List,
    /// Create a directory.
    MakeDirectory,
    /// Remove a file or directory.
    Remove,
    /// Stream a file to standard output.
    ReadFile,
    /// Fill a file from standard input.
    WriteFile,
}

/// Ordered command-name table, built once; first exact match wins.
pub const COMMAND_TABLE: &[(&str, CommandKind)] = &[
    ("ls", CommandKind::List),
    ("mkdir", CommandKind::MakeDirectory),
    ("rm", CommandKind::Remove),
    ("cat", CommandKind::ReadFile),
    ("write", CommandKind::WriteFile),
];

impl CommandKind {
    /// Case-sensitive exact-match lookup in the command table.
    pub fn lookup(name: &str) -> Option<CommandKind> {
        COMMAND_TABLE
            .iter()
            .find(|(cmd, _)| *cmd == name)
            .map(|&(_, kind)| kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_commands() {
        assert_eq!(CommandKind::lookup("ls"), Some(CommandKind::List));
        assert_eq!(CommandKind::lookup("mkdir"), Some(CommandKind::MakeDirectory));
        assert_eq!(CommandKind::lookup("rm"), Some(CommandKind::Remove));
        assert_eq!(CommandKind::lookup("cat"), Some(CommandKind::ReadFile));
        assert_eq!(CommandKind::lookup("write"), Some(CommandKind::WriteFile));
    }

    #[test]
    fn test_lookup_unknown() {
        assert_eq!(CommandKind::lookup("move"), None);
        assert_eq!(CommandKind::lookup(""), None);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(CommandKind::lookup("LS"), None);
        assert_eq!(CommandKind::lookup("Cat"), None);
    }
}
