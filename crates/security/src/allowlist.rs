//! Command allowlist for the shell capability.
//!
//! Default-deny: an empty list permits nothing. The program name is the first
//! whitespace-delimited token of the command line, compared case-insensitively
//! and exactly against each entry.
//!
//! The command line is handed to the platform shell, so anything that would
//! chain, pipe, redirect or substitute a second program is rejected before the
//! program name is looked at.

/// Characters that let one command line start more than one program.
pub const SHELL_OPERATORS: &[char] = &[';', '&', '|', '<', '>', '$', '`', '(', ')', '\n', '\r'];

/// Result of checking a command line against the allowlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandCheck {
    /// The program is allowed
    Allowed { program: String },
    /// The program is not on the list
    Denied { program: String, allowed: String },
    /// The line contains a shell operator
    Operator { operator: char },
}

/// An enumerated set of permitted program names.
#[derive(Debug, Clone, Default)]
pub struct CommandAllowlist {
    entries: Vec<String>,
}

impl CommandAllowlist {
    pub fn new(entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// The configured entries, as given.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Lowercased first token of `command`, or empty.
    pub fn program_of(command: &str) -> String {
        command
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase()
    }

    /// First shell operator in `command`, if any.
    pub fn operator_in(command: &str) -> Option<char> {
        command.chars().find(|c| SHELL_OPERATORS.contains(c))
    }

    /// Check a full command line.
    pub fn check(&self, command: &str) -> CommandCheck {
        if let Some(operator) = Self::operator_in(command) {
            return CommandCheck::Operator { operator };
        }

        let program = Self::program_of(command);

        let allowed = !program.is_empty()
            && self.entries.iter().any(|e| e.to_lowercase() == program);

        if allowed {
            CommandCheck::Allowed { program }
        } else {
            CommandCheck::Denied {
                program,
                allowed: self.describe(),
            }
        }
    }

    /// The list rendered for error messages, e.g. `[ls, cat]`.
    pub fn describe(&self) -> String {
        format!("[{}]", self.entries.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_program_with_arguments() {
        let list = CommandAllowlist::new(["ls", "cat", "git"]);
        assert_eq!(
            list.check("ls -la"),
            CommandCheck::Allowed { program: "ls".into() }
        );
        assert!(matches!(list.check("git status"), CommandCheck::Allowed { .. }));
    }

    #[test]
    fn denied_program_is_named() {
        let list = CommandAllowlist::new(["ls"]);
        assert_eq!(
            list.check("rm -rf /"),
            CommandCheck::Denied {
                program: "rm".into(),
                allowed: "[ls]".into(),
            }
        );
    }

    #[test]
    fn comparison_is_case_insensitive() {
        let list = CommandAllowlist::new(["LS"]);
        assert!(matches!(list.check("Ls -la"), CommandCheck::Allowed { .. }));
    }

    #[test]
    fn match_is_exact_not_prefix() {
        let list = CommandAllowlist::new(["ls"]);
        assert!(matches!(list.check("lsblk"), CommandCheck::Denied { .. }));
        assert!(matches!(list.check("/bin/ls"), CommandCheck::Denied { .. }));
    }

    #[test]
    fn empty_allowlist_denies_all() {
        let list = CommandAllowlist::default();
        assert!(matches!(list.check("ls"), CommandCheck::Denied { .. }));
    }

    #[test]
    fn empty_command_denied() {
        let list = CommandAllowlist::new(["ls"]);
        assert_eq!(
            list.check("   "),
            CommandCheck::Denied {
                program: String::new(),
                allowed: "[ls]".into(),
            }
        );
    }

    #[test]
    fn shell_operators_rejected() {
        let list = CommandAllowlist::new(["ls", "cat"]);
        let cases = [
            ("ls && touch pwned", '&'),
            ("ls & rm x", '&'),
            ("ls; rm x", ';'),
            ("ls | xargs rm", '|'),
            ("ls || rm x", '|'),
            ("cat < /etc/passwd", '<'),
            ("ls > out.txt", '>'),
            ("ls $(rm x)", '$'),
            ("ls ${HOME}", '$'),
            ("ls `rm x`", '`'),
            ("ls (x)", '('),
            ("ls x)", ')'),
            ("ls\nrm x", '\n'),
            ("ls\rrm x", '\r'),
        ];
        for (command, operator) in cases {
            assert_eq!(
                list.check(command),
                CommandCheck::Operator { operator },
                "{command:?}"
            );
        }
    }

    #[test]
    fn quotes_and_dashes_are_plain_arguments() {
        let list = CommandAllowlist::new(["ls"]);
        assert!(matches!(list.check("ls -la 'my dir'"), CommandCheck::Allowed { .. }));
    }

    #[test]
    fn leading_whitespace_ignored() {
        let list = CommandAllowlist::new(["echo"]);
        assert!(matches!(list.check("  echo hi"), CommandCheck::Allowed { .. }));
    }
}
