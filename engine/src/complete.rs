//! Shell completion script generation.
//!
//! A completion script is a pure rendering of the registry: command names at
//! the top level, each command's option flags below it. Positional values are
//! never completed, there is no dynamic enumeration to do.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::registry::Registry;

/// Shells with a supported completion syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shell::Bash => f.write_str("bash"),
            Shell::Zsh => f.write_str("zsh"),
        }
    }
}

/// A shell name [`generate`] has no renderer for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported shell \"{0}\"; supported shells are: bash, zsh")]
pub struct UnsupportedShell(pub String);

impl FromStr for Shell {
    type Err = UnsupportedShell;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            _ => Err(UnsupportedShell(s.to_string())),
        }
    }
}

/// Renders a completion script for the registry's program.
///
/// Command names come out alphabetically, with the built-in `help` included.
/// Per command, the flags are the short and long forms of its options
/// catalog.
pub fn generate(shell: Shell, registry: &Registry) -> String {
    match shell {
        Shell::Bash => generate_bash(registry),
        Shell::Zsh => generate_zsh(registry),
    }
}

/// Top-level completion candidates: registered names plus `help`, sorted.
fn command_names(registry: &Registry) -> Vec<String> {
    let mut names: Vec<String> = registry.names().iter().map(|n| n.to_string()).collect();
    names.push("help".to_string());
    names.sort();
    names
}

/// Short and long flags of one command, short forms first.
fn command_flags(registry: &Registry, name: &str) -> Vec<String> {
    let Some(entry) = registry.get(name) else {
        return Vec::new();
    };
    let mut flags = Vec::new();
    for opt in entry.grammar.options.iter() {
        if let Some(short) = &opt.short {
            flags.push(short.clone());
        }
        if let Some(long) = &opt.long {
            flags.push(long.clone());
        }
    }
    flags
}

// Shell function names allow fewer characters than program names do.
fn func_name(program: &str) -> String {
    program
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn generate_bash(registry: &Registry) -> String {
    let program = registry.program();
    let func = format!("_{}_complete", func_name(program));
    let names = command_names(registry);

    let mut cases = String::new();
    for name in &names {
        let words = if name == "help" {
            names.join(" ")
        } else {
            command_flags(registry, name).join(" ")
        };
        cases.push_str(&format!(
            "        {name})\n            COMPREPLY=($(compgen -W \"{words}\" -- \"$cur\"))\n            ;;\n"
        ));
    }

    format!(
        "# {program} bash completions\n\
         {func}() {{\n    \
             local cur=\"${{COMP_WORDS[COMP_CWORD]}}\"\n    \
             if [[ $COMP_CWORD -eq 1 ]]; then\n        \
                 COMPREPLY=($(compgen -W \"{commands}\" -- \"$cur\"))\n        \
                 return\n    \
             fi\n    \
             case \"${{COMP_WORDS[1]}}\" in\n\
         {cases}    \
             esac\n\
         }}\n\
         complete -F {func} {program}\n",
        commands = names.join(" "),
    )
}

fn generate_zsh(registry: &Registry) -> String {
    let program = registry.program();
    let func = format!("_{}", func_name(program));
    let names = command_names(registry);

    let mut rows = String::new();
    for name in &names {
        let summary = if name == "help" {
            "Display help for a command.".to_string()
        } else {
            registry
                .get(name)
                .map(|entry| entry.summary().to_string())
                .unwrap_or_default()
        };
        rows.push_str(&format!(
            "        '{name}:{summary}'\n",
            summary = zsh_escape(&summary),
        ));
    }

    let mut cases = String::new();
    for name in &names {
        let flags = command_flags(registry, name);
        if flags.is_empty() {
            continue;
        }
        let specs: Vec<String> = flags.iter().map(|f| format!("'{f}'")).collect();
        cases.push_str(&format!(
            "        {name})\n            _arguments {}\n            ;;\n",
            specs.join(" "),
        ));
    }

    format!(
        "#compdef {program}\n\
         \n\
         {func}() {{\n    \
             if (( CURRENT == 2 )); then\n        \
                 local -a commands\n        \
                 commands=(\n\
         {rows}        \
                 )\n        \
                 _describe 'command' commands\n        \
                 return\n    \
             fi\n    \
             case \"${{words[2]}}\" in\n\
         {cases}    \
             esac\n\
         }}\n\
         \n\
         {func} \"$@\"\n"
    )
}

/// `_describe` rows use `:` as the separator and `'` as the quote.
fn zsh_escape(s: &str) -> String {
    s.replace('\'', "'\\''").replace(':', "\\:")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let mut registry = Registry::new("pets", "0.1.0");
        registry
            .register(
                "roar",
                "Make a lion sound.\n\n\
                 Usage: pets roar [-l]\n\n\
                 Options:\n  -l, --loud  Roar louder.\n",
                vec![],
                |_| Ok(0),
            )
            .unwrap();
        registry
            .register("meow", "Make a cat sound.\n\nUsage: pets meow", vec![], |_| Ok(0))
            .unwrap();
        registry
    }

    #[test]
    fn shell_names_parse_case_insensitively() {
        assert_eq!("Bash".parse::<Shell>().unwrap(), Shell::Bash);
        assert_eq!("zsh".parse::<Shell>().unwrap(), Shell::Zsh);
        let err = "fish".parse::<Shell>().unwrap_err();
        assert!(err.to_string().contains("fish"));
    }

    #[test]
    fn bash_script_lists_commands_and_flags() {
        let script = generate(Shell::Bash, &registry());
        assert!(script.contains("complete -F _pets_complete pets"));
        assert!(script.contains("compgen -W \"help meow roar\""));
        assert!(script.contains("-l --loud"));
    }

    #[test]
    fn bash_help_case_completes_command_names() {
        let script = generate(Shell::Bash, &registry());
        let help_case = script
            .lines()
            .skip_while(|l| !l.trim_start().starts_with("help)"))
            .nth(1)
            .unwrap();
        assert!(help_case.contains("help meow roar"));
    }

    #[test]
    fn zsh_script_describes_commands_with_summaries() {
        let script = generate(Shell::Zsh, &registry());
        assert!(script.starts_with("#compdef pets"));
        assert!(script.contains("'meow:Make a cat sound.'"));
        assert!(script.contains("'help:Display help for a command.'"));
        assert!(script.contains("_arguments '-l' '--loud'"));
    }

    #[test]
    fn zsh_escape_protects_separator_characters() {
        assert_eq!(zsh_escape("a:b"), "a\\:b");
        assert_eq!(zsh_escape("it's"), "it'\\''s");
    }

    #[test]
    fn dashed_program_names_get_sound_function_names() {
        let registry = Registry::new("my-tool", "0.1.0");
        let script = generate(Shell::Bash, &registry);
        assert!(script.contains("_my_tool_complete()"));
        assert!(script.contains("complete -F _my_tool_complete my-tool"));
    }
}
