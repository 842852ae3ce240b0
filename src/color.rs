use clap::ValueEnum;
use std::collections::HashMap;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorPolicy {
    Auto,
    Always,
    Never,
}

impl ColorPolicy {
    pub fn enabled(self) -> bool {
        let env: HashMap<String, String> = std::env::vars().collect();
        self.resolve(std::io::stdout().is_terminal(), &env)
    }

    /// Disabling signals (NO_COLOR, CLICOLOR=0, TERM=dumb) win over forcing
    /// ones; the terminal decides when nothing else does.
    pub fn resolve(self, stdout_is_tty: bool, env: &HashMap<String, String>) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => {
                let get = |key: &str| env.get(key).map(String::as_str);
                if env.contains_key("NO_COLOR")
                    || get("CLICOLOR") == Some("0")
                    || get("TERM") == Some("dumb")
                {
                    false
                } else if get("CLICOLOR_FORCE") == Some("1") || get("FORCE_COLOR") == Some("1") {
                    true
                } else {
                    stdout_is_tty
                }
            }
        }
    }
}
