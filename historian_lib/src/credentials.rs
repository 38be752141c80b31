//! Credential resolution for the historian service.
//!
//! Resolution order is explicit value, then environment variable, then an
//! interactive prompt. The username prompt defaults to the OS login name;
//! the password prompt never echoes input. Environment and terminal access
//! go through [`CredentialSource`] so tests can substitute fakes.

use std::io::{self, BufRead, Write};

use crate::error::Error;

/// Environment variable holding the historian username.
pub const USERNAME_ENV: &str = "SC_USER";
/// Environment variable holding the historian password.
pub const PASSWORD_ENV: &str = "SC_PASSWORD";

/// Ambient sources the resolution chain draws from.
pub trait CredentialSource {
    /// Read an environment variable; empty values count as unset.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Prompt for a username on the controlling terminal.
    fn prompt_username(&self, default: &str) -> Result<String, Error>;

    /// Prompt for a password with input masking.
    fn prompt_password(&self) -> Result<String, Error>;

    /// Login name reported by the OS environment, if any.
    fn login_name(&self) -> Option<String>;
}

/// Real process environment and terminal.
pub struct Terminal;

impl CredentialSource for Terminal {
    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn prompt_username(&self, default: &str) -> Result<String, Error> {
        print!("SC user [{default}]: ");
        io::stdout()
            .flush()
            .map_err(|e| Error::Other(e.to_string()))?;
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(line.trim().to_string())
    }

    fn prompt_password(&self) -> Result<String, Error> {
        rpassword::prompt_password("SC password: ").map_err(|e| Error::Other(e.to_string()))
    }

    fn login_name(&self) -> Option<String> {
        // getpass-style lookup; LOGNAME/USER on unix, USERNAME on windows.
        ["LOGNAME", "USER", "USERNAME"]
            .iter()
            .find_map(|name| self.env_var(name))
    }
}

/// Resolve a username: environment first, then a prompt defaulting to the
/// OS login name (empty input accepts the default).
pub fn resolve_username(source: &dyn CredentialSource) -> Result<String, Error> {
    if let Some(user) = source.env_var(USERNAME_ENV) {
        return Ok(user);
    }
    let fallback = source.login_name().unwrap_or_default();
    let entered = source.prompt_username(&fallback)?;
    if entered.is_empty() {
        Ok(fallback)
    } else {
        Ok(entered)
    }
}

/// Resolve a password: environment first, then a masked prompt.
pub fn resolve_password(source: &dyn CredentialSource) -> Result<String, Error> {
    if let Some(password) = source.env_var(PASSWORD_ENV) {
        return Ok(password);
    }
    source.prompt_password()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeSource {
        env: HashMap<&'static str, &'static str>,
        login: Option<&'static str>,
        username_input: &'static str,
        password_input: &'static str,
        prompts: Cell<u32>,
    }

    impl CredentialSource for FakeSource {
        fn env_var(&self, name: &str) -> Option<String> {
            self.env.get(name).map(|v| v.to_string())
        }

        fn prompt_username(&self, _default: &str) -> Result<String, Error> {
            self.prompts.set(self.prompts.get() + 1);
            Ok(self.username_input.to_string())
        }

        fn prompt_password(&self) -> Result<String, Error> {
            self.prompts.set(self.prompts.get() + 1);
            Ok(self.password_input.to_string())
        }

        fn login_name(&self) -> Option<String> {
            self.login.map(|l| l.to_string())
        }
    }

    #[test]
    fn username_from_env_skips_prompt() {
        let source = FakeSource {
            env: HashMap::from([(USERNAME_ENV, "alice")]),
            ..Default::default()
        };
        assert_eq!(resolve_username(&source).unwrap(), "alice");
        assert_eq!(source.prompts.get(), 0);
    }

    #[test]
    fn username_prompted_when_env_absent() {
        let source = FakeSource {
            username_input: "bob",
            login: Some("osuser"),
            ..Default::default()
        };
        assert_eq!(resolve_username(&source).unwrap(), "bob");
        assert_eq!(source.prompts.get(), 1);
    }

    #[test]
    fn empty_username_input_takes_os_login() {
        let source = FakeSource {
            login: Some("osuser"),
            ..Default::default()
        };
        assert_eq!(resolve_username(&source).unwrap(), "osuser");
    }

    #[test]
    fn password_from_env_skips_prompt() {
        let source = FakeSource {
            env: HashMap::from([(PASSWORD_ENV, "hunter2")]),
            ..Default::default()
        };
        assert_eq!(resolve_password(&source).unwrap(), "hunter2");
        assert_eq!(source.prompts.get(), 0);
    }

    #[test]
    fn password_prompted_when_env_absent() {
        let source = FakeSource {
            password_input: "prompted",
            ..Default::default()
        };
        assert_eq!(resolve_password(&source).unwrap(), "prompted");
        assert_eq!(source.prompts.get(), 1);
    }
}
