//! Account commands, one per screen action.

use std::io::{self, Write};

use anyhow::{bail, Result};
use brewing_core::{
    AuthResponse, FieldErrors, Session, SessionManager, SessionPatch, SignInCredentials,
    SignUpCredentials,
};
use tracing::warn;

pub const USAGE: &str = "\
Usage: brewing <command>

Commands:
  status            Show who is signed in
  login [email]     Sign in with email and password
  signup [email]    Create an account
  guest             Continue as a guest (local only)
  logout            Sign out and forget the saved session
  rename <name>     Change your display name
  avatar <uri>      Change your avatar image";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Login { email: Option<String> },
    Signup { email: Option<String> },
    Guest,
    Logout,
    Rename { name: String },
    Avatar { uri: String },
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let rest = args.get(1..).unwrap_or_default();
        let joined = rest.join(" ");

        match args.first().map(String::as_str) {
            None | Some("status") => Ok(Command::Status),
            Some("login") => Ok(Command::Login {
                email: rest.first().cloned(),
            }),
            Some("signup") => Ok(Command::Signup {
                email: rest.first().cloned(),
            }),
            Some("guest") => Ok(Command::Guest),
            Some("logout") => Ok(Command::Logout),
            Some("rename") if !joined.trim().is_empty() => Ok(Command::Rename {
                name: joined.trim().to_string(),
            }),
            Some("avatar") if !joined.trim().is_empty() => Ok(Command::Avatar {
                uri: joined.trim().to_string(),
            }),
            Some(cmd @ ("rename" | "avatar")) => bail!("'{}' needs a value", cmd),
            Some(other) => bail!("Unknown command: {}", other),
        }
    }
}

pub async fn run(manager: &SessionManager, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            print_status(manager.current_session().as_ref());
            Ok(())
        }
        Command::Login { email } => login(manager, email).await,
        Command::Signup { email } => signup(manager, email).await,
        Command::Guest => {
            if let Some(session) = manager.current_session() {
                bail!("Already signed in as {}", describe(&session));
            }
            let guest = manager
                .continue_as_guest()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Continuing as {}", describe(&guest));
            Ok(())
        }
        Command::Logout => {
            if manager.is_authenticated() {
                manager.sign_out().await;
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
            Ok(())
        }
        Command::Rename { name } => update(manager, SessionPatch::name(name)).await,
        Command::Avatar { uri } => update(manager, SessionPatch::avatar(uri)).await,
    }
}

fn describe(session: &Session) -> String {
    if session.is_guest() {
        format!("{} (guest)", session.name)
    } else {
        format!("{} <{}>", session.name, session.email)
    }
}

fn print_status(session: Option<&Session>) {
    match session {
        Some(session) => {
            println!("Signed in as {}", describe(session));
            if let Some(ref avatar) = session.avatar {
                println!("Avatar: {}", avatar);
            }
            if let Some(ref created_at) = session.created_at {
                println!("Member since: {}", created_at);
            }
        }
        None => println!("Not signed in. Run `brewing login`, `brewing signup` or `brewing guest`."),
    }
}

fn ensure_signed_out(manager: &SessionManager) -> Result<()> {
    // Sign-in failure never clears a live session, so only offer it when signed out
    if let Some(session) = manager.current_session() {
        bail!(
            "Already signed in as {}. Run `brewing logout` first.",
            describe(&session)
        );
    }
    Ok(())
}

async fn login(manager: &SessionManager, email: Option<String>) -> Result<()> {
    ensure_signed_out(manager)?;

    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let credentials = SignInCredentials::new(email, password);
    check_form(&credentials.validate())?;

    let response = AuthResponse::from(manager.sign_in(&credentials.normalized()).await);
    report(response)
}

async fn signup(manager: &SessionManager, email: Option<String>) -> Result<()> {
    ensure_signed_out(manager)?;

    let name = prompt("Name: ")?;
    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let credentials = SignUpCredentials::new(email, password, name);
    check_form(&credentials.validate())?;

    let response = AuthResponse::from(manager.sign_up(&credentials.normalized()).await);
    report(response)
}

async fn update(manager: &SessionManager, patch: SessionPatch) -> Result<()> {
    let session = manager
        .update_user(&patch)
        .await
        .map_err(|e| anyhow::anyhow!("{}. Run `brewing login` first.", e))?;
    print_status(Some(&session));
    Ok(())
}

fn check_form(errors: &FieldErrors) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    for message in [&errors.name, &errors.email, &errors.password]
        .into_iter()
        .flatten()
    {
        eprintln!("  - {}", message);
    }
    bail!("Please fix the fields above")
}

fn report(response: AuthResponse) -> Result<()> {
    match (response.success, response.user) {
        (true, Some(session)) => {
            println!("Welcome, {}!", describe(&session));
            Ok(())
        }
        _ => {
            let message = response
                .error
                .unwrap_or_else(|| "An unexpected error occurred".to_string());
            warn!(%message, "Authentication failed");
            bail!("Authentication error: {}", message)
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults_to_status() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Status);
        assert_eq!(Command::parse(&args(&["status"])).unwrap(), Command::Status);
    }

    #[test]
    fn test_parse_login_with_optional_email() {
        assert_eq!(
            Command::parse(&args(&["login"])).unwrap(),
            Command::Login { email: None }
        );
        assert_eq!(
            Command::parse(&args(&["login", "a@b.com"])).unwrap(),
            Command::Login {
                email: Some("a@b.com".to_string())
            }
        );
    }

    #[test]
    fn test_parse_rename_joins_words() {
        assert_eq!(
            Command::parse(&args(&["rename", "Ann", "Lee"])).unwrap(),
            Command::Rename {
                name: "Ann Lee".to_string()
            }
        );
        assert!(Command::parse(&args(&["rename"])).is_err());
        assert!(Command::parse(&args(&["avatar", "  "])).is_err());
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = Command::parse(&args(&["brew"])).unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: brew");
    }

    #[test]
    fn test_describe_guest_hides_placeholder_email() {
        let guest = Session {
            id: "guest-1700000000000".to_string(),
            email: "guest@brewing.app".to_string(),
            name: "Guest User".to_string(),
            avatar: None,
            created_at: None,
        };
        assert_eq!(describe(&guest), "Guest User (guest)");

        let member = Session {
            id: "u1".to_string(),
            ..guest
        };
        assert_eq!(describe(&member), "Guest User <guest@brewing.app>");
    }
}
