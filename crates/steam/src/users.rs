//! Accounts that have logged into a Steam installation, read from
//! `config/loginusers.vdf`.

use std::fs;
use std::path::Path;

use crate::SteamError;
use crate::paths::InstallDirectory;
use crate::username::{Username, UsernameError};
use crate::vdf::parse_text_vdf_bytes;

/// An account that has logged into this Steam installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginUser {
    pub steam_id: u64,
    pub account_name: String,
    pub persona_name: String,
    pub allow_auto_login: bool,
    pub most_recent: bool,
}

impl LoginUser {
    /// Returns the account name as a validated [`Username`].
    pub fn username(&self) -> Result<Username, UsernameError> {
        self.account_name.parse()
    }
}

/// Reads the accounts listed in `<install dir>/config/loginusers.vdf`.
pub fn login_users(dir: &InstallDirectory) -> Result<Vec<LoginUser>, SteamError> {
    load_login_users(&dir.login_users_path())
}

/// Reads the accounts listed in a `loginusers.vdf` file.
pub fn load_login_users(path: &Path) -> Result<Vec<LoginUser>, SteamError> {
    let source = fs::read(path).map_err(|e| {
        SteamError::Io(format!("failed to read {}: {e}", path.display()))
    })?;
    parse_login_users(&source)
}

/// Parses the contents of a `loginusers.vdf` file.
pub fn parse_login_users(source: impl AsRef<[u8]>) -> Result<Vec<LoginUser>, SteamError> {
    let root = parse_text_vdf_bytes(source.as_ref())?;
    let users = root
        .get("users")
        .and_then(|n| n.entries())
        .ok_or_else(|| SteamError::Vdf("missing \"users\" object in loginusers.vdf".into()))?;

    let mut result = Vec::with_capacity(users.len());
    for entry in users {
        // Skip anything that is not a numeric SteamID64 block.
        let Ok(steam_id) = entry.key.parse::<u64>() else {
            continue;
        };
        if entry.node.entries().is_none() {
            return Err(SteamError::Vdf(format!(
                "user {steam_id} in loginusers.vdf is not an object"
            )));
        }

        let account_name = entry.node.get_str("AccountName").ok_or_else(|| {
            SteamError::Vdf(format!("user {steam_id} has no AccountName"))
        })?;

        result.push(LoginUser {
            steam_id,
            account_name: account_name.to_owned(),
            persona_name: entry
                .node
                .get_str("PersonaName")
                .unwrap_or_default()
                .to_owned(),
            allow_auto_login: flag(entry.node.get_str("AllowAutoLogin")),
            most_recent: flag(entry.node.get_str("MostRecent")),
        });
    }

    Ok(result)
}

/// VDF booleans: absent or `"0"` is false.
fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v != "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
"users"
{
	"76561197960287930"
	{
		"AccountName"		"gaben"
		"PersonaName"		"Gabe"
		"RememberPassword"		"1"
		"WantsOfflineMode"		"0"
		"AllowAutoLogin"		"1"
		"MostRecent"		"1"
		"Timestamp"		"1700000000"
	}
	"76561197960287931"
	{
		"AccountName"		"Alt_Account"
		"PersonaName"		"alt"
		"AllowAutoLogin"		"0"
	}
}
"#;

    #[test]
    fn parses_users() {
        let users = parse_login_users(SAMPLE).unwrap();
        assert_eq!(users.len(), 2);

        assert_eq!(users[0].steam_id, 76561197960287930);
        assert_eq!(users[0].account_name, "gaben");
        assert_eq!(users[0].persona_name, "Gabe");
        assert!(users[0].allow_auto_login);
        assert!(users[0].most_recent);

        assert!(!users[1].allow_auto_login);
        assert!(!users[1].most_recent);
        assert_eq!(users[1].username().unwrap().as_str(), "alt_account");
    }

    #[test]
    fn missing_users_object() {
        assert!(matches!(
            parse_login_users(r#""other" { }"#),
            Err(SteamError::Vdf(_))
        ));
    }

    #[test]
    fn user_without_account_name() {
        let src = r#""users" { "1" { "PersonaName" "x" } }"#;
        assert!(parse_login_users(src).is_err());
    }

    #[test]
    fn user_entry_must_be_object() {
        let src = r#""users" { "1" "gaben" }"#;
        assert!(parse_login_users(src).is_err());
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("loginusers.vdf");
        fs::write(&path, SAMPLE).unwrap();

        let users = load_login_users(&path).unwrap();
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn load_tolerates_latin1_persona() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("loginusers.vdf");
        let mut contents = b"\"users\" { \"76561197960287930\" { \"AccountName\" \"jose\" \"PersonaName\" \"Jos".to_vec();
        contents.push(0xE9);
        contents.extend_from_slice(b"\" } }");
        fs::write(&path, contents).unwrap();

        let users = load_login_users(&path).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].account_name, "jose");
        assert_eq!(users[0].persona_name, "Jos\u{FFFD}");
    }

    #[test]
    fn load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_login_users(&tmp.path().join("loginusers.vdf")).unwrap_err();
        assert!(matches!(err, SteamError::Io(_)));
    }
}
