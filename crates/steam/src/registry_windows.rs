use std::io;

use winreg::RegKey;
use winreg::enums::{HKEY_CURRENT_USER, KEY_SET_VALUE};

/// Reads a string value from `HKEY_CURRENT_USER\<subkey>`.
pub fn read_value(subkey: &str, name: &str) -> io::Result<String> {
    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let key = hkcu.open_subkey(subkey)?;
    key.get_value(name)
}

/// Writes a `REG_SZ` value under `HKEY_CURRENT_USER\<subkey>`, creating the
/// subkey if needed.
pub fn write_value(subkey: &str, name: &str, value: &str) -> io::Result<()> {
    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let key = match hkcu.open_subkey_with_flags(subkey, KEY_SET_VALUE) {
        Ok(key) => key,
        Err(e) if e.kind() == io::ErrorKind::NotFound => hkcu.create_subkey(subkey)?.0,
        Err(e) => return Err(e),
    };
    key.set_value(name, &value.to_owned())
}
