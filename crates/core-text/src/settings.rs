//! Per-buffer settings.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BufferSettings {
    #[serde(rename = "tabsize")]
    pub tab_size: usize,
    #[serde(rename = "tabstospaces")]
    pub tabs_to_spaces: bool,
    #[serde(rename = "autoindent")]
    pub autoindent: bool,
    #[serde(rename = "keepautoindent")]
    pub keep_autoindent: bool,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            tab_size: 4,
            tabs_to_spaces: false,
            autoindent: true,
            keep_autoindent: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    TabSize,
    TabsToSpaces,
    AutoIndent,
    KeepAutoIndent,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::TabSize,
        SettingKey::TabsToSpaces,
        SettingKey::AutoIndent,
        SettingKey::KeepAutoIndent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SettingKey::TabSize => "tabsize",
            SettingKey::TabsToSpaces => "tabstospaces",
            SettingKey::AutoIndent => "autoindent",
            SettingKey::KeepAutoIndent => "keepautoindent",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingKey {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| SettingError::Unknown(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingError {
    #[error("unknown setting `{0}`")]
    Unknown(String),
    #[error("invalid value `{value}` for setting `{key}`")]
    InvalidValue { key: SettingKey, value: String },
}

impl BufferSettings {
    /// Set a setting by name from its textual value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingError> {
        let key: SettingKey = key.parse()?;
        let invalid = || SettingError::InvalidValue {
            key,
            value: value.to_string(),
        };
        match key {
            SettingKey::TabSize => {
                let n: usize = value.parse().map_err(|_| invalid())?;
                if n == 0 {
                    return Err(invalid());
                }
                self.tab_size = n;
            }
            SettingKey::TabsToSpaces => self.tabs_to_spaces = parse_bool(value).ok_or_else(invalid)?,
            SettingKey::AutoIndent => self.autoindent = parse_bool(value).ok_or_else(invalid)?,
            SettingKey::KeepAutoIndent => {
                self.keep_autoindent = parse_bool(value).ok_or_else(invalid)?
            }
        }
        Ok(())
    }

    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::TabSize => self.tab_size.to_string(),
            SettingKey::TabsToSpaces => self.tabs_to_spaces.to_string(),
            SettingKey::AutoIndent => self.autoindent.to_string(),
            SettingKey::KeepAutoIndent => self.keep_autoindent.to_string(),
        }
    }

    /// One level of indentation: `tab_size` spaces or a tab character.
    pub fn indent_string(&self) -> String {
        if self.tabs_to_spaces {
            " ".repeat(self.tab_size.max(1))
        } else {
            "\t".to_string()
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "on" | "yes" => Some(true),
        "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_by_name() {
        let mut s = BufferSettings::default();
        s.set("tabsize", "8").unwrap();
        s.set("tabstospaces", "on").unwrap();
        assert_eq!(s.tab_size, 8);
        assert_eq!(s.indent_string(), "        ");
        assert_eq!(s.get(SettingKey::TabsToSpaces), "true");
    }

    #[test]
    fn rejects_bad_values() {
        let mut s = BufferSettings::default();
        assert_eq!(
            s.set("colorscheme", "x"),
            Err(SettingError::Unknown("colorscheme".into()))
        );
        assert!(matches!(
            s.set("tabsize", "0"),
            Err(SettingError::InvalidValue { key: SettingKey::TabSize, .. })
        ));
        assert!(s.set("autoindent", "maybe").is_err());
        assert_eq!(s, BufferSettings::default());
    }

    #[test]
    fn default_indent_is_tab() {
        assert_eq!(BufferSettings::default().indent_string(), "\t");
    }
}
