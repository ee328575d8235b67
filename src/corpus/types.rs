//! Tenant and settings types.
//!
//! [`TenantId`] is the validated room identifier, [`Settings`] the mutable
//! per-tenant knobs ([`GenMode`], [`Lang`], talk flag and speed), and
//! [`Tenant`] a snapshot of settings plus corpus as returned by the store.
//! [`SettingField`] / [`SettingValue`] form the allow-list used by
//! `change_setting`.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Longest accepted id. Chat platform snowflakes are at most 20 digits.
const MAX_ID_LEN: usize = 20;

/// A tenant (chat room) identifier: 1 to 20 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_ID_LEN
            && raw.bytes().all(|b| b.is_ascii_digit());
        if valid {
            Ok(Self(raw.to_owned()))
        } else {
            Err(StoreError::InvalidId(raw.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl std::str::FromStr for TenantId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

/// How generated text is cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenMode {
    /// Everything lower-cased.
    #[default]
    Default,
    /// Sentence starts capitalised.
    Literate,
}

impl GenMode {
    /// Stored value of the `gen` column.
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Default => 0,
            Self::Literate => 1,
        }
    }

    pub fn from_i64(value: i64) -> Self {
        if value == 1 {
            Self::Literate
        } else {
            Self::Default
        }
    }
}

/// Display language of the surrounding bot. Stored, never interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    #[default]
    En,
    Ru,
    Uk,
    Tr,
}

impl Lang {
    pub const ALL: [Lang; 4] = [Lang::En, Lang::Ru, Lang::Uk, Lang::Tr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
            Self::Uk => "uk",
            Self::Tr => "tr",
        }
    }

    /// Anything that is not a supported code (including nothing at all) becomes `en`.
    pub fn normalize(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(|code| Self::ALL.into_iter().find(|lang| lang.as_str() == code))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Per-tenant settings row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub talk: bool,
    pub gen_mode: GenMode,
    /// 1..=10, consumed by the caller as a reply rate.
    pub speed: u8,
    pub lang: Lang,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            talk: true,
            gen_mode: GenMode::Default,
            speed: 3,
            lang: Lang::En,
        }
    }
}

/// Settings plus the (possibly capped) corpus, oldest fragment first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub settings: Settings,
    pub corpus: Vec<String>,
}

/// The settings that may be changed after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    Talk,
    GenMode,
    Speed,
    Lang,
}

impl SettingField {
    /// Name used by callers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Talk => "talk",
            Self::GenMode => "genMode",
            Self::Speed => "speed",
            Self::Lang => "lang",
        }
    }

    /// Column in `peers`. Only these literals are ever interpolated into SQL.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Talk => "talk",
            Self::GenMode => "gen",
            Self::Speed => "speed",
            Self::Lang => "lang",
        }
    }

    /// Parse a raw value for this field. `lang` never fails.
    pub fn parse_value(&self, raw: &str) -> Result<SettingValue, StoreError> {
        let trimmed = raw.trim();
        let invalid = || StoreError::InvalidValue {
            field: self.name(),
            value: raw.to_owned(),
        };
        match self {
            Self::Talk => match trimmed.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => Ok(SettingValue::Talk(true)),
                "0" | "false" | "off" => Ok(SettingValue::Talk(false)),
                _ => Err(invalid()),
            },
            Self::GenMode => match trimmed.to_ascii_lowercase().as_str() {
                "0" | "default" => Ok(SettingValue::GenMode(GenMode::Default)),
                "1" | "literate" => Ok(SettingValue::GenMode(GenMode::Literate)),
                _ => Err(invalid()),
            },
            Self::Speed => match trimmed.parse::<u8>() {
                Ok(speed) if (1..=10).contains(&speed) => Ok(SettingValue::Speed(speed)),
                _ => Err(invalid()),
            },
            Self::Lang => Ok(SettingValue::Lang(Lang::normalize(Some(trimmed)))),
        }
    }
}

impl std::str::FromStr for SettingField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "talk" => Ok(Self::Talk),
            "genMode" => Ok(Self::GenMode),
            "speed" => Ok(Self::Speed),
            "lang" => Ok(Self::Lang),
            other => Err(StoreError::InvalidField(other.to_owned())),
        }
    }
}

/// A validated new value for one setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingValue {
    Talk(bool),
    GenMode(GenMode),
    Speed(u8),
    Lang(Lang),
}

impl SettingValue {
    pub fn field(&self) -> SettingField {
        match self {
            Self::Talk(_) => SettingField::Talk,
            Self::GenMode(_) => SettingField::GenMode,
            Self::Speed(_) => SettingField::Speed,
            Self::Lang(_) => SettingField::Lang,
        }
    }

    pub fn to_sql(&self) -> rusqlite::types::Value {
        use rusqlite::types::Value;
        match self {
            Self::Talk(talk) => Value::Integer(i64::from(*talk)),
            Self::GenMode(mode) => Value::Integer(mode.as_i64()),
            Self::Speed(speed) => Value::Integer(i64::from(*speed)),
            Self::Lang(lang) => Value::Text(lang.as_str().to_owned()),
        }
    }
}
