//! Canonical entities for the OTP credential vault.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vault::error::VaultError;
use crate::vault::secret;

/// `Authenticator.icon` values starting with this prefix reference a
/// `CustomIcon` id instead of a stock icon key.
pub const CUSTOM_ICON_PREFIX: char = '@';

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Authenticator type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The OTP scheme a credential uses. Each type carries its own default
/// digit count and period/counter semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticatorType {
    Totp,
    Hotp,
    SteamOtp,
    MobileOtp,
}

impl Default for AuthenticatorType {
    fn default() -> Self {
        Self::Totp
    }
}

impl fmt::Display for AuthenticatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp => write!(f, "totp"),
            Self::Hotp => write!(f, "hotp"),
            Self::SteamOtp => write!(f, "steam"),
            Self::MobileOtp => write!(f, "motp"),
        }
    }
}

impl AuthenticatorType {
    /// Default code length for this type.
    pub fn default_digits(&self) -> u32 {
        match self {
            Self::Totp | Self::Hotp | Self::MobileOtp => 6,
            Self::SteamOtp => 5,
        }
    }

    /// Default time-step in seconds. Meaningless for counter-based types,
    /// which still store the conventional 30 so round-trips stay exact.
    pub fn default_period(&self) -> u32 {
        match self {
            Self::Totp | Self::Hotp | Self::SteamOtp => 30,
            Self::MobileOtp => 10,
        }
    }

    /// Whether codes advance by counter instead of wall-clock time.
    pub fn is_counter_based(&self) -> bool {
        matches!(self, Self::Hotp)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Hash algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// HMAC hash variant used for code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

impl HashAlgorithm {
    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Authenticator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single OTP credential. Immutable value once constructed; destroyed
/// with the enclosing [`Backup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticator {
    /// OTP scheme.
    pub kind: AuthenticatorType,
    /// Issuer display string. May be empty.
    pub issuer: String,
    /// Account label, if the source distinguishes one from the issuer.
    #[serde(default)]
    pub username: Option<String>,
    /// Shared secret in the canonical base-32 alphabet. Never the foreign
    /// encoding, never empty.
    pub secret: String,
    /// HMAC hash variant.
    #[serde(default)]
    pub algorithm: HashAlgorithm,
    /// Code length.
    pub digits: u32,
    /// Time-step in seconds.
    pub period: u32,
    /// Counter value, meaningful for counter-based types only.
    #[serde(default)]
    pub counter: u64,
    /// Static PIN prefix/suffix used by some source apps (mOTP).
    #[serde(default)]
    pub pin: Option<String>,
    /// Stock icon key, or a `CustomIcon` id behind [`CUSTOM_ICON_PREFIX`].
    #[serde(default)]
    pub icon: Option<String>,
    /// Weak references to [`Category::id`].
    #[serde(default)]
    pub category_ids: Vec<String>,
}

impl Authenticator {
    /// Create an authenticator with type defaults. The secret is
    /// canonicalized on the way in; an empty or undecodable secret is a
    /// construction error.
    pub fn new(
        kind: AuthenticatorType,
        issuer: impl Into<String>,
        secret: &str,
    ) -> Result<Self, VaultError> {
        Ok(Self {
            kind,
            issuer: issuer.into(),
            username: None,
            secret: secret::canonicalize_for(secret, kind)?,
            algorithm: HashAlgorithm::default(),
            digits: kind.default_digits(),
            period: kind.default_period(),
            counter: 0,
            pin: None,
            icon: None,
            category_ids: Vec::new(),
        })
    }

    /// Builder: set username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set time-step.
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    /// Builder: set counter.
    pub fn with_counter(mut self, counter: u64) -> Self {
        self.counter = counter;
        self
    }

    /// Builder: set PIN.
    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    /// Builder: set icon reference.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Builder: set category memberships.
    pub fn with_categories(mut self, ids: Vec<String>) -> Self {
        self.category_ids = ids;
        self
    }

    /// The referenced custom-icon id, if the icon field uses the reserved
    /// prefix.
    pub fn custom_icon_id(&self) -> Option<&str> {
        self.icon
            .as_deref()
            .and_then(|i| i.strip_prefix(CUSTOM_ICON_PREFIX))
    }

    /// Display name: "Issuer (username)" or just the issuer.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(user) if !user.is_empty() => format!("{} ({})", self.issuer, user),
            _ => self.issuer.clone(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Category
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A named grouping, referenced from authenticators by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Display ordering, lowest first.
    #[serde(default)]
    pub ranking: i32,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            ranking: 0,
        }
    }

    pub fn with_ranking(mut self, ranking: i32) -> Self {
        self.ranking = ranking;
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Custom icon
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A user-supplied icon image. An authenticator referencing a missing
/// custom icon is a display-layer concern, not a backup-integrity
/// violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomIcon {
    pub id: String,
    /// Raw image bytes, base64 in the structured encoding.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl CustomIcon {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            data,
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as B64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&B64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        B64.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Backup aggregate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The aggregate root: everything a backup contains. Owns its entity
/// lists exclusively; entities never reference back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    /// Schema tag of the structured encoding.
    #[serde(default = "Backup::schema_version")]
    pub version: u32,
    pub authenticators: Vec<Authenticator>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub custom_icons: Vec<CustomIcon>,
}

impl Backup {
    pub const SCHEMA_VERSION: u32 = 1;

    fn schema_version() -> u32 {
        Self::SCHEMA_VERSION
    }

    /// Construct a backup. All-or-nothing: if any authenticator violates
    /// the model invariants, no `Backup` is produced.
    pub fn new(
        authenticators: Vec<Authenticator>,
        categories: Vec<Category>,
        custom_icons: Vec<CustomIcon>,
    ) -> Result<Self, VaultError> {
        let backup = Self {
            version: Self::SCHEMA_VERSION,
            authenticators,
            categories,
            custom_icons,
        };
        backup.validate()?;
        Ok(backup)
    }

    /// Check model invariants. Applied at construction and after reading
    /// an envelope payload.
    pub fn validate(&self) -> Result<(), VaultError> {
        for auth in &self.authenticators {
            if auth.secret.is_empty() {
                return Err(VaultError::InvalidSecret(format!(
                    "authenticator '{}' has an empty secret",
                    auth.issuer
                )));
            }
            if auth.digits == 0 {
                return Err(VaultError::Format(format!(
                    "authenticator '{}' has zero digits",
                    auth.issuer
                )));
            }
            if auth.period == 0 {
                return Err(VaultError::Format(format!(
                    "authenticator '{}' has a zero period",
                    auth.issuer
                )));
            }
        }
        Ok(())
    }
}
