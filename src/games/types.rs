use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Mines,
    Keno,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Mines => write!(f, "mines"),
            GameType::Keno => write!(f, "keno"),
        }
    }
}

/// Lifecycle state of a game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Won,
    Lost,
}

/// Payout multiplier stored in ten-thousandths, so four decimal places are exact.
///
/// Serializes as a plain float (`24.75`) for JSON and TOML consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Multiplier(u64);

impl Multiplier {
    /// Units per 1.0x
    pub const SCALE: u64 = 10_000;
    pub const ZERO: Multiplier = Multiplier(0);
    pub const ONE: Multiplier = Multiplier(Self::SCALE);

    pub const fn from_basis_points(basis_points: u64) -> Self {
        Self(basis_points)
    }

    pub const fn basis_points(self) -> u64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Payout for `amount` minor units, rounded down to the minor unit.
    pub fn apply(self, amount: Amount) -> Amount {
        let scaled = amount.minor_units() as u128 * self.0 as u128 / Self::SCALE as u128;
        Amount::from_minor_units(u64::try_from(scaled).unwrap_or(u64::MAX))
    }
}

impl TryFrom<f64> for Multiplier {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("multiplier must be a non-negative number, got {}", value));
        }
        let scaled = (value * Self::SCALE as f64).round();
        if scaled > u64::MAX as f64 {
            return Err(format!("multiplier {} is too large", value));
        }
        Ok(Self(scaled as u64))
    }
}

impl From<Multiplier> for f64 {
    fn from(m: Multiplier) -> Self {
        m.as_f64()
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }
}

/// Money in minor units (cents). Accepts a decimal number with at most two
/// fractional digits and serializes as a `"12.34"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "String")]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    const CENTS: u64 = 100;

    pub const fn from_minor_units(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn minor_units(self) -> u64 {
        self.0
    }

    /// Parse a decimal amount such as `10.5`, rejecting sub-cent precision.
    pub fn from_decimal(value: f64) -> Result<Self, String> {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("amount must be a non-negative number, got {}", value));
        }
        let scaled = value * Self::CENTS as f64;
        let cents = scaled.round();
        if (scaled - cents).abs() > 1e-6 {
            return Err(format!("amount {} has more than 2 decimal places", value));
        }
        if cents > u64::MAX as f64 {
            return Err(format!("amount {} is too large", value));
        }
        Ok(Self(cents as u64))
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Signed difference `self - other` in minor units.
    pub fn signed_diff(self, other: Amount) -> i64 {
        (self.0 as i128 - other.0 as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

impl TryFrom<f64> for Amount {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Amount> for String {
    fn from(a: Amount) -> Self {
        a.to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / Self::CENTS, self.0 % Self::CENTS)
    }
}

/// Render signed minor units (profit/loss) as `"-1.50"`.
pub fn format_signed_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

pub(crate) fn serialize_signed_cents<S>(cents: &i64, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&format_signed_cents(*cents))
}

/// Binomial coefficient C(n, k), exact for every value the games use.
pub fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc * (n - i) is always divisible by (i + 1) at this point
        acc = acc * (n - i) as u128 / (i + 1) as u128;
    }
    acc as u64
}

/// Seed material attached to a game. The server seed is only filled in once
/// the game is finished.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FairnessProof {
    pub server_seed_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_seed: Option<String>,
    pub client_seed: String,
    pub nonce: u64,
}
