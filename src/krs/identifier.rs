use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const KRS_LEN: usize = 10;

/// KRS number, always stored zero-padded to ten digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "String")]
pub struct Krs(String);

impl Krs {
    pub fn new(raw: &str) -> Result<Self> {
        let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.is_empty() {
            return Err(anyhow!("KRS number cannot be empty"));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(anyhow!("KRS number must contain only digits: {}", raw));
        }
        if digits.len() > KRS_LEN {
            return Err(anyhow!(
                "KRS number longer than {} digits: {}",
                KRS_LEN,
                raw
            ));
        }
        Ok(Krs(format!("{:0>10}", digits)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Krs {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Krs::new(s)
    }
}

impl TryFrom<Value> for Krs {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        let krs = match &value {
            Value::String(s) => Krs::new(s),
            Value::Number(n) if n.is_u64() => Krs::new(&n.to_string()),
            other => Err(anyhow!("Invalid KRS number: {}", other)),
        };
        krs.map_err(|e| e.to_string())
    }
}

impl From<Krs> for String {
    fn from(krs: Krs) -> String {
        krs.0
    }
}

impl AsRef<str> for Krs {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Krs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pads_to_ten_digits() {
        assert_eq!(Krs::new("28098").unwrap().as_str(), "0000028098");
        assert_eq!(Krs::new(" 0000028098 ").unwrap().as_str(), "0000028098");
        assert_eq!("1234567890".parse::<Krs>().unwrap().to_string(), "1234567890");
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(Krs::new("").is_err());
        assert!(Krs::new("12a4").is_err());
        assert!(Krs::new("12345678901").is_err());
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let list: Vec<Krs> = serde_json::from_value(json!([28098, "0000012345"])).unwrap();
        assert_eq!(list[0].as_str(), "0000028098");
        assert_eq!(list[1].as_str(), "0000012345");
        assert!(serde_json::from_value::<Krs>(json!(-5)).is_err());
        assert_eq!(serde_json::to_value(&list[0]).unwrap(), json!("0000028098"));
    }
}
