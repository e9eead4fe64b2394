//! Swap method selectors and matching.

use std::collections::HashSet;

use crate::types::{selector_of, FlattenedCall};

/// Uniswap V2 pair `swap(uint256,uint256,address,bytes)`.
pub const UNISWAP_V2_SWAP: &str = "0x022c0d9f";
/// Uniswap V3 pool `swap(address,bool,int256,uint160,bytes)`.
pub const UNISWAP_V3_SWAP: &str = "0x128acb08";
/// Uniswap V4 pool manager `swap`.
pub const UNISWAP_V4_SWAP: &str = "0xf3cd914c";
/// 1inch aggregation router V5 `swap`.
pub const ONEINCH_V5_SWAP: &str = "0x12aa3caf";

pub const DEFAULT_SWAP_SELECTORS: [&str; 4] = [
    UNISWAP_V2_SWAP,
    UNISWAP_V3_SWAP,
    UNISWAP_V4_SWAP,
    ONEINCH_V5_SWAP,
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid selector '{0}': expected 0x followed by 8 hex digits")]
    InvalidSelector(String),
}

/// Ordered, immutable set of swap selectors, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSet {
    ordered: Vec<String>,
    lookup: HashSet<String>,
}

impl SignatureSet {
    /// Build a set from selectors such as `"0x022C0D9F"`.
    ///
    /// Duplicates keep their first position.
    pub fn new<I, S>(selectors: I) -> Result<Self, SignatureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self {
            ordered: Vec::new(),
            lookup: HashSet::new(),
        };
        set.extend(selectors)?;
        Ok(set)
    }

    /// The default selectors followed by `extra`.
    pub fn with_additional<I, S>(extra: I) -> Result<Self, SignatureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        set.extend(extra)?;
        Ok(set)
    }

    fn extend<I, S>(&mut self, selectors: I) -> Result<(), SignatureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for selector in selectors {
            let normalized = normalize_selector(selector.as_ref())?;
            if self.lookup.insert(normalized.clone()) {
                self.ordered.push(normalized);
            }
        }
        Ok(())
    }

    /// True if the selector of `input` is in the set.
    pub fn matches_input(&self, input: &str) -> bool {
        self.contains_selector(selector_of(input))
    }

    /// True if the call's selector is in the set.
    pub fn matches(&self, call: &FlattenedCall) -> bool {
        self.contains_selector(call.selector())
    }

    fn contains_selector(&self, selector: Option<&str>) -> bool {
        selector
            .map(|selector| self.lookup.contains(&selector.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    /// Index of the first call that matches, if any.
    pub fn first_match(&self, calls: &[FlattenedCall]) -> Option<usize> {
        calls.iter().position(|call| self.matches(call))
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl Default for SignatureSet {
    fn default() -> Self {
        Self {
            ordered: DEFAULT_SWAP_SELECTORS.iter().map(|s| s.to_string()).collect(),
            lookup: DEFAULT_SWAP_SELECTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn normalize_selector(raw: &str) -> Result<String, SignatureError> {
    let trimmed = raw.trim();
    let invalid = || SignatureError::InvalidSelector(raw.to_string());

    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(invalid)?;
    if digits.len() != 8 {
        return Err(invalid());
    }
    let bytes = hex::decode(digits).map_err(|_| invalid())?;

    Ok(format!("0x{}", hex::encode(bytes)))
}
