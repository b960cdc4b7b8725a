//! Shape-based fallbacks for trading pairs and wallet addresses.

use super::patterns::{TRADING_PAIR, WALLET_ADDRESS};
use super::{ExtractionMatch, FieldExtractor};

/// Find the first `BASE/QUOTE` pair quoted against a major asset.
pub fn extract_trading_pair(text: &str) -> Option<String> {
    TradingPairExtractor::new().extract(text).map(|m| m.value)
}

/// Collect every address-shaped token, one per line, in text order.
pub fn extract_wallets(text: &str) -> Option<String> {
    WalletExtractor::new().extract(text).map(|m| m.value)
}

/// Trading pair extractor, e.g. `"ADO / USDT"` becomes `"ADO/USDT"`.
pub struct TradingPairExtractor;

impl TradingPairExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TradingPairExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TradingPairExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        TRADING_PAIR
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let pair = format!("{}/{}", &caps[1], &caps[2]);
                Some(ExtractionMatch::new(pair, 0.8, "pair shape").with_position(full.start(), full.end()))
            })
            .collect()
    }
}

/// Wallet address extractor (EVM, Tron, Bitcoin).
///
/// `extract` joins every address found into one newline-separated value;
/// `extract_all` reports them individually.
pub struct WalletExtractor;

impl WalletExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WalletExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for WalletExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let matches = self.extract_all(text);
        let first = matches.first()?;
        let last = matches.last()?;
        let span = first.position.zip(last.position).map(|(a, b)| (a.0, b.1));

        let joined = matches
            .iter()
            .map(|m| m.value.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut result = ExtractionMatch::new(joined, 0.8, "address shape");
        result.position = span;
        Some(result)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        WALLET_ADDRESS
            .find_iter(text)
            .map(|m| {
                ExtractionMatch::new(m.as_str().to_string(), 0.8, "address shape")
                    .with_position(m.start(), m.end())
            })
            .collect()
    }
}
