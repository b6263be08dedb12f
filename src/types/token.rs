use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A tradable token with its display metadata and on-chain parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Ticker symbol, e.g. `WOKB`.
    pub symbol: String,
    /// Human-readable name.
    pub name: String,
    /// Token contract address.
    pub address: Address,
    /// Token decimals.
    pub decimals: u8,
    /// Logo asset identifier.
    #[serde(default)]
    pub logo: String,
}

impl Token {
    /// Create a new instance of [`Self`].
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        address: Address,
        decimals: u8,
        logo: impl Into<String>,
    ) -> Self {
        Self { symbol: symbol.into(), name: name.into(), address, decimals, logo: logo.into() }
    }
}

/// An ordered set of tradable [`Token`]s.
///
/// Order is significant: it drives token pickers and the portfolio walk, so lookups never
/// reorder entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenRegistry(Vec<Token>);

impl TokenRegistry {
    /// Create a registry from an ordered list of tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }

    /// Returns the token with the given symbol.
    pub fn get(&self, symbol: &str) -> Option<&Token> {
        self.0.iter().find(|token| token.symbol == symbol)
    }

    /// Returns the token deployed at the given address.
    pub fn by_address(&self, address: Address) -> Option<&Token> {
        self.0.iter().find(|token| token.address == address)
    }

    /// Returns an iterator over all tokens in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.0.iter()
    }

    /// Returns the number of registered tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the registry holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let file = std::fs::File::open(path)?;
        let registry = serde_yaml::from_reader(&file)?;
        Ok(registry)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self(vec![
            Token::new(
                "WOKB",
                "Wrapped OKB",
                address!("0xe538905cf8410324e03a5a23c1c177a474d59b2b"),
                18,
                "wokb",
            ),
            Token::new(
                "WETH",
                "Wrapped Ether",
                address!("0x5a77f1443d16ee5761d310e38b62f77f726bc71c"),
                18,
                "weth",
            ),
            Token::new(
                "USDT",
                "Tether USD",
                address!("0x1e4a5963abfd975d8c9021ce480b42188849d41d"),
                6,
                "usdt",
            ),
            Token::new(
                "USDC",
                "USD Coin",
                address!("0x74b7f16337b8972027f6196a17a631ac6de26d22"),
                6,
                "usdc",
            ),
        ])
    }
}
