//! Channel / Format - Downstream platform targets

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Shopping platform consuming a feed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    GoogleShopping,
    FacebookCatalog,
    InstagramShopping,
}

/// Serialized file format of a feed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    Xml,
    Csv,
    Json,
}

/// One of the supported (channel, format) combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedTarget {
    GoogleXml,
    FacebookCsv,
    InstagramJson,
}

impl FeedTarget {
    /// Resolve a (channel, format) pair, rejecting unsupported combinations
    pub fn resolve(channel: Channel, format: FeedFormat) -> Result<Self, DomainError> {
        match (channel, format) {
            (Channel::GoogleShopping, FeedFormat::Xml) => Ok(Self::GoogleXml),
            (Channel::FacebookCatalog, FeedFormat::Csv) => Ok(Self::FacebookCsv),
            (Channel::InstagramShopping, FeedFormat::Json) => Ok(Self::InstagramJson),
            (channel, format) => Err(DomainError::Validation(format!(
                "Unsupported channel/format combination: {}/{}",
                channel, format
            ))),
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Self::GoogleXml => Channel::GoogleShopping,
            Self::FacebookCsv => Channel::FacebookCatalog,
            Self::InstagramJson => Channel::InstagramShopping,
        }
    }

    pub fn format(&self) -> FeedFormat {
        match self {
            Self::GoogleXml => FeedFormat::Xml,
            Self::FacebookCsv => FeedFormat::Csv,
            Self::InstagramJson => FeedFormat::Json,
        }
    }
}

impl FeedFormat {
    /// HTTP Content-Type of an artifact in this format
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Xml => "application/xml",
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    /// File extension used for downloads
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::GoogleShopping => write!(f, "google-shopping"),
            Channel::FacebookCatalog => write!(f, "facebook-catalog"),
            Channel::InstagramShopping => write!(f, "instagram-shopping"),
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google-shopping" => Ok(Channel::GoogleShopping),
            "facebook-catalog" => Ok(Channel::FacebookCatalog),
            "instagram-shopping" => Ok(Channel::InstagramShopping),
            _ => Err(format!("Unknown channel: {}", s)),
        }
    }
}

impl std::fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedFormat::Xml => write!(f, "xml"),
            FeedFormat::Csv => write!(f, "csv"),
            FeedFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for FeedFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xml" => Ok(FeedFormat::Xml),
            "csv" => Ok(FeedFormat::Csv),
            "json" => Ok(FeedFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_pairs_resolve() {
        assert_eq!(
            FeedTarget::resolve(Channel::GoogleShopping, FeedFormat::Xml).unwrap(),
            FeedTarget::GoogleXml
        );
        assert_eq!(
            FeedTarget::resolve(Channel::FacebookCatalog, FeedFormat::Csv).unwrap(),
            FeedTarget::FacebookCsv
        );
        assert_eq!(
            FeedTarget::resolve(Channel::InstagramShopping, FeedFormat::Json).unwrap(),
            FeedTarget::InstagramJson
        );
    }

    #[test]
    fn test_unsupported_pair_rejected() {
        let err = FeedTarget::resolve(Channel::GoogleShopping, FeedFormat::Csv).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(FeedTarget::resolve(Channel::InstagramShopping, FeedFormat::Xml).is_err());
    }

    #[test]
    fn test_channel_wire_names() {
        assert_eq!(
            serde_json::to_string(&Channel::FacebookCatalog).unwrap(),
            "\"facebook-catalog\""
        );
        assert_eq!(
            "instagram-shopping".parse::<Channel>().unwrap(),
            Channel::InstagramShopping
        );
        assert!("pinterest".parse::<Channel>().is_err());
    }
}
