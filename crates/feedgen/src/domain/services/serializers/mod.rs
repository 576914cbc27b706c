//! Platform Serializers
//!
//! Each platform writer emits a header, one record per product and a footer
//! into any `io::Write`. `FeedEncoder` drives a writer over a counting sink,
//! so the exact artifact size is known without buffering more than the
//! current record.

mod facebook_csv;
mod google_xml;
mod instagram_json;
mod text;

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entities::{Feed, Product};
use crate::domain::value_objects::{Channel, FeedFormat, FeedTarget};

pub use facebook_csv::{FacebookCsvWriter, FACEBOOK_CSV_HEADER};
pub use google_xml::GoogleXmlWriter;
pub use instagram_json::InstagramJsonWriter;
pub use text::{csv_field, format_price, strip_controls, xml_text};

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Feed-level metadata written into every header
#[derive(Debug, Clone, PartialEq)]
pub struct FeedHeader {
    pub name: String,
    pub channel: Channel,
    pub format: FeedFormat,
    pub store_url: Option<String>,
    pub description: String,
    pub generated_at: DateTime<Utc>,
}

impl FeedHeader {
    pub fn for_feed(feed: &Feed, generated_at: DateTime<Utc>) -> Self {
        let description = feed
            .settings
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("{} product feed", feed.name));

        Self {
            name: feed.name.clone(),
            channel: feed.channel,
            format: feed.format,
            store_url: feed.settings.store_url.clone(),
            description,
            generated_at,
        }
    }

    pub fn store_url(&self) -> Option<&str> {
        self.store_url.as_deref()
    }
}

/// Streaming writer for one platform format
pub trait PlatformWriter {
    fn begin<W: Write>(&mut self, out: &mut W, header: &FeedHeader) -> Result<(), SerializeError>;

    fn record<W: Write>(
        &mut self,
        out: &mut W,
        header: &FeedHeader,
        product: &Product,
    ) -> Result<(), SerializeError>;

    fn end<W: Write>(&mut self, out: &mut W, header: &FeedHeader) -> Result<(), SerializeError>;
}

enum Platform {
    Google(GoogleXmlWriter),
    Facebook(FacebookCsvWriter),
    Instagram(InstagramJsonWriter),
}

impl Platform {
    fn for_target(target: FeedTarget) -> Self {
        match target {
            FeedTarget::GoogleXml => Self::Google(GoogleXmlWriter),
            FeedTarget::FacebookCsv => Self::Facebook(FacebookCsvWriter),
            FeedTarget::InstagramJson => Self::Instagram(InstagramJsonWriter::default()),
        }
    }

    fn begin<W: Write>(&mut self, out: &mut W, header: &FeedHeader) -> Result<(), SerializeError> {
        match self {
            Self::Google(w) => w.begin(out, header),
            Self::Facebook(w) => w.begin(out, header),
            Self::Instagram(w) => w.begin(out, header),
        }
    }

    fn record<W: Write>(
        &mut self,
        out: &mut W,
        header: &FeedHeader,
        product: &Product,
    ) -> Result<(), SerializeError> {
        match self {
            Self::Google(w) => w.record(out, header, product),
            Self::Facebook(w) => w.record(out, header, product),
            Self::Instagram(w) => w.record(out, header, product),
        }
    }

    fn end<W: Write>(&mut self, out: &mut W, header: &FeedHeader) -> Result<(), SerializeError> {
        match self {
            Self::Google(w) => w.end(out, header),
            Self::Facebook(w) => w.end(out, header),
            Self::Instagram(w) => w.end(out, header),
        }
    }
}

/// `io::Write` adapter that counts bytes accepted by the inner writer
pub struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    pub fn bytes_written(&self) -> u64 {
        self.count
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Exact output size and emitted record count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeStats {
    pub records: u64,
    pub bytes: u64,
}

/// Incremental encoder: header on construction, one record per `push`,
/// footer on `finish`.
pub struct FeedEncoder<W: Write> {
    platform: Platform,
    header: FeedHeader,
    out: CountingWriter<W>,
    records: u64,
}

impl<W: Write> FeedEncoder<W> {
    pub fn new(target: FeedTarget, header: FeedHeader, writer: W) -> Result<Self, SerializeError> {
        let mut platform = Platform::for_target(target);
        let mut out = CountingWriter::new(writer);
        platform.begin(&mut out, &header)?;
        Ok(Self {
            platform,
            header,
            out,
            records: 0,
        })
    }

    pub fn push(&mut self, product: &Product) -> Result<(), SerializeError> {
        self.platform.record(&mut self.out, &self.header, product)?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn finish(mut self) -> Result<(W, SerializeStats), SerializeError> {
        self.platform.end(&mut self.out, &self.header)?;
        self.out.flush()?;
        let stats = SerializeStats {
            records: self.records,
            bytes: self.out.bytes_written(),
        };
        Ok((self.out.into_inner(), stats))
    }
}

/// Serialize a whole product sequence for a feed into memory
pub fn serialize<'p, I>(
    feed: &Feed,
    generated_at: DateTime<Utc>,
    products: I,
) -> Result<(Vec<u8>, SerializeStats), SerializeError>
where
    I: IntoIterator<Item = &'p Product>,
{
    let target = feed.target().map_err(|e| SerializeError::InvalidField {
        field: "channel",
        reason: e.to_string(),
    })?;
    let mut encoder = FeedEncoder::new(target, FeedHeader::for_feed(feed, generated_at), Vec::new())?;
    for product in products {
        encoder.push(product)?;
    }
    encoder.finish()
}
