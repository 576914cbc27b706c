//! Instagram Shopping JSON feed
//!
//! `{"feed":{...},"products":[...]}` written record by record in compact form.

use std::io::Write;

use chrono::SecondsFormat;
use serde::Serialize;

use super::text::format_price;
use super::{FeedHeader, PlatformWriter, SerializeError};
use crate::domain::entities::Product;
use crate::domain::value_objects::{Channel, FeedFormat};

#[derive(Serialize)]
struct FeedMeta<'a> {
    name: &'a str,
    channel: Channel,
    format: FeedFormat,
    generated_at: String,
}

#[derive(Serialize)]
struct ProductEntry<'a> {
    id: String,
    name: &'a str,
    description: &'a str,
    price: String,
    sku: &'a str,
    brand: &'a str,
    category: &'a str,
    image_url: &'a [String],
    availability: &'static str,
    condition: &'a str,
    url: String,
}

#[derive(Debug, Default)]
pub struct InstagramJsonWriter {
    wrote_first: bool,
}

impl PlatformWriter for InstagramJsonWriter {
    fn begin<W: Write>(&mut self, out: &mut W, header: &FeedHeader) -> Result<(), SerializeError> {
        let meta = FeedMeta {
            name: &header.name,
            channel: header.channel,
            format: header.format,
            generated_at: header.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        out.write_all(b"{\"feed\":")?;
        serde_json::to_writer(&mut *out, &meta)?;
        out.write_all(b",\"products\":[")?;
        self.wrote_first = false;
        Ok(())
    }

    fn record<W: Write>(
        &mut self,
        out: &mut W,
        header: &FeedHeader,
        product: &Product,
    ) -> Result<(), SerializeError> {
        let entry = ProductEntry {
            id: product.feed_item_id(),
            name: &product.title,
            description: &product.description,
            price: format_price(product.price, &product.currency)?,
            sku: product.sku.as_deref().unwrap_or_default(),
            brand: product.brand.as_deref().unwrap_or_default(),
            category: product.category.as_deref().unwrap_or_default(),
            image_url: &product.images,
            availability: product.availability.feed_value(),
            condition: product.metadata_str("condition").unwrap_or("new"),
            url: product.link(header.store_url()),
        };

        if self.wrote_first {
            out.write_all(b",")?;
        }
        serde_json::to_writer(&mut *out, &entry)?;
        self.wrote_first = true;
        Ok(())
    }

    fn end<W: Write>(&mut self, out: &mut W, _header: &FeedHeader) -> Result<(), SerializeError> {
        out.write_all(b"]}")?;
        Ok(())
    }
}
