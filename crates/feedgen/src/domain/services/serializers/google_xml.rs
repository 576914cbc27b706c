//! Google Shopping RSS 2.0 feed

use std::io::Write;

use super::text::{format_price, xml_text};
use super::{FeedHeader, PlatformWriter, SerializeError};
use crate::domain::entities::Product;

const MAX_ADDITIONAL_IMAGES: usize = 10;

/// Optional `g:` attributes copied from product metadata when present
const OPTIONAL_ATTRIBUTES: &[&str] = &["gtin", "mpn"];

#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleXmlWriter;

fn element<W: Write>(out: &mut W, indent: &str, tag: &str, value: &str) -> Result<(), SerializeError> {
    writeln!(out, "{indent}<{tag}>{}</{tag}>", xml_text(value))?;
    Ok(())
}

impl PlatformWriter for GoogleXmlWriter {
    fn begin<W: Write>(&mut self, out: &mut W, header: &FeedHeader) -> Result<(), SerializeError> {
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(out, r#"<rss version="2.0" xmlns:g="http://base.google.com/ns/1.0">"#)?;
        writeln!(out, "  <channel>")?;
        element(out, "    ", "title", &header.name)?;
        element(out, "    ", "link", header.store_url().unwrap_or_default())?;
        element(out, "    ", "description", &header.description)?;
        Ok(())
    }

    fn record<W: Write>(
        &mut self,
        out: &mut W,
        header: &FeedHeader,
        product: &Product,
    ) -> Result<(), SerializeError> {
        const IND: &str = "      ";
        let price = format_price(product.price, &product.currency)?;

        writeln!(out, "    <item>")?;
        element(out, IND, "g:id", &product.feed_item_id())?;
        element(out, IND, "g:title", &product.title)?;
        element(out, IND, "g:description", &product.description)?;
        element(out, IND, "g:link", &product.link(header.store_url()))?;
        element(out, IND, "g:image_link", product.primary_image().unwrap_or_default())?;
        for image in product.additional_images().iter().take(MAX_ADDITIONAL_IMAGES) {
            element(out, IND, "g:additional_image_link", image)?;
        }
        element(out, IND, "g:availability", product.availability.feed_value())?;
        element(out, IND, "g:price", &price)?;
        element(out, IND, "g:condition", product.metadata_str("condition").unwrap_or("new"))?;
        element(out, IND, "g:brand", product.brand.as_deref().unwrap_or_default())?;
        for key in OPTIONAL_ATTRIBUTES {
            if let Some(value) = product.metadata_str(key) {
                element(out, IND, &format!("g:{key}"), value)?;
            }
        }
        element(out, IND, "g:product_type", product.category.as_deref().unwrap_or_default())?;
        writeln!(out, "    </item>")?;
        Ok(())
    }

    fn end<W: Write>(&mut self, out: &mut W, _header: &FeedHeader) -> Result<(), SerializeError> {
        writeln!(out, "  </channel>")?;
        writeln!(out, "</rss>")?;
        Ok(())
    }
}
