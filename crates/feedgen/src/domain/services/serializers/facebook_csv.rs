//! Facebook Catalog CSV feed (RFC 4180)

use std::io::Write;

use super::text::{csv_field, format_price};
use super::{FeedHeader, PlatformWriter, SerializeError};
use crate::domain::entities::Product;

pub const FACEBOOK_CSV_HEADER: &str = "id,title,description,availability,condition,price,link,image_link,brand,google_product_category,additional_image_link,sale_price,gtin,mpn,item_group_id,color,size,gender,age_group,material,pattern,shipping,custom_label_0,custom_label_1";

/// Columns after `additional_image_link`, all taken verbatim from metadata
const METADATA_COLUMNS: &[&str] = &[
    "sale_price",
    "gtin",
    "mpn",
    "item_group_id",
    "color",
    "size",
    "gender",
    "age_group",
    "material",
    "pattern",
    "shipping",
    "custom_label_0",
    "custom_label_1",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct FacebookCsvWriter;

impl PlatformWriter for FacebookCsvWriter {
    fn begin<W: Write>(&mut self, out: &mut W, _header: &FeedHeader) -> Result<(), SerializeError> {
        writeln!(out, "{}", FACEBOOK_CSV_HEADER)?;
        Ok(())
    }

    fn record<W: Write>(
        &mut self,
        out: &mut W,
        header: &FeedHeader,
        product: &Product,
    ) -> Result<(), SerializeError> {
        let price = format_price(product.price, &product.currency)?;
        let link = product.link(header.store_url());
        let id = product.feed_item_id();
        let google_category = product
            .metadata_str("google_product_category")
            .or(product.category.as_deref())
            .unwrap_or_default();
        let additional_images = product.additional_images().join(",");

        let mut row: Vec<std::borrow::Cow<'_, str>> = vec![
            csv_field(&id, false),
            csv_field(&product.title, false),
            csv_field(&product.description, false),
            csv_field(product.availability.feed_value(), false),
            csv_field(product.metadata_str("condition").unwrap_or("new"), false),
            csv_field(&price, false),
            csv_field(&link, false),
            csv_field(product.primary_image().unwrap_or_default(), false),
            csv_field(product.brand.as_deref().unwrap_or_default(), false),
            csv_field(google_category, false),
            csv_field(&additional_images, true),
        ];
        row.extend(
            METADATA_COLUMNS
                .iter()
                .map(|key| csv_field(product.metadata_str(key).unwrap_or_default(), false)),
        );

        writeln!(out, "{}", row.join(","))?;
        Ok(())
    }

    fn end<W: Write>(&mut self, _out: &mut W, _header: &FeedHeader) -> Result<(), SerializeError> {
        Ok(())
    }
}
