use crate::core::detail::ListingDetail;
use crate::core::saved::ResolvedSave;
use crate::core::session::SessionSnapshot;
use crate::domain::model::Listing;
use crate::utils::error::{MarketError, Result};
use serde::Serialize;
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(MarketError::validation(
                "format",
                format!("Unsupported format '{}' (table, json, csv)", other),
            )),
        }
    }
}

/// 單列輸出格式（CSV 用）
#[derive(Serialize)]
struct ListingRow<'a> {
    id: &'a str,
    title: &'a str,
    price: f64,
    category: &'a str,
    condition: &'a str,
    status: &'a str,
    seller_id: &'a str,
    created_at: String,
}

impl<'a> From<&'a Listing> for ListingRow<'a> {
    fn from(listing: &'a Listing) -> Self {
        Self {
            id: listing.id.as_str(),
            title: &listing.title,
            price: listing.price,
            category: listing.category.map(|c| c.as_str()).unwrap_or(""),
            condition: listing.condition.map(|c| c.as_str()).unwrap_or(""),
            status: listing.status().as_str(),
            seller_id: listing.seller_id.as_str(),
            created_at: listing.created_at.to_rfc3339(),
        }
    }
}

pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

pub fn render(listings: &[&Listing], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(listings)),
        OutputFormat::Json => render_json(listings),
        OutputFormat::Csv => render_csv(listings),
    }
}

pub fn render_table(listings: &[&Listing]) -> String {
    if listings.is_empty() {
        return "No listings found. Try adjusting your filters.".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:<32} {:>10} {:<18} {:<20}",
        "ID", "TITLE", "PRICE", "CATEGORY", "SELLER"
    );
    for listing in listings {
        let seller = listing
            .seller
            .as_ref()
            .map(|p| p.full_name.as_str())
            .unwrap_or_else(|| listing.seller_id.as_str());
        let _ = writeln!(
            out,
            "{:<8} {:<32} {:>10} {:<18} {:<20}",
            listing.id.as_str(),
            truncate(&listing.title, 32),
            format_price(listing.price),
            listing.category.map(|c| c.as_str()).unwrap_or("-"),
            truncate(seller, 20),
        );
    }
    out.trim_end().to_string()
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render_csv(listings: &[&Listing]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for listing in listings {
        writer.serialize(ListingRow::from(*listing))?;
    }
    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|e| MarketError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn render_detail(detail: &ListingDetail, viewer: &SessionSnapshot) -> String {
    let listing = &detail.listing;
    let mut out = String::new();

    let _ = writeln!(out, "{}  {}", listing.title, format_price(listing.price));
    let _ = writeln!(
        out,
        "{} · {} · {}",
        listing.category.map(|c| c.as_str()).unwrap_or("Uncategorized"),
        listing.condition.map(|c| c.as_str()).unwrap_or("Unknown condition"),
        listing.status()
    );
    if !listing.description.is_empty() {
        let _ = writeln!(out, "\n{}\n", listing.description);
    }
    for (index, image) in listing.images.iter().enumerate() {
        let _ = writeln!(out, "  [{}] {}", index + 1, image);
    }

    if let Some(seller) = &detail.seller {
        let _ = writeln!(
            out,
            "Seller: {} (member since {})",
            seller.full_name,
            seller.created_at.format("%B %Y")
        );
    }
    if detail.is_owned_by(viewer) {
        let _ = writeln!(out, "This is your listing.");
    } else if detail.can_message(viewer) {
        let _ = writeln!(out, "Message the seller to arrange pickup.");
    }
    out.trim_end().to_string()
}

pub fn render_saved(saves: &[ResolvedSave<'_>]) -> String {
    if saves.is_empty() {
        return "No saved listings yet.".to_string();
    }
    let mut out = String::new();
    for save in saves {
        let _ = match save.listing {
            Some(listing) => writeln!(
                out,
                "{:<8} {:<32} {:>10}  saved {}",
                listing.id.as_str(),
                truncate(&listing.title, 32),
                format_price(listing.price),
                save.saved.created_at.format("%Y-%m-%d")
            ),
            None => writeln!(
                out,
                "{:<8} (listing no longer available)",
                save.saved.listing_id.as_str()
            ),
        };
    }
    out.trim_end().to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
