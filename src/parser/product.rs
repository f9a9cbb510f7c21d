use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use super::nutrients::{parse_table, NutrientRecord};
use super::text_of;
use crate::config::CATALOG_SEGMENT;

static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.title-product").unwrap());
static BREADCRUMB_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("nav.breadcrumb").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static OG_URL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:url"]"#).unwrap());
static NUTRITION_BOX_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.box-nutritional-table").unwrap());
static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());

pub const NAME_NOT_FOUND: &str = "Nome não encontrado";
pub const CATEGORY_NOT_FOUND: &str = "Categoria não encontrada";
const BRAND_SUFFIX: &str = " - Sadia";

/// Product title with the first letter uppercased and the brand appended.
pub fn extract_name(doc: &Html) -> String {
    let title = doc
        .select(&TITLE_SEL)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty());

    match title {
        Some(t) => format!("{}{}", capitalize_first(&t), BRAND_SUFFIX),
        None => {
            debug!("no product title on page");
            NAME_NOT_FOUND.to_string()
        }
    }
}

/// Category from the breadcrumb, else from the canonical URL, else the sentinel.
pub fn extract_category(doc: &Html) -> String {
    if let Some(crumb) = doc
        .select(&BREADCRUMB_SEL)
        .next()
        .and_then(|nav| nav.select(&LINK_SEL).nth(1))
        .map(text_of)
        .filter(|t| !t.is_empty())
    {
        return crumb;
    }

    let from_url = doc
        .select(&OG_URL_SEL)
        .next()
        .and_then(|m| m.value().attr("content"))
        .and_then(category_from_url);
    if let Some(category) = from_url {
        debug!("category taken from og:url: {}", category);
        return category;
    }

    debug!("no category on page");
    CATEGORY_NOT_FOUND.to_string()
}

/// "https://…/produtos/pratos-prontos/x" → "Pratos Prontos".
pub fn category_from_url(url: &str) -> Option<String> {
    let slug = url.split(CATALOG_SEGMENT).nth(1)?.split('/').next()?;
    if slug.is_empty() {
        return None;
    }
    Some(title_case(&slug.replace('-', " ")))
}

pub fn extract_nutrients(doc: &Html) -> NutrientRecord {
    let table = doc
        .select(&NUTRITION_BOX_SEL)
        .next()
        .and_then(|b| b.select(&TABLE_SEL).next());
    if table.is_none() {
        debug!("no nutrition table on page");
    }
    parse_table(table)
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
