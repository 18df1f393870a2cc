use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Item identifier.
///
/// Ordering is numeric-aware: ids that parse as `u64` come first, ordered by
/// value (then by text, so `"007"` and `"7"` stay distinct), followed by every
/// other id in lexicographic order.
#[derive(Clone, Serialize)]
#[serde(into = "String")]
pub struct ItemId {
    raw: String,
    numeric: Option<u64>,
}

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let numeric = raw.parse::<u64>().ok();
        Self { raw, numeric }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn sort_key(&self) -> (bool, u64, &str) {
        (self.numeric.is_none(), self.numeric.unwrap_or(0), &self.raw)
    }
}

impl PartialEq for ItemId {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ItemId {}

impl Hash for ItemId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Ord for ItemId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ItemId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({:?})", self.raw)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId::new(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::new(s)
    }
}

impl From<u64> for ItemId {
    fn from(i: u64) -> Self {
        ItemId::new(i.to_string())
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.raw
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

/// Accepts `"4317499"` as well as a bare `4317499`.
impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => ItemId::new(s),
            RawId::Number(n) => ItemId::from(n),
        })
    }
}

/// Metadata for one catalog item.
///
/// Field aliases accept rows written by the product crawler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(alias = "product_id")]
    pub id: ItemId,
    /// Category tag as recorded by the data source.
    #[serde(default, alias = "main_cat_name")]
    pub category: String,
    #[serde(default, alias = "product_name")]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default, alias = "img_url", deserialize_with = "de_image_url")]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "fit_name")]
    pub fit: String,
    #[serde(default, alias = "pattern_name")]
    pub pattern: String,
    /// `None` when the source carried no readable price.
    #[serde(default, deserialize_with = "de_price")]
    pub price: Option<u64>,
}

impl ItemRecord {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            category: String::new(),
            name: String::new(),
            brand: String::new(),
            image_url: String::new(),
            description: String::new(),
            fit: String::new(),
            pattern: String::new(),
            price: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_fit(mut self, fit: impl Into<String>) -> Self {
        self.fit = fit.into();
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: u64) -> Self {
        self.price = Some(price);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Integer(u64),
    Float(f64),
    Text(String),
}

/// Prices arrive as integers, floats or display strings like `"59,000원"`.
/// Crawled rows for items that are not on sale carry `""`; anything without
/// digits reads as an unknown price.
fn de_price<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawPrice>::deserialize(deserializer)? {
        None => None,
        Some(RawPrice::Integer(n)) => Some(n),
        Some(RawPrice::Float(f)) if f.is_finite() && f >= 0.0 => Some(f.round() as u64),
        Some(RawPrice::Float(f)) => {
            return Err(serde::de::Error::custom(format!("invalid price: {}", f)))
        }
        Some(RawPrice::Text(s)) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                None
            } else {
                Some(digits.parse::<u64>().map_err(|e| {
                    serde::de::Error::custom(format!("invalid price {:?}: {}", s, e))
                })?)
            }
        }
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawImage {
    One(String),
    Many(Vec<String>),
}

/// The crawler stores a list of image urls; the first one is the display image.
fn de_image_url<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawImage::deserialize(deserializer)? {
        RawImage::One(url) => url,
        RawImage::Many(urls) => urls.into_iter().next().unwrap_or_default(),
    })
}
