use serde::{Deserialize, Serialize};
use serde_json::{value::RawValue, Value};
use std::{cmp::Ordering, fmt::Display, str::FromStr};
use thiserror::Error;

/// Errors produced while decoding product metadata
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("No metadata provided")]
    EmptyMetadata,

    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("Metadata is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' is not numeric: {value}")]
    InvalidNumericField { field: &'static str, value: String },
}

/// Identifier of a product in the upstream catalog
///
/// Catalog ids arrive either as JSON integers or as strings. Integer ids order
/// numerically, string ids lexicographically, and integers sort before strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Numeric(i64),
    Text(String),
}

impl ProductId {
    /// Integer form of the id, used when persisting recommendation rows
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ProductId::Numeric(id) => Some(*id),
            ProductId::Text(id) => id.trim().parse().ok(),
        }
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductId::Numeric(id) => write!(f, "{}", id),
            ProductId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        ProductId::Numeric(id)
    }
}

impl From<i32> for ProductId {
    fn from(id: i32) -> Self {
        ProductId::Numeric(i64::from(id))
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        ProductId::Text(id.to_string())
    }
}

/// A product's decision-relevant attributes
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: f64,
    /// Weight relative to whichever source product scored this record last.
    /// `None` until the record has been inserted into a collection.
    pub weight: Option<f64>,
}

/// Raw shape of a metadata blob before validation
#[derive(Debug, Deserialize)]
struct RawMetadata {
    id: Option<ProductId>,
    name: Option<String>,
    category: Option<String>,
    /// Kept as the raw literal so an out-of-range number is reported the
    /// same way as an unparseable string
    price: Option<Box<RawValue>>,
}

/// Prices are accepted as JSON numbers or numeric strings ("4.50", ".50")
fn decode_price(raw: &RawValue) -> Result<f64, ParseError> {
    let literal = raw.get().trim();
    let text = serde_json::from_str::<String>(literal).unwrap_or_else(|_| literal.to_string());

    let price = text.trim().parse::<f64>().ok().filter(|p| p.is_finite());
    price.ok_or(ParseError::InvalidNumericField {
        field: "price",
        value: text,
    })
}

impl ProductRecord {
    /// Creates an unscored product record
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            price,
            weight: None,
        }
    }

    /// Parses a metadata blob of the form
    /// `{"id": "1", "name": "socks", "category": "footwear", "price": "4.50"}`
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::EmptyMetadata);
        }

        let metadata: RawMetadata = serde_json::from_str(raw)
            .map_err(|e| ParseError::MalformedMetadata(e.to_string()))?;

        Self::from_raw(metadata)
    }

    /// Parses metadata delivered as a JSON value
    ///
    /// A string value is treated as an encoded blob, an object is decoded in
    /// place, and `null` means no metadata was provided.
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        match value {
            Value::Null => Err(ParseError::EmptyMetadata),
            Value::String(raw) => Self::parse(raw),
            Value::Object(_) => Self::parse(&value.to_string()),
            other => Err(ParseError::MalformedMetadata(format!(
                "expected an object, found {}",
                other
            ))),
        }
    }

    fn from_raw(metadata: RawMetadata) -> Result<Self, ParseError> {
        let id = metadata.id.ok_or(ParseError::MissingField("id"))?;
        let name = metadata.name.ok_or(ParseError::MissingField("name"))?;
        let category = metadata
            .category
            .ok_or(ParseError::MissingField("category"))?;
        let price = metadata
            .price
            .ok_or(ParseError::MissingField("price"))
            .and_then(|raw| decode_price(&raw))?;

        Ok(Self {
            id,
            name,
            category,
            price,
            weight: None,
        })
    }
}

impl FromStr for ProductRecord {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Weight comparison
// ============================================================================

/// Returned when an ordering is requested for a value without a weight
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Cannot compare value without a weight")]
pub struct IncomparableValue;

/// Anything that can be ranked by recommendation weight
pub trait Weighted {
    fn weight(&self) -> Option<f64>;
}

impl Weighted for ProductRecord {
    fn weight(&self) -> Option<f64> {
        self.weight
    }
}

/// Orders two values by weight (ascending)
pub fn compare_by_weight<A, B>(a: &A, b: &B) -> Result<Ordering, IncomparableValue>
where
    A: Weighted + ?Sized,
    B: Weighted + ?Sized,
{
    match (a.weight(), b.weight()) {
        (Some(a), Some(b)) => Ok(a.total_cmp(&b)),
        _ => Err(IncomparableValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_string_fields() {
        let product =
            ProductRecord::parse(r#"{"id":"1","name":"socks","category":"footwear","price":"4.50"}"#)
                .unwrap();

        assert_eq!(product.id, ProductId::Text("1".to_string()));
        assert_eq!(product.name, "socks");
        assert_eq!(product.category, "footwear");
        assert_eq!(product.price, 4.5);
        assert_eq!(product.weight, None);
    }

    #[test]
    fn test_parse_numeric_fields() {
        let product =
            ProductRecord::parse(r#"{"id":7,"name":"shoes","category":"footwear","price":8.5}"#)
                .unwrap();

        assert_eq!(product.id, ProductId::Numeric(7));
        assert_eq!(product.price, 8.5);
    }

    #[test]
    fn test_parse_price_without_leading_zero() {
        let product =
            ProductRecord::parse(r#"{"id":"2","name":"broccoli","category":"vegetables","price":".50"}"#)
                .unwrap();
        assert_eq!(product.price, 0.5);
    }

    #[test]
    fn test_parse_empty_metadata() {
        assert_eq!(ProductRecord::parse(""), Err(ParseError::EmptyMetadata));
        assert_eq!(ProductRecord::parse("   "), Err(ParseError::EmptyMetadata));
    }

    #[test]
    fn test_parse_malformed_metadata() {
        let result = ProductRecord::parse(r#""id":"1","name":"socks","adf":"footwear"4.50"}"#);
        assert!(matches!(result, Err(ParseError::MalformedMetadata(_))));

        let result = ProductRecord::parse("[1, 2, 3]");
        assert!(matches!(result, Err(ParseError::MalformedMetadata(_))));
    }

    #[test]
    fn test_parse_missing_price() {
        let result = ProductRecord::parse(r#"{"id":"1","name":"socks","category":"footwear"}"#);
        assert_eq!(result, Err(ParseError::MissingField("price")));
    }

    #[test]
    fn test_parse_missing_id() {
        let result = ProductRecord::parse(
            r#"{"irrd":"1","name":"socks","category":"footwear","price":"1.00"}"#,
        );
        assert_eq!(result, Err(ParseError::MissingField("id")));
    }

    #[test]
    fn test_parse_null_counts_as_missing() {
        let result = ProductRecord::parse(r#"{"id":"1","name":null,"category":"x","price":1}"#);
        assert_eq!(result, Err(ParseError::MissingField("name")));
    }

    #[test]
    fn test_parse_non_numeric_price() {
        let result = ProductRecord::parse(
            r#"{"id":"2","name":"broccoli","category":"vegetables","price":"somethingwrong"}"#,
        );
        assert_eq!(
            result,
            Err(ParseError::InvalidNumericField {
                field: "price",
                value: "somethingwrong".to_string()
            })
        );
    }

    #[test]
    fn test_parse_rejects_non_finite_price() {
        let result =
            ProductRecord::parse(r#"{"id":"2","name":"x","category":"y","price":"inf"}"#);
        assert!(matches!(
            result,
            Err(ParseError::InvalidNumericField { field: "price", .. })
        ));
    }

    #[test]
    fn test_out_of_range_price_is_invalid_numeric_field() {
        let as_number = ProductRecord::parse(r#"{"id":"2","name":"x","category":"y","price":1e400}"#);
        assert_eq!(
            as_number,
            Err(ParseError::InvalidNumericField {
                field: "price",
                value: "1e400".to_string()
            })
        );

        let as_text = ProductRecord::parse(r#"{"id":"2","name":"x","category":"y","price":"1e400"}"#);
        assert_eq!(as_text, as_number);
    }

    #[test]
    fn test_non_scalar_price_is_invalid_numeric_field() {
        let result = ProductRecord::parse(r#"{"id":"2","name":"x","category":"y","price":true}"#);
        assert!(matches!(
            result,
            Err(ParseError::InvalidNumericField { field: "price", .. })
        ));
    }

    #[test]
    fn test_from_value_accepts_object_and_blob() {
        let object = json!({"id": 3, "name": "hat", "category": "apparel", "price": 12});
        let blob = json!(r#"{"id": 3, "name": "hat", "category": "apparel", "price": "12"}"#);

        let from_object = ProductRecord::from_value(&object).unwrap();
        let from_blob = ProductRecord::from_value(&blob).unwrap();
        assert_eq!(from_object, from_blob);
    }

    #[test]
    fn test_from_value_null_is_empty() {
        assert_eq!(
            ProductRecord::from_value(&Value::Null),
            Err(ParseError::EmptyMetadata)
        );
        assert!(matches!(
            ProductRecord::from_value(&json!(1)),
            Err(ParseError::MalformedMetadata(_))
        ));
    }

    #[test]
    fn test_product_id_ordering() {
        assert!(ProductId::Numeric(9) < ProductId::Numeric(10));
        // String ids compare lexicographically
        assert!(ProductId::from("10") < ProductId::from("9"));
        assert!(ProductId::Numeric(100) < ProductId::from("1"));
    }

    #[test]
    fn test_product_id_display_and_as_i64() {
        assert_eq!(ProductId::from("42").to_string(), "42");
        assert_eq!(ProductId::from("42").as_i64(), Some(42));
        assert_eq!(ProductId::Numeric(5).as_i64(), Some(5));
        assert_eq!(ProductId::from("sku-1").as_i64(), None);
    }

    #[test]
    fn test_compare_by_weight() {
        let mut high = ProductRecord::new(2, "shoes", "footwear", 8.5);
        let mut low = ProductRecord::new(3, "flipflops", "swimwear", 8.5);
        let mut also_low = ProductRecord::new(4, "sandals", "swimwear", 8.5);
        high.weight = Some(5.0);
        low.weight = Some(3.0);
        also_low.weight = Some(3.0);

        assert_eq!(compare_by_weight(&high, &low), Ok(Ordering::Greater));
        assert_eq!(compare_by_weight(&low, &high), Ok(Ordering::Less));
        assert_eq!(compare_by_weight(&low, &also_low), Ok(Ordering::Equal));
    }

    #[test]
    fn test_compare_without_weight_is_incomparable() {
        let scored = ProductRecord {
            weight: Some(1.0),
            ..ProductRecord::new(1, "socks", "footwear", 4.5)
        };
        let unscored = ProductRecord::new(2, "shoes", "footwear", 8.5);

        assert_eq!(compare_by_weight(&scored, &unscored), Err(IncomparableValue));
    }
}
