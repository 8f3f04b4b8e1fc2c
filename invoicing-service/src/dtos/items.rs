use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::MAX_NAME_CHARS;

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    #[validate(
        length(max = 200, message = "Product name is too long"),
        custom(function = "crate::utils::validation::not_blank", message = "Product name is required")
    )]
    pub name: String,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,

    #[validate(custom(function = "positive_amount", message = "Rate must be greater than 0"))]
    pub rate: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,

    #[validate(custom(function = "positive_amount", message = "Rate must be greater than 0"))]
    pub rate: Decimal,
}

fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || value.is_zero() {
        return Err(ValidationError::new("not_positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn add_item_rules() {
        let ok = AddItemRequest {
            name: "Pen".to_string(),
            quantity: 3,
            rate: dec!(10),
        };
        assert!(ok.validate().is_ok());

        let bad = AddItemRequest {
            name: " ".to_string(),
            quantity: 0,
            rate: dec!(0),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("quantity"));
        assert!(fields.contains_key("rate"));
    }

    #[test]
    fn long_names_are_rejected() {
        let req = AddItemRequest {
            name: "x".repeat(MAX_NAME_CHARS + 1),
            quantity: 1,
            rate: dec!(1),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn rate_accepts_json_numbers_and_strings() {
        let from_number: UpdateItemRequest =
            serde_json::from_str(r#"{"quantity": 2, "rate": 12.5}"#).unwrap();
        let from_string: UpdateItemRequest =
            serde_json::from_str(r#"{"quantity": 2, "rate": "12.5"}"#).unwrap();
        assert_eq!(from_number.rate, dec!(12.5));
        assert_eq!(from_string.rate, dec!(12.5));
        assert!(UpdateItemRequest {
            quantity: 2,
            rate: dec!(-1)
        }
        .validate()
        .is_err());
    }
}
