use crate::app_error::AppError;

/// A strictly positive item quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity(i32);

impl Quantity {
    pub fn new(value: i32) -> Result<Self, AppError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(AppError::BadRequest(
                "quantity must be a positive integer".into(),
            ))
        }
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

/// Unwraps an optional request field, naming it in the `400` message when absent.
pub fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_must_be_positive() {
        assert_eq!(Quantity::new(3).unwrap().get(), 3);
        assert!(matches!(Quantity::new(0), Err(AppError::BadRequest(_))));
        assert!(matches!(Quantity::new(-1), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn required_names_the_field() {
        assert_eq!(required(Some(5), "product_id").unwrap(), 5);

        match required::<i32>(None, "product_id") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "product_id is required"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
