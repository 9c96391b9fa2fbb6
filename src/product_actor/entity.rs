use crate::actor_framework::Entity;
use crate::domain::{Product, ProductCreate, ProductPatch};
use super::{ProductAction, ProductActionResult, ProductError};

impl Entity for Product {
    const PREFIX: &'static str = "product";
    type CreatePayload = ProductCreate;
    type Patch = ProductPatch;
    type Action = ProductAction;
    type ActionResult = ProductActionResult;
    type Error = ProductError;

    fn from_create(id: String, params: ProductCreate) -> Result<Self, ProductError> {
        Ok(Self {
            id,
            name: params.name,
            price: params.price,
            in_stock: params.in_stock,
        })
    }

    /// Updates the product's name, price and/or stock.
    fn on_update(&mut self, patch: ProductPatch) -> Result<(), ProductError> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(in_stock) = patch.in_stock {
            self.in_stock = in_stock;
        }
        Ok(())
    }

    /// Handles product-specific actions.
    ///
    /// # Errors
    /// `ReserveStock` fails when the amount is zero or exceeds stock;
    /// `RestoreStock` fails on zero or on counter overflow.
    fn handle_action(&mut self, action: ProductAction) -> Result<ProductActionResult, ProductError> {
        match action {
            ProductAction::ReserveStock(amount) => {
                if amount == 0 {
                    return Err(ProductError::InvalidQuantity(amount));
                }
                if self.in_stock < amount {
                    return Err(ProductError::InsufficientStock {
                        product_id: self.id.clone(),
                        requested: amount,
                        available: self.in_stock,
                    });
                }
                self.in_stock -= amount;
                Ok(ProductActionResult::Reserved { remaining: self.in_stock })
            }
            ProductAction::RestoreStock(amount) => {
                if amount == 0 {
                    return Err(ProductError::InvalidQuantity(amount));
                }
                self.in_stock = self
                    .in_stock
                    .checked_add(amount)
                    .ok_or_else(|| ProductError::StockOverflow(self.id.clone()))?;
                Ok(ProductActionResult::Restored { in_stock: self.in_stock })
            }
        }
    }
}
