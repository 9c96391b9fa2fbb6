/// Custom actions for Product entities.
///
/// Stock counters only ever change through these actions so every change
/// runs inside the store actor.
#[derive(Debug, Clone)]
pub enum ProductAction {
    /// Takes a quantity out of stock for a new order.
    ///
    /// # Errors
    /// Will fail if the requested amount exceeds available stock.
    ReserveStock(u32),
    /// Gives a quantity back to stock, e.g. when an order is rolled back.
    RestoreStock(u32),
}

/// Results from ProductActions - variants match 1:1 with ProductAction
#[derive(Debug, Clone, PartialEq)]
pub enum ProductActionResult {
    Reserved { remaining: u32 },
    Restored { in_stock: u32 },
}
