use serde::Serialize;

/// Represents a product in the catalog, with its inventory counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: u64,
    pub in_stock: u32,
}

#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub price: u64,
    pub in_stock: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<u64>,
    pub in_stock: Option<u32>,
}

impl ProductCreate {
    pub fn new(name: impl Into<String>, price: u64, in_stock: u32) -> Self {
        Self {
            name: name.into(),
            price,
            in_stock,
        }
    }
}
