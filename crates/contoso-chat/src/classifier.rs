//! Product payload classification.
//!
//! Decides whether a batch of products is rendered as a side-by-side
//! comparison table or as individual cards. The check is structural: it looks
//! at which keys each product carries, never at their values.

use contoso_core::types::Product;

/// Minimum number of products for a comparison table.
const MIN_COMPARISON_SIZE: usize = 2;

/// `true` iff there are at least two products and every one of them carries
/// `name`, `price` and `rating`.
pub fn is_comparison(products: &[Product]) -> bool {
    products.len() >= MIN_COMPARISON_SIZE && products.iter().all(is_comparable)
}

fn is_comparable(product: &Product) -> bool {
    product.name.is_present() && product.price.is_present() && product.rating.is_present()
}
