use crate::domain::model::{GtinCount, Product, ReconciliationResult};
use std::collections::{HashMap, HashSet};

/// Counts registry codes per product and rolls up the money totals.
///
/// A code belongs to a product when the product's GTIN occurs anywhere inside it.
/// Containment, not equality: a GTIN that is a substring of another product's codes
/// will count those codes too. Repeated registry codes are counted once.
pub fn reconcile<S: AsRef<str>>(products: Vec<Product>, registry_codes: &[S]) -> ReconciliationResult {
    let distinct: HashSet<&str> = registry_codes.iter().map(AsRef::as_ref).collect();

    let mut per_gtin_counts: Vec<GtinCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut updated_products = Vec::with_capacity(products.len());

    for mut product in products {
        let count = count_containing(&distinct, &product.gtin);

        match positions.get(&product.gtin) {
            Some(&index) => per_gtin_counts[index].count = count,
            None => {
                positions.insert(product.gtin.clone(), per_gtin_counts.len());
                per_gtin_counts.push(GtinCount {
                    gtin: product.gtin.clone(),
                    count,
                });
            }
        }

        product.total = count as u64;
        product.total_amount = product.price * count as f64;
        updated_products.push(product);
    }

    tracing::debug!(
        "Reconciled {} products against {} distinct codes",
        updated_products.len(),
        distinct.len()
    );

    ReconciliationResult {
        total_distinct_codes: distinct.len(),
        per_gtin_counts,
        updated_products,
    }
}

fn count_containing(codes: &HashSet<&str>, gtin: &str) -> usize {
    // an empty GTIN would match every code
    if gtin.is_empty() {
        return 0;
    }
    codes.iter().filter(|code| code.contains(gtin)).count()
}

/// Pulls the `marks` list out of a registry payload, ignoring non-string entries.
pub fn extract_marks(payload: &serde_json::Value) -> Vec<String> {
    payload
        .get("marks")
        .and_then(|marks| marks.as_array())
        .map(|marks| {
            marks
                .iter()
                .filter_map(|mark| mark.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
