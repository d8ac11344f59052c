//! Source vs. target classification.

use tracing::debug;

use crate::domain::hasher::compute_hash_with;
use crate::domain::product::{ChangeSet, ProductMap, ProductUpdate};

/// Inserts for keys missing from the target, updates for keys whose hashes
/// differ. Target-only keys produce no action.
///
/// Prices are hashed at `decimals`, the precision both maps were normalized
/// with. Both lists come out in business key order.
pub fn compare(source: &ProductMap, target: &ProductMap, decimals: u32) -> ChangeSet {
    let mut change_set = ChangeSet::default();

    for (key, source_product) in source {
        match target.get(key) {
            None => change_set.inserts.push(source_product.clone()),
            Some(target_product) => {
                if compute_hash_with(source_product, decimals) != compute_hash_with(target_product, decimals) {
                    change_set.updates.push(ProductUpdate {
                        before: target_product.clone(),
                        after: source_product.clone(),
                    });
                }
            }
        }
    }

    debug!(
        "Planned actions: updates={}, inserts={}",
        change_set.update_count(),
        change_set.insert_count()
    );
    change_set
}
