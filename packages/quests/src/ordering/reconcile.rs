// ABOUTME: Generic ordered-collection updater
// ABOUTME: Orchestrates delete, resize, reorder, update, create, and verify phases

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{
    invalid_if, permutation, union_find, BulkRequest, OrderChange, OrderedItem, OrderingError,
    OrderingResult,
};
use crate::storage::OrderedStore;

/// In-memory working copy of one ordered collection: items by ID plus a
/// positional array of slots, where `None` marks a currently free index.
/// The slot array always holds the target collection size; by the end of
/// reconciliation every slot must be occupied.
#[derive(Debug)]
struct Packed<I> {
    items: HashMap<String, I>,
    slots: Vec<Option<String>>,
}

impl<I: OrderedItem> Packed<I> {
    fn load(loaded: Vec<I>) -> OrderingResult<Self> {
        let n = loaded.len();
        let mut items = HashMap::with_capacity(n);
        let mut slots: Vec<Option<String>> = vec![None; n];

        for item in loaded {
            let idx = item.order_idx();
            if idx < 0 || idx as usize >= n {
                return Err(OrderingError::Corrupted(format!(
                    "stored index {idx} of item '{}' is outside 0..{n}",
                    item.id()
                )));
            }
            let slot = &mut slots[idx as usize];
            if let Some(occupant) = slot {
                return Err(OrderingError::Corrupted(format!(
                    "items '{occupant}' and '{}' share stored index {idx}",
                    item.id()
                )));
            }
            *slot = Some(item.id().to_string());
            items.insert(item.id().to_string(), item);
        }

        Ok(Self { items, slots })
    }

    /// Clear the item's slot and drop it from the map. False if unknown.
    fn remove(&mut self, id: &str) -> bool {
        match self.items.remove(id) {
            Some(item) => {
                self.slots[item.order_idx() as usize] = None;
                true
            }
            None => false,
        }
    }

    /// Resize the slot array to the target collection size. Shrinking must
    /// only drop free slots; an item stranded past the new end is a caller
    /// error.
    fn resize(&mut self, target: usize) -> OrderingResult<()> {
        if target >= self.slots.len() {
            self.slots.resize(target, None);
            return Ok(());
        }

        let stranded: Vec<String> = self.slots[target..]
            .iter()
            .flatten()
            .map(|id| format!("item '{id}' remains beyond new collection size {target}"))
            .collect();
        invalid_if(stranded)?;
        self.slots.truncate(target);
        Ok(())
    }

    /// Shift each chain member one step toward the open end, vacating the
    /// chain's start. The terminal slot must already be free.
    fn shift(&mut self, chain: &[usize]) {
        for i in (1..chain.len()).rev() {
            self.slots[chain[i]] = self.slots[chain[i - 1]].take();
        }
    }

    /// Rotate every cycle member to its successor's slot in one closed swap;
    /// no free slot is needed because the permutation is closed.
    fn rotate(&mut self, cycle: &[usize]) {
        let last = self.slots[cycle[cycle.len() - 1]].take();
        for i in (1..cycle.len()).rev() {
            self.slots[cycle[i]] = self.slots[cycle[i - 1]].take();
        }
        self.slots[cycle[0]] = last;
    }
}

/// Apply one bulk request against one ordered container and return the
/// re-read, fully ordered collection.
///
/// Phases run in a fixed order because each depends on slots freed or
/// filled by the one before: load, delete, resize, reorder, update, create,
/// verify, re-read. Any error aborts the whole call; the surrounding
/// transaction is rolled back by the caller, so observers see either the
/// complete new ordering or no change at all.
pub async fn reconcile<I, S>(
    store: &S,
    container_id: &str,
    request: &BulkRequest<S::CreateFields, S::UpdateFields>,
) -> OrderingResult<Vec<I>>
where
    I: OrderedItem + Send + Sync,
    S: OrderedStore<I> + ?Sized,
{
    debug!(
        "Reconciling container {}: {} deletes, {} updates, {} creates",
        container_id,
        request.delete.len(),
        request.update.len(),
        request.create.len()
    );

    if !store.container_exists(container_id).await? {
        return Err(OrderingError::ContainerNotFound(container_id.to_string()));
    }
    let mut packed = Packed::load(store.list_items(container_id).await?)?;

    apply_deletes(store, &mut packed, request).await?;

    let target = packed.slots.len() as i64 + request.create.len() as i64
        - request.delete.len() as i64;
    if target < 0 {
        return Err(OrderingError::InvalidRequest(format!(
            "{} deletions exceed the {} items in container '{}'",
            request.delete.len(),
            packed.slots.len(),
            container_id
        )));
    }
    packed.resize(target as usize)?;

    let edges = order_changes(&packed, request)?;
    apply_reorder(&mut packed, &edges)?;

    for update in &request.update {
        let updated = store
            .update_item(&update.id, update.order_idx, &update.fields)
            .await?;
        packed.items.insert(updated.id().to_string(), updated);
    }

    apply_creates(store, &mut packed, container_id, request).await?;

    let gaps: Vec<String> = packed
        .slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_none())
        .map(|(idx, _)| format!("no item at index {idx} after reconciliation"))
        .collect();
    invalid_if(gaps)?;

    Ok(store.list_items(container_id).await?)
}

async fn apply_deletes<I, S>(
    store: &S,
    packed: &mut Packed<I>,
    request: &BulkRequest<S::CreateFields, S::UpdateFields>,
) -> OrderingResult<()>
where
    I: OrderedItem + Send + Sync,
    S: OrderedStore<I> + ?Sized,
{
    let mut errors = Vec::new();
    for delete in &request.delete {
        if packed.remove(&delete.id) {
            store.delete_item(&delete.id).await?;
        } else {
            errors.push(format!("unknown item '{}' in delete request", delete.id));
        }
    }
    invalid_if(errors)
}

/// Derive an order-change edge for every update whose target index differs
/// from the item's current one. Unknown items, duplicate updates,
/// out-of-range targets, and two updates sharing one target all aggregate.
fn order_changes<I, C, U>(
    packed: &Packed<I>,
    request: &BulkRequest<C, U>,
) -> OrderingResult<Vec<OrderChange>>
where
    I: OrderedItem,
{
    let mut errors = Vec::new();
    let mut edges = Vec::new();
    let mut taken_targets = HashSet::new();
    let mut seen_items = HashSet::new();

    for update in &request.update {
        if !seen_items.insert(update.id.as_str()) {
            errors.push(format!("duplicate update for item '{}'", update.id));
            continue;
        }
        let Some(item) = packed.items.get(&update.id) else {
            errors.push(format!("unknown item '{}' in update request", update.id));
            continue;
        };
        if update.order_idx < 0 || update.order_idx as usize >= packed.slots.len() {
            errors.push(format!(
                "target index {} of item '{}' is outside 0..{}",
                update.order_idx,
                update.id,
                packed.slots.len()
            ));
            continue;
        }

        let current = item.order_idx() as usize;
        let next = update.order_idx as usize;
        if next == current {
            continue;
        }
        if !taken_targets.insert(next) {
            errors.push(format!("two updates target index {next}"));
            continue;
        }
        edges.push(OrderChange {
            prev: current,
            next,
        });
    }

    invalid_if(errors)?;
    Ok(edges)
}

/// Partition the edges into components, classify each as chain or cycle,
/// and move items between slots accordingly. Chains need their terminal
/// slot free; cycles rotate in place.
fn apply_reorder<I: OrderedItem>(
    packed: &mut Packed<I>,
    edges: &[OrderChange],
) -> OrderingResult<()> {
    let adjacency = {
        let mut next: Vec<Option<usize>> = vec![None; packed.slots.len()];
        for edge in edges {
            next[edge.prev] = Some(edge.next);
        }
        next
    };

    let mut errors = Vec::new();
    for members in union_find::components(packed.slots.len(), edges).values() {
        if members.len() < 2 {
            continue;
        }
        let resolved = permutation::classify(members, &adjacency, edges)?;
        if resolved.is_cycle {
            packed.rotate(&resolved.order);
            continue;
        }

        let Some(&terminal) = resolved.order.last() else {
            continue;
        };
        match &packed.slots[terminal] {
            Some(occupant) => errors.push(format!(
                "target index {terminal} is already occupied by item '{occupant}'"
            )),
            None => packed.shift(&resolved.order),
        }
    }
    invalid_if(errors)
}

async fn apply_creates<I, S>(
    store: &S,
    packed: &mut Packed<I>,
    container_id: &str,
    request: &BulkRequest<S::CreateFields, S::UpdateFields>,
) -> OrderingResult<()>
where
    I: OrderedItem + Send + Sync,
    S: OrderedStore<I> + ?Sized,
{
    let mut errors = Vec::new();
    for create in &request.create {
        if create.order_idx < 0 || create.order_idx as usize >= packed.slots.len() {
            errors.push(format!(
                "create target index {} is outside 0..{}",
                create.order_idx,
                packed.slots.len()
            ));
            continue;
        }
        let idx = create.order_idx as usize;
        if let Some(occupant) = &packed.slots[idx] {
            errors.push(format!(
                "create target index {idx} is already occupied by item '{occupant}'"
            ));
            continue;
        }

        let created = store
            .create_item(container_id, create.order_idx, &create.fields)
            .await?;
        packed.slots[idx] = Some(created.id().to_string());
        packed.items.insert(created.id().to_string(), created);
    }
    invalid_if(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Slot {
        id: String,
        order_idx: i64,
    }

    impl OrderedItem for Slot {
        fn id(&self) -> &str {
            &self.id
        }
        fn order_idx(&self) -> i64 {
            self.order_idx
        }
    }

    fn slot(id: &str, order_idx: i64) -> Slot {
        Slot {
            id: id.to_string(),
            order_idx,
        }
    }

    fn ids(packed: &Packed<Slot>) -> Vec<Option<&str>> {
        packed
            .slots
            .iter()
            .map(|slot| slot.as_deref())
            .collect()
    }

    #[test]
    fn test_load_builds_dense_slots() {
        let packed = Packed::load(vec![slot("a", 0), slot("b", 1), slot("c", 2)]).unwrap();
        assert_eq!(ids(&packed), vec![Some("a"), Some("b"), Some("c")]);
    }

    #[test]
    fn test_load_rejects_duplicate_index() {
        let err = Packed::load(vec![slot("a", 0), slot("b", 0)]).unwrap_err();
        assert!(matches!(err, OrderingError::Corrupted(_)));
    }

    #[test]
    fn test_load_rejects_out_of_range_index() {
        let err = Packed::load(vec![slot("a", 5)]).unwrap_err();
        assert!(matches!(err, OrderingError::Corrupted(_)));
    }

    #[test]
    fn test_shift_vacates_chain_start() {
        let mut packed = Packed::load(vec![slot("a", 0), slot("b", 1)]).unwrap();
        packed.slots.resize(3, None);
        packed.shift(&[0, 1, 2]);
        assert_eq!(ids(&packed), vec![None, Some("a"), Some("b")]);
    }

    #[test]
    fn test_rotate_moves_every_member() {
        let mut packed = Packed::load(vec![slot("a", 0), slot("b", 1), slot("c", 2)]).unwrap();
        packed.rotate(&[0, 1, 2]);
        assert_eq!(ids(&packed), vec![Some("c"), Some("a"), Some("b")]);
    }

    #[test]
    fn test_rotate_two_member_swap() {
        let mut packed = Packed::load(vec![slot("a", 0), slot("b", 1)]).unwrap();
        packed.rotate(&[0, 1]);
        assert_eq!(ids(&packed), vec![Some("b"), Some("a")]);
    }

    #[test]
    fn test_resize_rejects_stranded_items() {
        let mut packed = Packed::load(vec![slot("a", 0), slot("b", 1), slot("c", 2)]).unwrap();
        packed.remove("b");
        let err = packed.resize(2).unwrap_err();
        assert!(matches!(err, OrderingError::InvalidRequest(_)));
    }

    #[test]
    fn test_resize_shrinks_over_free_slots() {
        let mut packed = Packed::load(vec![slot("a", 0), slot("b", 1), slot("c", 2)]).unwrap();
        packed.remove("c");
        packed.resize(2).unwrap();
        assert_eq!(ids(&packed), vec![Some("a"), Some("b")]);
    }
}
