use indexmap::IndexMap;
use metrics::gauge;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{Item, ItemCreate};

/// First identifier handed out after the seed entries
const FIRST_FREE_ID: i64 = 4;

/// Mutable state guarded by the store lock
#[derive(Debug)]
struct Catalog {
    /// Items keyed by identifier, in insertion order
    items: IndexMap<i64, Item>,
    /// The next identifier to allocate
    next_id: i64,
}

/// In-memory item catalog shared by all request handlers
///
/// The catalog lives for the lifetime of the process. Each process instance
/// holds its own independent copy, so horizontally scaled instances diverge
/// as soon as one of them accepts a create.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    inner: Arc<RwLock<Catalog>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::seeded()
    }
}

impl CatalogStore {
    /// Create a store holding the three fixed seed entries
    pub fn seeded() -> Self {
        // Build the seed entries
        let seed = [
            (1, "Laptop", "High-performance laptop", 999.99, 99.99),
            (2, "Mouse", "Wireless mouse", 29.99, 3.00),
            (3, "Keyboard", "Mechanical keyboard", 89.99, 9.00),
        ];
        // Insert them in identifier order
        let items = seed
            .into_iter()
            .map(|(id, name, description, price, tax)| {
                let item = Item {
                    id,
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    price,
                    tax: Some(tax),
                };
                (id, item)
            })
            .collect();
        Self::from_catalog(Catalog {
            items,
            next_id: FIRST_FREE_ID,
        })
    }

    /// Create a store with no entries
    pub fn empty() -> Self {
        Self::from_catalog(Catalog {
            items: IndexMap::new(),
            next_id: 1,
        })
    }

    fn from_catalog(catalog: Catalog) -> Self {
        gauge!("itemcatalog.items").set(catalog.items.len() as f64);
        Self {
            inner: Arc::new(RwLock::new(catalog)),
        }
    }

    /// Fetch a single item by identifier
    pub async fn get(&self, id: i64) -> Option<Item> {
        self.inner.read().await.items.get(&id).cloned()
    }

    /// Store an item under the given identifier, replacing any existing entry
    ///
    /// The key must equal the item's own identifier, and must leave room for
    /// a successor so that the counter can stay ahead of it.
    pub async fn put(&self, id: i64, item: Item) -> Result<(), StoreError> {
        if item.id != id {
            return Err(StoreError::KeyMismatch {
                key: id,
                item_id: item.id,
            });
        }
        let successor = id.checked_add(1).ok_or(StoreError::IdOutOfRange(id))?;
        let mut catalog = self.inner.write().await;
        // Keep the counter ahead of every key ever stored
        if successor > catalog.next_id {
            catalog.next_id = successor;
        }
        catalog.items.insert(id, item);
        gauge!("itemcatalog.items").set(catalog.items.len() as f64);
        Ok(())
    }

    /// Return every item in insertion order
    pub async fn all(&self) -> Vec<Item> {
        self.inner.read().await.items.values().cloned().collect()
    }

    /// Return the number of stored items
    pub async fn count(&self) -> usize {
        self.inner.read().await.items.len()
    }

    /// Reserve the next identifier
    pub async fn allocate_id(&self) -> Result<i64, StoreError> {
        let mut catalog = self.inner.write().await;
        Self::next(&mut catalog)
    }

    /// Allocate an identifier and store a new item under it
    ///
    /// Allocation and insertion happen under a single write guard, so two
    /// concurrent creates can never be handed the same identifier.
    pub async fn create(&self, input: ItemCreate) -> Result<Item, StoreError> {
        let mut catalog = self.inner.write().await;
        // Reserve the identifier
        let id = Self::next(&mut catalog)?;
        // Build and store the item
        let item = Item::from_create(id, input);
        catalog.items.insert(id, item.clone());
        gauge!("itemcatalog.items").set(catalog.items.len() as f64);
        // Output debugging information
        debug!(item_id = id, next_id = catalog.next_id, "Item stored");
        Ok(item)
    }

    fn next(catalog: &mut Catalog) -> Result<i64, StoreError> {
        let id = catalog.next_id;
        catalog.next_id = id.checked_add(1).ok_or(StoreError::IdsExhausted)?;
        Ok(id)
    }
}
