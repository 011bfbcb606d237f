//! Replicated orders and menu items

use super::{MENU_ITEMS_TABLE, ORDERS_TABLE, Storage, StorageResult};
use redb::{ReadableDatabase, ReadableTable};
use shared::models::{MenuItem, Order, OrderSnapshot, TicketLine};

impl Storage {
    /// Insert or replace an order snapshot
    ///
    /// Returns `true` when the order id was not stored before.
    pub fn upsert_order(&self, snapshot: &OrderSnapshot) -> StorageResult<bool> {
        let txn = self.begin_write()?;
        let created = {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(snapshot)?;
            table.insert(snapshot.order.id, value.as_slice())?.is_none()
        };
        txn.commit()?;
        Ok(created)
    }

    /// Get an order snapshot by ID
    pub fn get_order(&self, id: i64) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or replace menu items, returning how many were written
    pub fn upsert_menu_items(&self, items: &[MenuItem]) -> StorageResult<usize> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(MENU_ITEMS_TABLE)?;
            for item in items {
                let value = serde_json::to_vec(item)?;
                table.insert(item.id, value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(items.len())
    }

    /// All menu items in id order
    pub fn list_menu_items(&self) -> StorageResult<Vec<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_ITEMS_TABLE)?;

        let mut items = Vec::new();
        for result in table.iter()? {
            let (_, guard) = result?;
            items.push(serde_json::from_slice(guard.value())?);
        }
        Ok(items)
    }

    /// Load an order with its line items resolved against the menu
    ///
    /// Items whose menu entry is gone resolve to `menu_item: None`.
    pub fn load_ticket_lines(&self, order_id: i64) -> StorageResult<Option<(Order, Vec<TicketLine>)>> {
        let read_txn = self.db.begin_read()?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;
        let menu = read_txn.open_table(MENU_ITEMS_TABLE)?;

        let snapshot: OrderSnapshot = match orders.get(order_id)? {
            Some(guard) => serde_json::from_slice(guard.value())?,
            None => return Ok(None),
        };

        let mut lines = Vec::with_capacity(snapshot.items.len());
        for item in snapshot.items {
            let menu_item = match menu.get(item.menu_item_id)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };
            lines.push(TicketLine { item, menu_item });
        }

        Ok(Some((snapshot.order, lines)))
    }
}
