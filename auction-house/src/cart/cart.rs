use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    models::auctions::{ItemRef, UserId},
    store::StoreError,
};

use super::AuctionGuard;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    #[error("This item is currently in an active auction and cannot be added to cart. Please place a bid instead.")]
    ItemInActiveAuction(ItemRef),

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Item {0} is not in the cart")]
    ItemNotInCart(ItemRef),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub item: ItemRef,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn quantity_of(&self, item: &ItemRef) -> u32 {
        self.items
            .iter()
            .find(|line| &line.item == item)
            .map_or(0, |line| line.quantity)
    }
}

/// Fixed-price carts, one per user.
#[derive(Debug)]
pub struct CartService {
    guard: AuctionGuard,
    carts: Mutex<HashMap<UserId, Cart>>,
}

impl CartService {
    pub fn new(guard: AuctionGuard) -> Self {
        Self {
            guard,
            carts: Mutex::new(HashMap::new()),
        }
    }

    pub async fn cart(&self, user_id: UserId) -> Cart {
        let carts = self.carts.lock().await;
        carts.get(&user_id).cloned().unwrap_or_default()
    }

    pub async fn add_item(
        &self,
        user_id: UserId,
        item: ItemRef,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        if self.guard.has_active_auction(&item).await? {
            debug!("Refused {} for {}: item is under auction", item, user_id);
            return Err(CartError::ItemInActiveAuction(item));
        }

        let mut carts = self.carts.lock().await;
        let cart = carts.entry(user_id).or_default();

        match cart.items.iter_mut().find(|line| line.item == item) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => cart.items.push(CartItem { item, quantity }),
        }

        info!("[🛒] Cart of {} now holds {} line(s)", user_id, cart.items.len());
        Ok(cart.clone())
    }

    pub async fn remove_item(&self, user_id: UserId, item: &ItemRef) -> Result<Cart, CartError> {
        let mut carts = self.carts.lock().await;
        let cart = carts.entry(user_id).or_default();

        let Some(position) = cart.items.iter().position(|line| &line.item == item) else {
            return Err(CartError::ItemNotInCart(item.clone()));
        };

        cart.items.remove(position);
        Ok(cart.clone())
    }
}
