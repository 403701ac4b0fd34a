//! Cart use cases

use shop_common::{ProductId, UserId};
use shop_tenant::TenantContext;
use std::sync::Arc;

use crate::application::promo_codes::{PromoCodeService, PromoQuote};
use crate::domain::Cart;
use crate::error::CommerceError;
use crate::ports::{CartRepository, ProductRepository};

/// Cart application service
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
    promos: PromoCodeService,
}

impl CartService {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        products: Arc<dyn ProductRepository>,
        promos: PromoCodeService,
    ) -> Self {
        Self { carts, products, promos }
    }

    /// The user's cart, empty if none stored yet
    pub async fn view(&self, ctx: &TenantContext, user_id: UserId) -> Result<Cart, CommerceError> {
        Ok(self
            .carts
            .find(ctx, user_id)
            .await?
            .unwrap_or_else(|| Cart::new(ctx.tenant_id(), user_id)))
    }

    pub async fn add_item(
        &self,
        ctx: &TenantContext,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        let product = self
            .products
            .find_by_id(ctx, product_id)
            .await?
            .ok_or(CommerceError::NotFound("product"))?;

        let mut cart = self.view(ctx, user_id).await?;
        cart.add_item(&product, quantity)?;
        self.carts.save(ctx, &cart).await?;
        Ok(cart)
    }

    /// Zero removes the line
    pub async fn set_quantity(
        &self,
        ctx: &TenantContext,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        if quantity > 0 {
            let product = self
                .products
                .find_by_id(ctx, product_id)
                .await?
                .ok_or(CommerceError::NotFound("product"))?;
            product.ensure_available(quantity)?;
        }

        let mut cart = self.view(ctx, user_id).await?;
        cart.set_quantity(product_id, quantity)?;
        self.carts.save(ctx, &cart).await?;
        Ok(cart)
    }

    pub async fn remove_item(
        &self,
        ctx: &TenantContext,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, CommerceError> {
        let mut cart = self.view(ctx, user_id).await?;
        cart.remove_item(product_id)?;
        self.carts.save(ctx, &cart).await?;
        Ok(cart)
    }

    pub async fn clear(&self, ctx: &TenantContext, user_id: UserId) -> Result<(), CommerceError> {
        self.carts.delete(ctx, user_id).await?;
        Ok(())
    }

    /// What `code` would take off the current cart
    pub async fn preview_promo(
        &self,
        ctx: &TenantContext,
        user_id: UserId,
        code: &str,
    ) -> Result<PromoQuote, CommerceError> {
        let cart = self.view(ctx, user_id).await?;
        if cart.is_empty() {
            return Err(CommerceError::EmptyCart);
        }
        self.promos.validate(ctx, code, &cart.subtotal()).await
    }
}
