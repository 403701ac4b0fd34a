//! Catalog management

use shop_common::{Page, PageRequest, ProductId};
use shop_tenant::TenantContext;
use std::sync::Arc;

use crate::application::stock_conflict;
use crate::domain::{NewProduct, Product, ProductUpdate};
use crate::error::CommerceError;
use crate::ports::{ProductRepository, StockChange};

/// Product application service
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    /// Add a product to the catalog
    pub async fn create(&self, ctx: &TenantContext, input: NewProduct) -> Result<Product, CommerceError> {
        let product = Product::create(ctx.tenant_id(), input)?;
        self.products.insert(ctx, &product).await?;
        tracing::info!(tenant_id = %ctx.tenant_id(), product_id = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CommerceError> {
        let mut product = self.get(ctx, id).await?;
        product.apply(update)?;
        self.products.update(ctx, &product).await?;
        // Stock may have moved since the read
        self.get(ctx, id).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: ProductId) -> Result<Product, CommerceError> {
        self.products
            .find_by_id(ctx, id)
            .await?
            .ok_or(CommerceError::NotFound("product"))
    }

    /// Page through the catalog; shoppers only see active products
    pub async fn list(
        &self,
        ctx: &TenantContext,
        page: PageRequest,
        only_active: bool,
    ) -> Result<Page<Product>, CommerceError> {
        let mut products = self.products.list(ctx).await?;
        if only_active {
            products.retain(|p| p.active);
        }
        Ok(Page::from_vec(products, page))
    }

    /// Signed stock correction (receiving goods, shrinkage)
    pub async fn adjust_stock(&self, ctx: &TenantContext, id: ProductId, delta: i64) -> Result<Product, CommerceError> {
        let mut product = self.get(ctx, id).await?;
        product.adjust_stock(delta)?;

        self.products
            .apply_stock_changes(ctx, &[StockChange { product_id: id, delta }])
            .await
            .map_err(stock_conflict)?;

        tracing::info!(tenant_id = %ctx.tenant_id(), product_id = %id, delta, "stock adjusted");
        self.get(ctx, id).await
    }

    /// Hide from shoppers; existing orders are unaffected
    pub async fn deactivate(&self, ctx: &TenantContext, id: ProductId) -> Result<Product, CommerceError> {
        self.update(ctx, id, ProductUpdate { active: Some(false), ..Default::default() })
            .await
    }
}
