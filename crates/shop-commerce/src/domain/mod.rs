//! Domain layer

pub mod cart;
pub mod events;
pub mod order;
pub mod payment;
pub mod product;
pub mod promo_code;

pub use cart::{Cart, CartItem};
pub use events::CommerceEvent;
pub use order::{Order, OrderLine, OrderStatus};
pub use payment::{Payment, PaymentStatus};
pub use product::{NewProduct, Product, ProductUpdate};
pub use promo_code::{Discount, NewPromoCode, PromoCode, PromoCodeUpdate, PromoRejection, PromoStatus};
