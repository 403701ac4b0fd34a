//! Infrastructure adapters

pub mod events;
pub mod gateway;
pub mod persistence;

pub use events::RecordingEventPublisher;
pub use gateway::SimulatedGateway;
pub use persistence::{
    InMemoryCartRepository, InMemoryOrderRepository, InMemoryPaymentRepository, InMemoryProductRepository,
    InMemoryPromoCodeRepository,
};
