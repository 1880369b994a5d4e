//! Inbound channel handling and reply emission.

pub mod emitter;
pub mod exchange;
pub mod gateway;
pub mod relay;

pub use emitter::ReplyEmitter;
pub use exchange::Exchange;
pub use gateway::PortGateway;
pub use relay::ChromeEventRelay;
