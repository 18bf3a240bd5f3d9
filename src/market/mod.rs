/// Demand schedule types.
pub mod demand;
pub mod dispatch;
pub mod engine;
/// Portfolio cost configuration and profit aggregation.
pub mod portfolio;
/// Merit-order supply stack.
pub mod stack;
