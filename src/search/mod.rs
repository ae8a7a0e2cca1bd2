pub mod combiner;
pub mod executor;
pub mod scorer;
pub mod topk;
