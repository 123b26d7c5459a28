pub mod analyze;
pub mod infer;
pub mod inspect_checkpoint;
