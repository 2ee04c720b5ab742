/// Report and history export.
pub mod export;
