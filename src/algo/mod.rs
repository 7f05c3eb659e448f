/// Lookup-table methods
pub mod tabular;
