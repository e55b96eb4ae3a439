pub mod bulk_import;
pub mod endorsement;
