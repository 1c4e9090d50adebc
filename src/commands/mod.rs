pub mod plot;
pub mod scan;
pub mod sv;
