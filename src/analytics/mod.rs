pub mod bs_analytic;

pub use bs_analytic::{price_closed_form, ClosedFormGreeks};
