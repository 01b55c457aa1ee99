//! Shared cell normalization.
//!
//! - `date`: locale-independent date and time parsing
//! - `value`: decimal, numeric, boolean and text coercion

pub mod date;
pub mod value;

pub use date::{
    month_number, normalize_clock, normalize_date, normalize_time_range, reformat_time,
    CenturyPolicy, DateRecipe, DateStrategy, MonthPattern,
};
pub use value::{
    cell_text, is_plain_text, normalize_decimal, round_trim, to_bool_or_null, to_float_or_null,
    to_integer_or_null,
};
