//! RQ exports: decimal commas, mixed-format dates and clock times.
//!
//! Rules only touch the columns a file actually has.

use crate::normalize::date::{CenturyPolicy, DateRecipe, DateStrategy, MonthPattern};
use crate::transform::dsl::{ColumnPolicy, ColumnRule, HeaderMode, OnError, Schema, Step};

pub const NAME: &str = "rq";

const DATE_COLUMN: usize = 2;
const TIME_COLUMN: usize = 4;

static DATE: DateRecipe = DateRecipe {
    strategies: &[
        DateStrategy::Flexible { dayfirst: true },
        DateStrategy::MonthName {
            pattern: MonthPattern::Loose,
        },
    ],
    century: CenturyPolicy::AlwaysTwentyFirst,
    strip_quotes: false,
    lowercase: true,
};

pub fn schema() -> Schema {
    let mut steps = Step::apply_each(&[0, 1], ColumnRule::DecimalNormalize);
    steps.push(Step::apply(
        DATE_COLUMN,
        ColumnRule::Date { recipe: &DATE },
        OnError::KeepOriginal,
    ));
    steps.push(Step::apply(3, ColumnRule::DecimalNormalize, OnError::KeepOriginal));
    steps.push(Step::apply(TIME_COLUMN, ColumnRule::TimeOfDay, OnError::RevertColumn));
    steps.push(Step::apply(10, ColumnRule::DecimalNormalize, OnError::KeepOriginal));

    Schema {
        name: NAME,
        aliases: &["limpieza_datos_RQ"],
        description: "RQ exports: decimal commas in columns 0, 1, 3 and 10, day-first dates in column 2, HH:MM times in column 4",
        header: HeaderMode::FirstRow,
        columns: ColumnPolicy::Sparse,
        empty_as_null: true,
        steps,
        write_bom: false,
        preview_column: Some(DATE_COLUMN),
    }
}
