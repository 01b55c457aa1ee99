//! Hour caps ("topes"): headerless 9-column files.
//!
//! Rows that look like a header (any cell equal to a column title, checked
//! before extra columns are cut) are removed, and dates are read as
//! `DD/MM/YYYY` or `YYYY-MM-DD`, so already-cleaned files can be fed back in.

use crate::normalize::date::{CenturyPolicy, DateRecipe, DateStrategy};
use crate::transform::dsl::{ColumnPolicy, ColumnRule, HeaderMode, OnError, Schema, Step};

pub const NAME: &str = "topes";

pub const COLUMN_TITLES: &[&str] = &[
    "SM",
    "agent_email",
    "LOB",
    "Week",
    "fecha",
    "Inicio_Turno",
    "Salida_Turno",
    "Horario_Rooster",
    "Total_horas",
];

const WEEK: usize = 3;
const FECHA: usize = 4;
const HORARIO: usize = 7;
const TOTAL_HORAS: usize = 8;

static DATE: DateRecipe = DateRecipe {
    strategies: &[DateStrategy::Formats {
        formats: &["%d/%m/%Y", "%Y-%m-%d"],
    }],
    century: CenturyPolicy::AlwaysTwentyFirst,
    strip_quotes: false,
    lowercase: false,
};

pub fn schema() -> Schema {
    let mut steps = vec![Step::DropRowsMatching {
        values: COLUMN_TITLES,
    }];
    steps.extend(Step::apply_each(&[0, 1, 2], ColumnRule::LettersOnly));
    steps.push(Step::apply(WEEK, ColumnRule::IntegerOnly, OnError::KeepOriginal));
    steps.push(Step::apply(FECHA, ColumnRule::Date { recipe: &DATE }, OnError::SetNull));
    steps.extend(Step::apply_each(&[5, 6], ColumnRule::BlankOut));
    steps.push(Step::apply(HORARIO, ColumnRule::TimeRange, OnError::SetNull));
    steps.push(Step::apply(TOTAL_HORAS, ColumnRule::NumericOnly, OnError::KeepOriginal));

    Schema {
        name: NAME,
        aliases: &["limpieza_datos_topes"],
        description: "Hour caps: headerless, 9 columns (extra columns cut), DD/MM/YYYY dates, HH:MM - HH:MM rosters",
        header: HeaderMode::Absent {
            titles: COLUMN_TITLES,
        },
        columns: ColumnPolicy::Truncate(COLUMN_TITLES.len()),
        empty_as_null: true,
        steps,
        write_bom: false,
        preview_column: None,
    }
}
