//! Scheduled shifts ("programadas"): 27 fixed columns, one row per agent
//! and day. Rows without an agent email are dropped; `CapCasos` is not
//! part of the output.

use crate::normalize::date::{CenturyPolicy, DateRecipe, DateStrategy};
use crate::transform::dsl::{ColumnPolicy, ColumnRule, HeaderMode, OnError, Schema, Step};

pub const NAME: &str = "programadas";

pub const COLUMN_NAMES: &[&str] = &[
    "SM",
    "agent_email",
    "CapCasos",
    "LOB",
    "Week",
    "fecha",
    "Inicio_Turno",
    "Salida_Turno",
    "Horario_Roster",
    "Inicio_Break",
    "Fin_Break",
    "Condicion_break",
    "Asistencia",
    "Estado",
    "Novedades",
    "Observaciones",
    "Presenta_soporte",
    "Ausencia_Cubierta",
    "Observaciones_ausencia",
    "Tipo_Gestion",
    "BPO",
    "Experiencia_CRM",
    "Total_horas",
    "Inicio_Break_Prog",
    "Fin_Break_Prog",
    "Tiempo_Break",
    "Segundo_Break",
];

const SM: usize = 0;
const AGENT_EMAIL: usize = 1;
const CAP_CASOS: usize = 2;
const LOB: usize = 3;
const WEEK: usize = 4;
const FECHA: usize = 5;
const INICIO_TURNO: usize = 6;
const SALIDA_TURNO: usize = 7;
const HORARIO_ROSTER: usize = 8;
const INICIO_BREAK: usize = 9;
const FIN_BREAK: usize = 10;
const CONDICION_BREAK: usize = 11;
const ASISTENCIA: usize = 12;
const ESTADO: usize = 13;
const NOVEDADES: usize = 14;
const OBSERVACIONES: usize = 15;
const PRESENTA_SOPORTE: usize = 16;
const AUSENCIA_CUBIERTA: usize = 17;
const OBSERVACIONES_AUSENCIA: usize = 18;
const TIPO_GESTION: usize = 19;
const BPO: usize = 20;
const EXPERIENCIA_CRM: usize = 21;
const TOTAL_HORAS: usize = 22;
const INICIO_BREAK_PROG: usize = 23;
const FIN_BREAK_PROG: usize = 24;
const TIEMPO_BREAK: usize = 25;
const SEGUNDO_BREAK: usize = 26;

static DATE: DateRecipe = DateRecipe {
    strategies: &[DateStrategy::Formats {
        formats: &["%d/%m/%Y", "%Y/%m/%d", "%Y-%m-%d"],
    }],
    century: CenturyPolicy::AlwaysTwentyFirst,
    strip_quotes: false,
    lowercase: false,
};

pub fn schema() -> Schema {
    let mut steps = vec![
        Step::Rename {
            names: COLUMN_NAMES,
        },
        Step::DropRowsWhereNull {
            column: AGENT_EMAIL,
        },
    ];
    steps.extend(Step::apply_each(&[SM, AGENT_EMAIL, CAP_CASOS], ColumnRule::TextOnly));
    steps.push(Step::apply(LOB, ColumnRule::PlainText, OnError::KeepOriginal));
    steps.push(Step::apply(WEEK, ColumnRule::IntegerOnly, OnError::KeepOriginal));
    steps.push(Step::apply(FECHA, ColumnRule::Date { recipe: &DATE }, OnError::SetNull));
    steps.extend(Step::apply_each(
        &[
            INICIO_TURNO,
            SALIDA_TURNO,
            INICIO_BREAK,
            FIN_BREAK,
            EXPERIENCIA_CRM,
            INICIO_BREAK_PROG,
            FIN_BREAK_PROG,
            TIEMPO_BREAK,
        ],
        ColumnRule::BlankOut,
    ));
    steps.push(Step::apply(HORARIO_ROSTER, ColumnRule::TimeRange, OnError::SetNull));
    steps.extend(Step::apply_each(
        &[
            CONDICION_BREAK,
            ESTADO,
            NOVEDADES,
            OBSERVACIONES,
            PRESENTA_SOPORTE,
            AUSENCIA_CUBIERTA,
            OBSERVACIONES_AUSENCIA,
            TIPO_GESTION,
            BPO,
        ],
        ColumnRule::TextOnly,
    ));
    steps.extend(Step::apply_each(
        &[OBSERVACIONES, OBSERVACIONES_AUSENCIA],
        ColumnRule::ReplaceChar { from: ',', to: ' ' },
    ));
    steps.push(Step::apply(TOTAL_HORAS, ColumnRule::NumericOnly, OnError::KeepOriginal));
    steps.extend(Step::apply_each(&[ASISTENCIA, SEGUNDO_BREAK], ColumnRule::BooleanOnly));
    steps.push(Step::FillNullFrom {
        target: SEGUNDO_BREAK,
        source: ASISTENCIA,
    });
    steps.push(Step::DropColumn { column: CAP_CASOS });

    Schema {
        name: NAME,
        aliases: &["limpieza_datos_programadas"],
        description: "Scheduled shifts: 27 columns (extra columns cut), rows without agent_email dropped, CapCasos removed",
        header: HeaderMode::FirstRow,
        columns: ColumnPolicy::Truncate(COLUMN_NAMES.len()),
        empty_as_null: true,
        steps,
        write_bom: false,
        preview_column: None,
    }
}
