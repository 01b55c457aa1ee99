//! Connection logs: LOB names mapped to their reporting codes, Spanish
//! month-name dates, fixed output column names.

use crate::normalize::date::{CenturyPolicy, DateRecipe, DateStrategy, MonthPattern};
use crate::transform::dsl::{ColumnPolicy, ColumnRule, HeaderMode, OnError, Schema, Step};

pub const NAME: &str = "conexiones";

const LOB_COLUMN: usize = 8;
const DATE_COLUMN: usize = 10;

pub const COLUMN_NAMES: &[&str] = &[
    "status_start_time",
    "status_end_time",
    "agent_email",
    "agent_status",
    "interval_start_at",
    "duration_hrs",
    "bpo",
    "Service",
    "lob",
    "ID_LOB",
    "fecha",
];

/// LOB name as exported → LOB code used downstream.
pub const LOB_CODES: &[(&str, &str)] = &[
    ("CS Customer Account", "CS_Customer Account"),
    ("CS Fraude", "CS_Fraude"),
    ("CS Legales", "CS_Legales"),
    ("CS Local Cerrado", "CS_Local Cerrado"),
    ("CS Overnight", "CS_Overnight"),
    ("CS QCommerce&RiderIssues", "CS_QCommerce&RiderIssues"),
    ("CS Recovery Team", "CS_Recovery"),
    ("CS Social Media", "CS_Social Media"),
    ("Customer Live", "CS_Live Chat"),
    ("CS PDI", "CS_PDI"),
    ("PS B2X", "PS_B2X"),
    ("PS Billing Supp", "PS_Billing Support"),
    ("PS Catalogo", "PS_Catalogo"),
    ("PS Content Offline", "PS_Content Offline"),
    ("PS Content Online", "PS_Content Online"),
    ("PS Live Chat", "PS_Live Chat"),
    ("PS Onboarding Altas", "PS_Onboarding Altas"),
    ("PS Onboarding Quality Check", "PS_Onboarding Quality Check"),
    ("PS Phone", "PS_Phone"),
    ("PS PICS Edicion", "PS_PICS Edicion"),
    ("PS PICS Moderacion", "PS_PICS Moderacion"),
    ("PS QA Content", "PS_QA Content"),
    ("PS QA Onboarding", "PS_QA Onboarding"),
    ("PS QA Pics", "PS_QA Pics"),
    ("PS QA SalesSupport", "PS_QA SalesSupport"),
    ("PS SalesSupport", "PS_SalesSupport"),
    ("PS Shopper Support", "PS_Shopper Support"),
    ("Recupero POS Norte", "PI04_Recupero POS Norte"),
    ("PS Recupero POS CL", "PI03_Recupero POS CL"),
    ("RS Boost Channel", "RS_Boost Channel"),
    ("RS DS Accionables", "RS_DS Accionables"),
    ("RS Live Chat", "RS_Live Chat"),
    ("RS Offshift", "RS_Offshift"),
    ("RS Onboarding", "RS_Onboarding"),
    ("Recupero POS CL", "PS_Recupero POS CL"),
    ("PS Onboarding", "PS_Onboarding"),
    ("RS Overnight", "RS_Overnight"),
    ("CS Invoice Missing", "CS_Invoice Missing"),
    ("CS Across Journey", "CS_Across Journey"),
    ("CS Across Journey Offline", "CS_Across Journey Offline"),
    ("CS PDI Offline", "CS_PDI Offline"),
    ("PS CDD y RS", "PS_CDD y RS"),
    ("PS Curación", "PS_Curacion"),
];

static DATE: DateRecipe = DateRecipe {
    strategies: &[
        DateStrategy::MonthName {
            pattern: MonthPattern::Spaced {
                fallback_month: "01",
            },
        },
        DateStrategy::Formats {
            formats: &["%d %b %Y", "%d %B %Y", "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"],
        },
    ],
    century: CenturyPolicy::AlwaysTwentyFirst,
    strip_quotes: true,
    lowercase: false,
};

pub fn schema() -> Schema {
    Schema {
        name: NAME,
        aliases: &["limpieza_datos_conexiones"],
        description: "Connection logs (11+ columns): LOB codes in column 8, Spanish month dates in column 10, fixed column names",
        header: HeaderMode::FirstRow,
        columns: ColumnPolicy::AtLeast(COLUMN_NAMES.len()),
        empty_as_null: true,
        steps: vec![
            Step::apply(
                LOB_COLUMN,
                ColumnRule::Lookup { table: LOB_CODES },
                OnError::KeepOriginal,
            ),
            Step::apply(
                DATE_COLUMN,
                ColumnRule::Date { recipe: &DATE },
                OnError::KeepOriginal,
            ),
            Step::Rename {
                names: COLUMN_NAMES,
            },
        ],
        write_bom: true,
        preview_column: Some(DATE_COLUMN),
    }
}
