//! Two-sheet xlsx builder for the generated model.
//!
//! The `Assumptions` sheet holds the derived drivers; the `Model` sheet holds
//! the linked three-statement grid. Historical columns are hardcoded values,
//! projected columns are live formulas against the assumption cells, so the
//! workbook stays editable after download. Row positions are fixed so that
//! every formula can name its inputs by absolute row.

use model_core::{CompanyMeta, ModelError, StatementRow, Timeline};
use projection_engine::DriverRatios;
use rust_xlsxwriter::utility::column_number_to_name;
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, Formula, Workbook, Worksheet, XlsxError,
};

// One-based sheet rows, exactly as the formulas reference them.
const ROW_REVENUE: u32 = 5;
const ROW_COGS: u32 = 6;
const ROW_GROSS_PROFIT: u32 = 7;
const ROW_SGA: u32 = 8;
const ROW_EBITDA: u32 = 9;
const ROW_DA: u32 = 10;
const ROW_EBIT: u32 = 11;
const ROW_INTEREST: u32 = 12;
const ROW_EBT: u32 = 13;
const ROW_TAX: u32 = 14;
const ROW_NET_INCOME: u32 = 15;

const ROW_CASH: u32 = 19;
const ROW_AR: u32 = 20;
const ROW_PPE: u32 = 21;
const ROW_OTHER_ASSETS: u32 = 22;
const ROW_TOTAL_ASSETS: u32 = 23;
const ROW_AP: u32 = 24;
const ROW_DEBT: u32 = 25;
const ROW_OTHER_LIABILITIES: u32 = 26;
const ROW_TOTAL_LIABILITIES: u32 = 27;
const ROW_SHARE_CAPITAL: u32 = 28;
const ROW_RETAINED_EARNINGS: u32 = 29;
const ROW_TOTAL_EQUITY: u32 = 30;
const ROW_CHECK: u32 = 31;

// One-based rows on the Assumptions sheet.
const DRIVER_ROW_REVENUE_GROWTH: u32 = 4;
const DRIVER_ROW_COGS: u32 = 5;
const DRIVER_ROW_SGA: u32 = 6;
const DRIVER_ROW_TAX: u32 = 7;
const DRIVER_ROW_DA: u32 = 8;
const DRIVER_ROW_CAPEX: u32 = 9;

/// Where a line's historical cells come from.
#[derive(Clone, Copy)]
enum Source {
    /// Hardcoded from the fetched statements.
    Input(fn(&StatementRow) -> f64),
    /// Formula over other rows; the builder takes the column letter.
    Calc(fn(&str) -> String),
}

struct Line {
    label: &'static str,
    row: u32,
    source: Source,
}

const IS_LINES: [Line; 11] = [
    Line { label: "Revenue", row: ROW_REVENUE, source: Source::Input(|r| r.revenue) },
    Line { label: "COGS", row: ROW_COGS, source: Source::Input(|r| r.cogs) },
    Line {
        label: "Gross Profit",
        row: ROW_GROSS_PROFIT,
        source: Source::Calc(|c| format!("={c}{ROW_REVENUE}-{c}{ROW_COGS}")),
    },
    Line { label: "SG&A", row: ROW_SGA, source: Source::Input(|r| r.sga) },
    Line {
        label: "EBITDA",
        row: ROW_EBITDA,
        source: Source::Calc(|c| format!("={c}{ROW_GROSS_PROFIT}-{c}{ROW_SGA}")),
    },
    Line { label: "D&A", row: ROW_DA, source: Source::Input(|r| r.depreciation_amortization) },
    Line {
        label: "EBIT",
        row: ROW_EBIT,
        source: Source::Calc(|c| format!("={c}{ROW_EBITDA}-{c}{ROW_DA}")),
    },
    Line { label: "Interest Expense", row: ROW_INTEREST, source: Source::Input(|r| r.interest) },
    Line {
        label: "EBT",
        row: ROW_EBT,
        source: Source::Calc(|c| format!("={c}{ROW_EBIT}-{c}{ROW_INTEREST}")),
    },
    Line { label: "Tax", row: ROW_TAX, source: Source::Input(|r| r.tax) },
    Line { label: "Net Income", row: ROW_NET_INCOME, source: Source::Input(|r| r.net_income) },
];

const BS_LINES: [Line; 13] = [
    Line { label: "Cash", row: ROW_CASH, source: Source::Input(|r| r.cash) },
    Line { label: "Accounts Receivable", row: ROW_AR, source: Source::Input(|r| r.accounts_receivable) },
    Line { label: "PP&E", row: ROW_PPE, source: Source::Input(|r| r.ppe) },
    Line { label: "Other Assets", row: ROW_OTHER_ASSETS, source: Source::Input(|r| r.other_assets) },
    Line {
        label: "Total Assets",
        row: ROW_TOTAL_ASSETS,
        source: Source::Calc(|c| format!("=SUM({c}{ROW_CASH}:{c}{ROW_OTHER_ASSETS})")),
    },
    Line { label: "Accounts Payable", row: ROW_AP, source: Source::Input(|r| r.accounts_payable) },
    Line { label: "Debt", row: ROW_DEBT, source: Source::Input(|r| r.debt) },
    Line { label: "Other Liabilities", row: ROW_OTHER_LIABILITIES, source: Source::Input(|r| r.other_liabilities) },
    Line {
        label: "Total Liabilities",
        row: ROW_TOTAL_LIABILITIES,
        source: Source::Calc(|c| format!("=SUM({c}{ROW_AP}:{c}{ROW_OTHER_LIABILITIES})")),
    },
    Line { label: "Share Capital", row: ROW_SHARE_CAPITAL, source: Source::Input(|r| r.share_capital) },
    Line { label: "Retained Earnings", row: ROW_RETAINED_EARNINGS, source: Source::Input(|r| r.retained_earnings) },
    Line {
        label: "Total Equity",
        row: ROW_TOTAL_EQUITY,
        source: Source::Calc(|c| format!("={c}{ROW_SHARE_CAPITAL}+{c}{ROW_RETAINED_EARNINGS}")),
    },
    Line {
        label: "Check",
        row: ROW_CHECK,
        source: Source::Calc(|c| {
            format!("={c}{ROW_TOTAL_ASSETS}-({c}{ROW_TOTAL_LIABILITIES}+{c}{ROW_TOTAL_EQUITY})")
        }),
    },
];

const DRIVER_LINES: [(&str, u32, fn(&DriverRatios) -> f64); 6] = [
    ("Revenue Growth %", DRIVER_ROW_REVENUE_GROWTH, |d| d.revenue_growth),
    ("COGS % of Revenue", DRIVER_ROW_COGS, |d| d.cogs_of_revenue),
    ("SG&A % of Revenue", DRIVER_ROW_SGA, |d| d.sga_of_revenue),
    ("Tax Rate %", DRIVER_ROW_TAX, |d| d.tax_rate),
    ("D&A % of PP&E", DRIVER_ROW_DA, |d| d.da_of_ppe),
    ("Capex % of Revenue", DRIVER_ROW_CAPEX, |d| d.capex_of_revenue),
];

// Banker's convention: hardcoded inputs in blue, formulas in black.
struct SheetFormats {
    title: Format,
    header: Format,
    bold: Format,
    input: Format,
    calc: Format,
    pct: Format,
}

impl SheetFormats {
    fn new() -> Self {
        Self {
            title: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_font_color(Color::RGB(0x2F5597)),
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0x2F5597))
                .set_font_color(Color::White)
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin),
            bold: Format::new().set_bold(),
            input: Format::new()
                .set_font_color(Color::RGB(0x0000FF))
                .set_num_format("#,##0"),
            calc: Format::new()
                .set_font_color(Color::RGB(0x000000))
                .set_num_format("#,##0"),
            pct: Format::new()
                .set_font_color(Color::RGB(0x0000FF))
                .set_num_format("0.0%"),
        }
    }
}

/// The download filename for a generated model.
pub fn workbook_filename(ticker: &str) -> String {
    format!("{}_Model.xlsx", ticker.to_uppercase())
}

/// Render the two-sheet workbook to an in-memory xlsx file.
///
/// `drivers` carries one entry per historical row; `timeline` fixes the
/// column layout shared by both sheets.
pub fn build_workbook(
    meta: &CompanyMeta,
    rows: &[StatementRow],
    drivers: &[DriverRatios],
    timeline: &Timeline,
) -> Result<Vec<u8>, ModelError> {
    build(meta, rows, drivers, timeline).map_err(|e| ModelError::Workbook(e.to_string()))
}

fn build(
    meta: &CompanyMeta,
    rows: &[StatementRow],
    drivers: &[DriverRatios],
    timeline: &Timeline,
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let formats = SheetFormats::new();

    let assumptions = workbook.add_worksheet();
    assumptions.set_name("Assumptions")?;
    write_assumptions(assumptions, &formats, meta, drivers, timeline)?;

    let model = workbook.add_worksheet();
    model.set_name("Model")?;
    write_model(model, &formats, meta, rows, timeline)?;

    workbook.save_to_buffer()
}

fn write_assumptions(
    sheet: &mut Worksheet,
    formats: &SheetFormats,
    meta: &CompanyMeta,
    drivers: &[DriverRatios],
    timeline: &Timeline,
) -> Result<(), XlsxError> {
    sheet.set_column_width(0, 30)?;
    sheet.write_string_with_format(0, 0, format!("{} Drivers", meta.name), &formats.title)?;
    for (i, label) in timeline.all().iter().enumerate() {
        sheet.write_string_with_format(2, (i + 1) as u16, label.as_str(), &formats.header)?;
    }

    let hist_cols = timeline.historical.len();
    let last_hist = column_number_to_name(hist_cols as u16);

    for (label, row, ratio) in DRIVER_LINES {
        let r = row - 1;
        sheet.write_string_with_format(r, 0, label, &formats.bold)?;
        for (c, derived) in drivers.iter().enumerate() {
            sheet.write_number_with_format(r, (c + 1) as u16, ratio(derived), &formats.pct)?;
        }
        for c in 0..timeline.projected.len() {
            let col_idx = (hist_cols + 1 + c) as u16;
            sheet.write_formula_with_format(
                r,
                col_idx,
                Formula::new(driver_projection_formula(&last_hist, row)),
                &formats.pct,
            )?;
        }
    }

    Ok(())
}

fn write_model(
    sheet: &mut Worksheet,
    formats: &SheetFormats,
    meta: &CompanyMeta,
    rows: &[StatementRow],
    timeline: &Timeline,
) -> Result<(), XlsxError> {
    let hist_cols = timeline.historical.len();
    let proj_cols = timeline.projected.len();

    sheet.set_column_width(0, 35)?;
    for col in 1..=(hist_cols + proj_cols) {
        sheet.set_column_width(col as u16, 14)?;
    }

    sheet.write_string_with_format(
        0,
        0,
        format!("{} 3-Statement Model", meta.name),
        &formats.title,
    )?;
    for (i, label) in timeline.all().iter().enumerate() {
        sheet.write_string_with_format(2, (i + 1) as u16, label.as_str(), &formats.header)?;
    }

    sheet.write_string_with_format(3, 0, "INCOME STATEMENT", &formats.bold)?;
    for line in &IS_LINES {
        write_history(sheet, formats, line, rows)?;
        for c in 0..proj_cols {
            let col_idx = (hist_cols + 1 + c) as u16;
            let col = column_number_to_name(col_idx);
            let prev = column_number_to_name(col_idx - 1);
            let r = line.row - 1;
            if let Some(formula) = income_projection_formula(line.label, &col, &prev) {
                sheet.write_formula_with_format(r, col_idx, Formula::new(formula), &formats.calc)?;
            } else if line.row == ROW_INTEREST {
                // No debt schedule, so interest stays zero in projected years.
                sheet.write_number_with_format(r, col_idx, 0.0, &formats.calc)?;
            } else if let Source::Calc(build) = line.source {
                sheet.write_formula_with_format(r, col_idx, Formula::new(build(&col)), &formats.calc)?;
            }
        }
    }

    sheet.write_string_with_format(17, 0, "BALANCE SHEET", &formats.bold)?;
    for line in &BS_LINES {
        write_history(sheet, formats, line, rows)?;
        for c in 0..proj_cols {
            let col_idx = (hist_cols + 1 + c) as u16;
            let col = column_number_to_name(col_idx);
            let prev = column_number_to_name(col_idx - 1);
            let formula = balance_projection_formula(line, &col, &prev);
            sheet.write_formula_with_format(
                line.row - 1,
                col_idx,
                Formula::new(formula),
                &formats.calc,
            )?;
        }
    }

    Ok(())
}

/// Label plus the historical columns: blue literals for fetched lines, black
/// formulas for computed ones.
fn write_history(
    sheet: &mut Worksheet,
    formats: &SheetFormats,
    line: &Line,
    rows: &[StatementRow],
) -> Result<(), XlsxError> {
    let r = line.row - 1;
    sheet.write_string(r, 0, line.label)?;
    for (c, row) in rows.iter().enumerate() {
        let col_idx = (c + 1) as u16;
        match line.source {
            Source::Input(get) => {
                sheet.write_number_with_format(r, col_idx, get(row), &formats.input)?;
            }
            Source::Calc(build) => {
                let col = column_number_to_name(col_idx);
                sheet.write_formula_with_format(r, col_idx, Formula::new(build(&col)), &formats.calc)?;
            }
        }
    }
    Ok(())
}

/// Projected-column formula for a driver row: every projected year reads the
/// last historical cell, so editing that one cell re-prices the projection.
fn driver_projection_formula(last_hist: &str, row: u32) -> String {
    format!("={last_hist}{row}")
}

/// Projected-column formula for an income statement line, if it has one.
/// Interest expense is handled separately as a literal zero, and calc lines
/// reuse their historical formula.
fn income_projection_formula(label: &str, col: &str, prev: &str) -> Option<String> {
    match label {
        "Revenue" => Some(format!(
            "={prev}{ROW_REVENUE}*(1+Assumptions!{col}{DRIVER_ROW_REVENUE_GROWTH})"
        )),
        "COGS" => Some(format!("={col}{ROW_REVENUE}*Assumptions!{col}{DRIVER_ROW_COGS}")),
        "SG&A" => Some(format!("={col}{ROW_REVENUE}*Assumptions!{col}{DRIVER_ROW_SGA}")),
        "Tax" => Some(format!("={col}{ROW_EBT}*Assumptions!{col}{DRIVER_ROW_TAX}")),
        "D&A" => Some(format!("={prev}{ROW_DA}")),
        "Net Income" => Some(format!("={col}{ROW_EBT}-{col}{ROW_TAX}")),
        _ => None,
    }
}

/// Projected-column formula for a balance sheet line. Retained earnings
/// accumulates net income; every other fetched line rolls forward flat,
/// cash included.
fn balance_projection_formula(line: &Line, col: &str, prev: &str) -> String {
    match line.source {
        Source::Calc(build) => build(col),
        Source::Input(_) if line.row == ROW_RETAINED_EARNINGS => {
            format!("={prev}{ROW_RETAINED_EARNINGS}+{col}{ROW_NET_INCOME}")
        }
        Source::Input(_) => format!("={prev}{}", line.row),
    }
}
