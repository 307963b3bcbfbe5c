use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use specimen_cli::commands::{HistoryRow, ValidationReport};

pub fn print_validation(report: &ValidationReport) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Specimen type"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (kind, count) in &report.by_kind {
        let count_cell = if *count == 0 {
            dim_cell(count)
        } else {
            Cell::new(count)
        };
        table.add_row(vec![Cell::new(kind.as_str()), count_cell]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(report.specimens).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!("Terminal specimens ({}):", report.terminals.len());
    for terminal in &report.terminals {
        println!("- {terminal}");
    }
}

pub fn print_history(identifier: &str, rows: &[HistoryRow]) {
    println!("History of '{identifier}':");
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Specimen"),
        header_cell("Step"),
        header_cell("Type"),
        header_cell("Date/time"),
        header_cell("Description"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for row in rows {
        let kind_cell = if row.kind == "sampling" {
            Cell::new(&row.kind).fg(Color::Blue)
        } else {
            Cell::new(&row.kind)
        };
        let date_cell = match &row.date_time {
            Some(value) => Cell::new(value),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(&row.specimen),
            Cell::new(row.step_index),
            kind_cell,
            date_cell,
            Cell::new(&row.description),
        ]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
