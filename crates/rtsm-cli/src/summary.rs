use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use rtsm_core::SiteBalance;
use rtsm_model::{Arm, Label, Sex};

use crate::types::{CheckResult, RandomizeResult};

pub fn print_randomize_summary(result: &RandomizeResult) {
    let run = &result.run;
    let design = &result.design;
    println!("Study: {}", result.study_file.display());
    println!("Seed: {}", run.seed);
    match &result.outputs {
        Some(outputs) => {
            println!("Output: {}", result.output_dir.display());
            for path in outputs.iter() {
                println!("  {}", file_name(path));
            }
        }
        None => println!("Output: none (dry run)"),
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Site"),
        header_cell("Quota"),
        header_cell("Records"),
        header_cell("Blocks"),
        header_cell("M/A"),
        header_cell("M/B"),
        header_cell("F/A"),
        header_cell("F/B"),
        header_cell(&format!("Labels {}", design.arms.code(Arm::A))),
        header_cell(&format!("Labels {}", design.arms.code(Arm::B))),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..10 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut totals = SiteTotals::default();
    for site in &run.allocation.balance.sites {
        totals.add(site);
        let mut row = vec![
            Cell::new(site.site)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(site.quota),
            count_cell(site.records, site.quota as usize),
            Cell::new(site.blocks),
        ];
        for sex in Sex::ALL {
            for arm in Arm::ALL {
                row.push(Cell::new(site.count(sex, arm)));
            }
        }
        for arm in Arm::ALL {
            row.push(Cell::new(site.labels_dispensed(arm)));
        }
        table.add_row(row);
    }
    let mut total_row = vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(design.total_quota).add_attribute(Attribute::Bold),
        Cell::new(totals.records).add_attribute(Attribute::Bold),
        Cell::new(totals.blocks).add_attribute(Attribute::Bold),
    ];
    total_row.extend(
        totals
            .cells
            .iter()
            .chain(totals.labels.iter())
            .map(|value| Cell::new(value).add_attribute(Attribute::Bold)),
    );
    table.add_row(total_row);
    println!("{table}");
    println!("List digest (SHA-256): {}", run.allocation.digest);
}

pub fn print_check_summary(result: &CheckResult) {
    let design = &result.design;
    println!("Study: {}", result.study_file.display());
    match design.seed {
        Some(seed) => println!("Seed: {seed}"),
        None => println!("Seed: not set"),
    }
    println!(
        "Sites: {}  Total quota: {}  Block size: {} ({})",
        design.sites.len(),
        design.total_quota,
        design.block_size,
        design.layout
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Site"),
        header_cell("Arm"),
        header_cell("Code"),
        header_cell("First"),
        header_cell("Last"),
        header_cell("Count"),
    ]);
    apply_table_style(&mut table);
    for index in 3..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for plan in &result.pool_plan {
        let code = design.arms.code(plan.arm);
        let (first, last) = match plan.last() {
            Some(last) => (
                Cell::new(design.labels.render(Label(plan.start), plan.site, code)),
                Cell::new(design.labels.render(Label(last), plan.site, code)),
            ),
            None => (dim_cell("-"), dim_cell("-")),
        };
        table.add_row(vec![
            Cell::new(plan.site)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(plan.arm),
            Cell::new(code),
            first,
            last,
            Cell::new(plan.count),
        ]);
    }
    println!("{table}");
}

#[derive(Default)]
struct SiteTotals {
    records: usize,
    blocks: usize,
    /// M/A, M/B, F/A, F/B.
    cells: [usize; 4],
    labels: [usize; 2],
}

impl SiteTotals {
    fn add(&mut self, site: &SiteBalance) {
        self.records += site.records;
        self.blocks += site.blocks;
        let mut index = 0;
        for sex in Sex::ALL {
            for arm in Arm::ALL {
                self.cells[index] += site.count(sex, arm);
                index += 1;
            }
        }
        for (slot, arm) in self.labels.iter_mut().zip(Arm::ALL) {
            *slot += site.labels_dispensed(arm);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn count_cell(value: usize, expected: usize) -> Cell {
    if value == expected {
        Cell::new(value)
    } else {
        Cell::new(value).fg(Color::Red).add_attribute(Attribute::Bold)
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
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
