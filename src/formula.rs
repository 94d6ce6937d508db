use anyhow::{Result, anyhow, bail};
use formualizer_parse::parser::ReferenceType;
use formualizer_parse::pretty::canonical_formula;
use formualizer_parse::{ASTNode, ASTNodeType};

use crate::address::column_letters;

pub fn parse_formula(formula: &str) -> Result<ASTNode> {
    let trimmed = formula.trim();
    let with_equals = if trimmed.starts_with('=') {
        trimmed.to_string()
    } else {
        format!("={}", trimmed)
    };
    formualizer_parse::parse(&with_equals)
        .map_err(|e| anyhow!("failed to parse total formula: {}", e.message))
}

/// Rewrites every single-column range on `col` so it spans `start..=end`.
///
/// Returns the formula without a leading `=`. Fails when the formula has no
/// range over that column, leaving the caller to pick a fallback.
pub fn retarget_column_ranges(formula: &str, col: u32, start: u32, end: u32) -> Result<String> {
    let mut ast = parse_formula(formula)?;
    let touched = retarget_in_place(&mut ast, col, start, end);
    if touched == 0 {
        bail!(
            "formula '{}' has no range over column {}",
            formula,
            column_letters(col)
        );
    }
    let rendered = canonical_formula(&ast);
    Ok(rendered.trim_start_matches('=').to_string())
}

/// Plain `SUM` over the data rows, used when the original formula cannot be reused.
pub fn sum_formula(col: u32, start: u32, end: u32) -> String {
    let letters = column_letters(col);
    format!("SUM({letters}{start}:{letters}{end})")
}

fn retarget_in_place(node: &mut ASTNode, col: u32, start: u32, end: u32) -> usize {
    match &mut node.node_type {
        ASTNodeType::Reference {
            original,
            reference,
        } => {
            if retarget_reference(reference, col, start, end) {
                *original = reference.to_string();
                1
            } else {
                0
            }
        }
        ASTNodeType::UnaryOp { expr, .. } => retarget_in_place(expr, col, start, end),
        ASTNodeType::BinaryOp { left, right, .. } => {
            retarget_in_place(left, col, start, end) + retarget_in_place(right, col, start, end)
        }
        ASTNodeType::Function { args, .. } => args
            .iter_mut()
            .map(|arg| retarget_in_place(arg, col, start, end))
            .sum(),
        ASTNodeType::Array(rows) => rows
            .iter_mut()
            .flat_map(|row| row.iter_mut())
            .map(|cell| retarget_in_place(cell, col, start, end))
            .sum(),
        ASTNodeType::Literal(_) => 0,
    }
}

fn retarget_reference(reference: &mut ReferenceType, col: u32, start: u32, end: u32) -> bool {
    match reference {
        ReferenceType::Range {
            start_row,
            start_col,
            end_row,
            end_col,
            ..
        } => {
            let single_column = *start_col == Some(col) && *end_col == Some(col);
            if !single_column || start_row.is_none() || end_row.is_none() {
                return false;
            }
            *start_row = Some(start);
            *end_row = Some(end);
            true
        }
        // a lone cell is how a one-row SUM reads back
        ReferenceType::Cell {
            row, col: cell_col, ..
        } if *cell_col == col && start == end => {
            *row = start;
            true
        }
        _ => false,
    }
}
