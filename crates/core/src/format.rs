use crate::rows::{render_value, QueryResultSet, Row};

const NO_RESULTS: &str = "No results found for your query.";
const FULL_RENDER_LIMIT: usize = 10;
const SUMMARY_ROWS: usize = 5;

/// Renders a result set as WhatsApp-style text.
///
/// Pure function: same input, same text. Small sets render every row; large
/// sets render a count, the first five rows, and a "more records" suffix.
pub fn format_result_set(results: &QueryResultSet) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut response = String::from("Results :\n\n");

    if results.len() <= FULL_RENDER_LIMIT {
        for (index, row) in results.rows.iter().enumerate() {
            push_row_block(&mut response, index, row);
        }
    } else {
        response.push_str(&format!(
            "Found {} records. Here are the first {SUMMARY_ROWS}:\n\n",
            results.len()
        ));
        for (index, row) in results.rows.iter().take(SUMMARY_ROWS).enumerate() {
            push_row_block(&mut response, index, row);
        }
        response.push_str(&format!("... and {} more records.", results.len() - SUMMARY_ROWS));
    }

    response
}

fn push_row_block(response: &mut String, index: usize, row: &Row) {
    response.push_str(&format!("*Row {}*\n", index + 1));
    for (column, value) in row.fields() {
        response.push_str(&format!("{column}: {}\n", render_value(value)));
    }
    response.push('\n');
}
