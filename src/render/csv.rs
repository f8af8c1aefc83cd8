use crate::models::Turn;

/// Byte-order mark so spreadsheet apps pick UTF-8
pub const BOM: char = '\u{feff}';

/// Localized header: round, participant, content
pub const CSV_HEADER: &str = "輪次,參與者,內容";

/// Quote a text field, doubling embedded quotes
pub fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Format one data row
pub fn format_row(turn: &Turn) -> String {
    format!(
        "{},{},{}",
        turn.round,
        quote_field(&turn.participant_code),
        quote_field(&turn.content)
    )
}

/// Render turns as CSV text: BOM, header, then one row per turn
pub fn format_csv(turns: &[Turn]) -> String {
    let mut output = String::new();
    output.push(BOM);
    output.push_str(CSV_HEADER);

    for turn in turns {
        output.push('\n');
        output.push_str(&format_row(turn));
    }

    output
}
