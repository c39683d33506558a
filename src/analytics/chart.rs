/// One horizontal bar: label, magnitude, and the text printed after the bar
#[derive(Debug, Clone)]
pub struct BarRow {
    pub label: String,
    pub value: f64,
    pub display: String,
}

impl BarRow {
    pub fn new(label: impl Into<String>, value: f64, display: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            display: display.into(),
        }
    }
}

/// Render rows as a text bar chart scaled so the largest value spans `width`.
pub fn render_bars(rows: &[BarRow], width: usize) -> String {
    let label_width = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
    let max = rows.iter().map(|r| r.value).fold(0.0_f64, f64::max);

    rows.iter()
        .map(|row| {
            let len = if max > 0.0 && row.value > 0.0 {
                // Any positive value gets at least one cell
                ((row.value / max) * width as f64).round().max(1.0) as usize
            } else {
                0
            };
            format!(
                "{:<lw$} │{}{} {}",
                row.label,
                "█".repeat(len),
                " ".repeat(width.saturating_sub(len)),
                row.display,
                lw = label_width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scales_to_largest_value() {
        let rows = vec![
            BarRow::new("Jan", 50.0, "50"),
            BarRow::new("Feb", 100.0, "100"),
            BarRow::new("Mar", 0.0, "0"),
        ];
        let chart = render_bars(&rows, 10);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("Jan │{}{} 50", "█".repeat(5), " ".repeat(5)));
        assert_eq!(lines[1], format!("Feb │{} 100", "█".repeat(10)));
        assert_eq!(lines[2], format!("Mar │{} 0", " ".repeat(10)));
    }

    #[test]
    fn test_tiny_values_still_visible() {
        let rows = vec![BarRow::new("a", 1.0, "1"), BarRow::new("bb", 1000.0, "1000")];
        let chart = render_bars(&rows, 20);
        assert!(chart.lines().next().unwrap().starts_with("a  │█ "));
    }

    #[test]
    fn test_all_zero() {
        let rows = vec![BarRow::new("x", 0.0, "0")];
        assert_eq!(render_bars(&rows, 4), "x │     0");
        assert_eq!(render_bars(&[], 4), "");
    }
}
