//! History queries and export formats

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::achievements::Achievement;
use super::record::SpinRecord;
use super::stats::Statistics;

/// Totals over a trailing window of days
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub days: u32,
    pub total_spins: u64,
    pub total_wins: u64,
    pub total_win_amount: f64,
    pub total_bet_amount: f64,
    pub biggest_win: f64,
    pub win_ratio: f64,
}

impl PeriodSummary {
    pub fn from_records<'a>(days: u32, records: impl IntoIterator<Item = &'a SpinRecord>) -> Self {
        let mut summary = Self {
            days,
            ..Default::default()
        };

        for record in records {
            summary.total_spins += 1;
            summary.total_bet_amount += record.bet;
            summary.total_win_amount += record.win;
            summary.biggest_win = summary.biggest_win.max(record.win);
            if record.is_win {
                summary.total_wins += 1;
            }
        }

        if summary.total_spins > 0 {
            summary.win_ratio = summary.total_wins as f64 / summary.total_spins as f64;
        }
        summary
    }
}

/// Full export of one user's ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub user_id: String,
    pub statistics: Statistics,
    pub achievements: Vec<Achievement>,
    /// Newest first
    pub history: Vec<SpinRecord>,
    pub export_date: DateTime<Utc>,
}

const CSV_HEADER: [&str; 6] = ["Date", "Bet", "Win", "Result", "Balance before", "Balance after"];

/// CSV with every cell quoted; empty string when there are no records
pub fn to_csv(records: &[SpinRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(csv_row(CSV_HEADER.iter().map(|s| s.to_string())));

    for record in records {
        let result = if record.is_win { "Win" } else { "Loss" };
        lines.push(csv_row([
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.bet.to_string(),
            record.win.to_string(),
            result.to_string(),
            record.balance_before.to_string(),
            record.balance_after.to_string(),
        ]));
    }

    lines.join("\n")
}

fn csv_row(cells: impl IntoIterator<Item = String>) -> String {
    cells
        .into_iter()
        .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_csv_quotes_every_cell() {
        let timestamp = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let records = vec![
            SpinRecord::new("p", "s", 2.0, 10.0)
                .with_balances(100.0, 108.0)
                .at(timestamp),
        ];

        let csv = to_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            r#""Date","Bet","Win","Result","Balance before","Balance after""#
        );
        assert_eq!(lines[1], r#""2026-03-14 09:26:53","2","10","Win","100","108""#);
    }

    #[test]
    fn test_csv_empty_history() {
        assert_eq!(to_csv(&[]), "");
    }

    #[test]
    fn test_period_summary() {
        let records = [
            SpinRecord::new("p", "s", 1.0, 0.0),
            SpinRecord::new("p", "s", 1.0, 12.0),
            SpinRecord::new("p", "s", 2.0, 3.0),
        ];
        let summary = PeriodSummary::from_records(7, &records);
        assert_eq!(summary.total_spins, 3);
        assert_eq!(summary.total_wins, 2);
        assert_eq!(summary.biggest_win, 12.0);
        assert_eq!(summary.total_bet_amount, 4.0);
    }
}
