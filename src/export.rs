use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::data::model::{DHI, DNI, GHI, RH, SITE, SolarTable, TAMB, TIMESTAMP, WS};

/// Columns shown in the raw data view and written on export, in order.
pub const DISPLAY_COLUMNS: [&str; 8] = [SITE, TIMESTAMP, GHI, DNI, DHI, TAMB, RH, WS];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The display columns present in `table`.
pub fn display_columns(table: &SolarTable) -> Vec<&'static str> {
    DISPLAY_COLUMNS
        .into_iter()
        .filter(|&c| match c {
            SITE => true,
            TIMESTAMP => table.has_timestamp(),
            other => table.has_column(other),
        })
        .collect()
}

/// Text of one display cell; missing values are empty.
pub fn cell_text(table: &SolarTable, column: &str, row: usize) -> String {
    match column {
        SITE => table.sites[row].label().to_string(),
        TIMESTAMP => table
            .timestamp(row)
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default(),
        other => table
            .column(other)
            .and_then(|c| c.values[row])
            .map(|v| v.to_string())
            .unwrap_or_default(),
    }
}

/// Write the display columns of `table` as CSV, header first.
pub fn write_csv<W: Write>(table: &SolarTable, writer: W) -> Result<()> {
    let columns = display_columns(table);
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&columns).context("writing CSV header")?;
    for row in 0..table.len() {
        out.write_record(columns.iter().map(|c| cell_text(table, c, row)))
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    out.flush().context("flushing CSV")?;
    Ok(())
}

/// Suggested download name, e.g. `solar_data_Sierra_Leone_20240131.csv`.
pub fn export_file_name(selection: &str, date: NaiveDate) -> String {
    format!(
        "solar_data_{}_{}.csv",
        selection.replace(' ', "_"),
        date.format("%Y%m%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{BP, NumericColumn, Site};

    #[test]
    fn writes_display_columns_only() {
        let ts = NaiveDate::from_ymd_opt(2021, 8, 9).and_then(|d| d.and_hms_opt(10, 30, 0));
        let table = SolarTable::for_site(
            Site::SierraLeone,
            Some(vec![ts, None]),
            vec![
                NumericColumn::new(BP, vec![Some(1000.0), Some(1001.0)]),
                NumericColumn::new(GHI, vec![Some(512.5), None]),
                NumericColumn::new(TAMB, vec![Some(26.0), Some(27.5)]),
            ],
        )
        .unwrap();

        let mut buf = Vec::new();
        write_csv(&table, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Site,Timestamp,GHI,Tamb\n\
             Sierra Leone,2021-08-09 10:30:00,512.5,26\n\
             Sierra Leone,,,27.5\n"
        );
    }

    #[test]
    fn file_name_replaces_spaces_and_stamps_the_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            export_file_name("Sierra Leone", date),
            "solar_data_Sierra_Leone_20240131.csv"
        );
        assert_eq!(
            export_file_name("All Sites", date),
            "solar_data_All_Sites_20240131.csv"
        );
    }
}
