//! Cable modem adapter that scrapes the status page's channel tables.
//!
//! The status page carries one `simpleTable` per direction. Each table starts
//! with a title row ("Downstream Bonded Channels", "Upstream Bonded
//! Channels"), then a header row naming the columns, then one row per locked
//! channel. Column order has moved between firmware releases, so cells are
//! always looked up by header name.
//!
//! ## Metrics Collected
//!
//! - **Downstream** (16 slots): power (dBmV), SNR (dB), corrected and
//!   uncorrectable codeword counters
//! - **Upstream** (4 slots): power (dBmV)
//! - **Totals**: corrected and uncorrectable counters summed over all
//!   downstream channels
//!
//! Channels the modem does not report are still present in the observation,
//! as unavailable samples.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

pub use muninprobe_types::layout::modem::*;
use muninprobe_types::{ChannelSlots, Observation, Sample};

use crate::reconcile::{reconcile, unsigned_counter, ErrorTotals};
use crate::AdapterError;

/// Factory-default management address.
pub const DEFAULT_ADDRESS: &str = "192.168.100.1";

/// Path of the connection status page.
pub const STATUS_PATH: &str = "/RgConnect.asp";

const TABLE_CLASS: &str = "simpleTable";

/// Modem adapter for one device.
#[derive(Debug, Clone)]
pub struct ModemAdapter {
    client: Client,
    url: String,
}

impl ModemAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> ModemAdapterBuilder {
        ModemAdapterBuilder::default()
    }

    /// The status page URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the status page and normalize it into an observation.
    pub async fn collect(&self) -> Result<Observation, AdapterError> {
        let page = self.fetch_page().await?;
        let status = parse_status_page(&page)?;
        Ok(status.to_observation())
    }

    /// Check that the device answers the status page with HTTP 200.
    pub async fn probe(&self) -> Result<(), AdapterError> {
        let response = self.client.get(&self.url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(AdapterError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn fetch_page(&self) -> Result<String, AdapterError> {
        debug!("requesting modem status page {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(AdapterError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Builder for ModemAdapter.
#[derive(Debug, Default)]
pub struct ModemAdapterBuilder {
    address: Option<String>,
    url: Option<String>,
    timeout: Option<Duration>,
}

impl ModemAdapterBuilder {
    /// Set the device address (default: [`DEFAULT_ADDRESS`]).
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the full status page URL, overriding the address.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the connect and request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the adapter.
    pub fn build(self) -> Result<ModemAdapter, AdapterError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        let url = self.url.unwrap_or_else(|| {
            let address = self.address.as_deref().unwrap_or(DEFAULT_ADDRESS);
            format!("http://{address}{STATUS_PATH}")
        });

        Ok(ModemAdapter { client, url })
    }
}

/// One downstream row.
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamChannel {
    pub channel: u32,
    pub power: Option<f64>,
    pub snr: Option<f64>,
    pub corrected: Option<u32>,
    pub uncorrected: Option<u32>,
}

/// One upstream row.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamChannel {
    pub channel: u32,
    pub power: Option<f64>,
}

/// Everything parsed from one status page.
#[derive(Debug, Clone, PartialEq)]
pub struct ModemStatus {
    pub downstream: ChannelSlots<DownstreamChannel>,
    pub upstream: ChannelSlots<UpstreamChannel>,
    pub totals: ErrorTotals,
}

impl ModemStatus {
    /// Flatten into observation fields, one per channel attribute.
    ///
    /// Empty slots produce explicit unavailable samples so every declared
    /// series has a field.
    pub fn to_observation(&self) -> Observation {
        let mut observation = Observation::new();

        for (index, row) in self.downstream.iter() {
            let f = |attr| field(DOWNSTREAM_PREFIX, index, attr);
            observation.insert(f(POWER), Sample::from(row.and_then(|r| r.power)));
            observation.insert(f(SNR), Sample::from(row.and_then(|r| r.snr)));
            observation.insert(
                f(CORRECTED),
                Sample::from(row.and_then(|r| r.corrected).map(u64::from)),
            );
            observation.insert(
                f(UNCORRECTED),
                Sample::from(row.and_then(|r| r.uncorrected).map(u64::from)),
            );
        }

        for (index, row) in self.upstream.iter() {
            observation.insert(
                field(UPSTREAM_PREFIX, index, POWER),
                Sample::from(row.and_then(|r| r.power)),
            );
        }

        observation.insert(total_field(CORRECTED), Sample::Counter(self.totals.corrected));
        observation.insert(
            total_field(UNCORRECTED),
            Sample::Counter(self.totals.uncorrected),
        );

        observation
    }
}

/// Parse the status page into reconciled channel slots.
///
/// Both channel tables are required; a page missing either one is a parse
/// error.
pub fn parse_status_page(html: &str) -> Result<ModemStatus, AdapterError> {
    let cleaned = strip_scripts_and_comments(html);
    let document = Html::parse_document(&cleaned);
    let tables = channel_tables(&document)?;

    let downstream_table = tables
        .iter()
        .find(|t| t.direction == Some(Direction::Downstream))
        .ok_or_else(|| AdapterError::Parse("downstream channel table not found".to_string()))?;
    let upstream_table = tables
        .iter()
        .find(|t| t.direction == Some(Direction::Upstream))
        .ok_or_else(|| AdapterError::Parse("upstream channel table not found".to_string()))?;

    let downstream_rows = downstream_table
        .rows()
        .map(|row| {
            Ok(DownstreamChannel {
                channel: channel_index(&row)?,
                power: row.number("Power"),
                snr: row.number("SNR"),
                corrected: row.counter("Corrected"),
                uncorrected: row.counter("Uncorrectables"),
            })
        })
        .collect::<Result<Vec<_>, AdapterError>>()?;

    let upstream_rows = upstream_table
        .rows()
        .map(|row| {
            Ok(UpstreamChannel {
                channel: channel_index(&row)?,
                power: row.number("Power"),
            })
        })
        .collect::<Result<Vec<_>, AdapterError>>()?;

    let downstream = reconcile(DOWNSTREAM_CHANNELS, downstream_rows, |r| Ok(r.channel))?;
    let upstream = reconcile(UPSTREAM_CHANNELS, upstream_rows, |r| Ok(r.channel))?;

    let mut totals = ErrorTotals::new();
    for row in downstream.populated() {
        totals.add(row.corrected, row.uncorrected);
    }

    debug!(
        downstream = downstream.populated_count(),
        upstream = upstream.populated_count(),
        "reconciled modem channels"
    );

    Ok(ModemStatus {
        downstream,
        upstream,
        totals,
    })
}

fn channel_index(row: &Row<'_>) -> Result<u32, AdapterError> {
    let cell = row
        .get("Channel")
        .ok_or_else(|| AdapterError::Parse("row without a Channel cell".to_string()))?;
    unsigned_counter(cell)
}

/// Remove inline scripts and comments, which the firmware emits in forms
/// that confuse HTML parsers.
fn strip_scripts_and_comments(html: &str) -> std::borrow::Cow<'_, str> {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    let noise = NOISE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script\s*>|<!--.*?-->").expect("static pattern compiles")
    });
    noise.replace_all(html, "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Downstream,
    Upstream,
}

/// A channel table reduced to text cells.
#[derive(Debug)]
struct Table {
    direction: Option<Direction>,
    header: Vec<String>,
    body: Vec<Vec<String>>,
}

impl Table {
    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.body.iter().map(|cells| Row {
            header: &self.header,
            cells,
        })
    }
}

/// A data row whose cells are addressed by header name.
#[derive(Debug)]
struct Row<'a> {
    header: &'a [String],
    cells: &'a [String],
}

impl Row<'_> {
    fn get(&self, column: &str) -> Option<&str> {
        let position = self
            .header
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))?;
        self.cells.get(position).map(String::as_str)
    }

    /// Leading number of a cell such as `"5.8 dBmV"`.
    fn number(&self, column: &str) -> Option<f64> {
        let value = self.get(column)?.split_whitespace().next()?.parse().ok();
        if value.is_none() {
            warn!(column, "unparsable numeric cell");
        }
        value
    }

    fn counter(&self, column: &str) -> Option<u32> {
        unsigned_counter(self.get(column)?).ok()
    }
}

fn selector(css: &str) -> Result<Selector, AdapterError> {
    Selector::parse(css).map_err(|e| AdapterError::Parse(format!("selector {css}: {e:?}")))
}

fn channel_tables(document: &Html) -> Result<Vec<Table>, AdapterError> {
    let table_sel = selector(&format!("table.{TABLE_CLASS}"))?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("th, td")?;

    let mut tables = Vec::new();
    for table in document.select(&table_sel) {
        let mut title = None;
        let mut header = None;
        let mut body = Vec::new();

        for row in table.select(&row_sel) {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
            if cells.is_empty() {
                continue;
            }
            let texts: Vec<String> = cells.iter().map(|c| cell_text(c)).collect();

            if header.is_none() && title.is_none() && is_title_row(&cells, &texts) {
                title = Some(texts.join(" "));
            } else if header.is_none() {
                header = Some(texts);
            } else {
                body.push(texts);
            }
        }

        let Some(header) = header else {
            continue;
        };
        let direction = classify(title.as_deref(), &header);
        tables.push(Table {
            direction,
            header,
            body,
        });
    }

    Ok(tables)
}

/// A title row is a heading cell spanning the table, or heading cells that
/// name no channel column. Header rows written with `<th>` are not titles.
fn is_title_row(cells: &[ElementRef<'_>], texts: &[String]) -> bool {
    if !cells.iter().any(|c| c.value().name() == "th") {
        return false;
    }
    cells.len() == 1 || !texts.iter().any(|t| t.eq_ignore_ascii_case("Channel"))
}

fn classify(title: Option<&str>, header: &[String]) -> Option<Direction> {
    if let Some(title) = title.map(str::to_ascii_lowercase) {
        if title.contains("downstream") {
            return Some(Direction::Downstream);
        }
        if title.contains("upstream") {
            return Some(Direction::Upstream);
        }
    }
    // untitled tables: only downstream tables carry error counters
    let has = |name: &str| header.iter().any(|h| h.eq_ignore_ascii_case(name));
    if has("Channel") && has("Power") {
        if has("SNR") {
            return Some(Direction::Downstream);
        }
        return Some(Direction::Upstream);
    }
    None
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downstream_row(channel: i64, power: &str, snr: &str, corr: &str, uncorr: &str) -> String {
        format!(
            "<tr><td>{channel}</td><td>Locked</td><td>QAM256</td><td>{}</td>\
             <td>597000000 Hz</td><td>{power}</td><td>{snr}</td><td>{corr}</td><td>{uncorr}</td></tr>",
            channel + 12
        )
    }

    fn page(down_rows: &str, up_rows: &str) -> String {
        format!(
            r#"<html><head>
            <script language="javascript">
              if (a < b && <!-- weird ) {{ document.write("<table>"); }}
            </script>
            </head><body>
            <!-- status tables follow </table> -->
            <table class="simpleTable">
              <tr><th colspan=9><strong>Downstream Bonded Channels</strong></th></tr>
              <tr><td><strong>Channel</strong></td><td><strong>Lock Status</strong></td>
                  <td><strong>Modulation</strong></td><td><strong>Channel ID</strong></td>
                  <td><strong>Frequency</strong></td><td><strong>Power</strong></td>
                  <td><strong>SNR</strong></td><td><strong>Corrected</strong></td>
                  <td><strong>Uncorrectables</strong></td></tr>
              {down_rows}
            </table>
            <table class="simpleTable">
              <tr><th colspan=7><strong>Upstream Bonded Channels</strong></th></tr>
              <tr><td><strong>Channel</strong></td><td><strong>Lock Status</strong></td>
                  <td><strong>US Channel Type</strong></td><td><strong>Channel ID</strong></td>
                  <td><strong>Symbol Rate</strong></td><td><strong>Frequency</strong></td>
                  <td><strong>Power</strong></td></tr>
              {up_rows}
            </table>
            </body></html>"#
        )
    }

    fn upstream_rows(count: u32) -> String {
        (1..=count)
            .map(|i| {
                format!(
                    "<tr><td>{i}</td><td>Locked</td><td>ATDMA</td><td>{i}</td>\
                     <td>5120 Ksym/sec</td><td>36700000 Hz</td><td>4{i}.0 dBmV</td></tr>"
                )
            })
            .collect()
    }

    #[test]
    fn test_builder_defaults() {
        let adapter = ModemAdapter::builder().build().unwrap();
        assert_eq!(adapter.url(), "http://192.168.100.1/RgConnect.asp");
    }

    #[test]
    fn test_builder_address_and_url() {
        let adapter = ModemAdapter::builder().address("10.0.0.1").build().unwrap();
        assert_eq!(adapter.url(), "http://10.0.0.1/RgConnect.asp");

        let adapter = ModemAdapter::builder()
            .address("10.0.0.1")
            .url("http://modem.lan/status.html")
            .build()
            .unwrap();
        assert_eq!(adapter.url(), "http://modem.lan/status.html");
    }

    #[test]
    fn test_partial_downstream_fills_sixteen_slots() {
        let down: String = (1..=10)
            .map(|i| downstream_row(i, "5.8 dBmV", "40.9 dB", "15", "0"))
            .collect();
        let status = parse_status_page(&page(&down, &upstream_rows(4))).unwrap();

        assert_eq!(status.downstream.len(), DOWNSTREAM_CHANNELS);
        assert_eq!(status.downstream.populated_count(), 10);
        assert!((11..=16).all(|i| status.downstream.get(i).is_none()));
        assert_eq!(status.upstream.populated_count(), 4);

        let first = status.downstream.get(1).unwrap();
        assert_eq!(first.power, Some(5.8));
        assert_eq!(first.snr, Some(40.9));
        assert_eq!(first.corrected, Some(15));
        assert_eq!(status.totals.corrected, 150);
        assert_eq!(status.totals.uncorrected, 0);
    }

    #[test]
    fn test_observation_covers_every_slot() {
        let down: String = (1..=10)
            .map(|i| downstream_row(i, "5.8 dBmV", "40.9 dB", "15", "0"))
            .collect();
        let obs = parse_status_page(&page(&down, &upstream_rows(2)))
            .unwrap()
            .to_observation();

        // 16 * 4 downstream + 4 upstream + 2 totals
        assert_eq!(obs.len(), 16 * 4 + 4 + 2);
        assert_eq!(obs.get("down_01.power"), Sample::Gauge(5.8));
        assert_eq!(obs.get("down_10.corrected"), Sample::Counter(15));
        assert_eq!(obs.get("down_11.power"), Sample::Unavailable);
        assert_eq!(obs.get("down_16.uncorrected"), Sample::Unavailable);
        assert_eq!(obs.get("up_02.power"), Sample::Gauge(42.0));
        assert_eq!(obs.get("up_03.power"), Sample::Unavailable);
        assert_eq!(obs.get("total.corrected"), Sample::Counter(150));
    }

    #[test]
    fn test_columns_located_by_header_name() {
        let html = r#"
            <table class="simpleTable">
              <tr><th>Downstream Bonded Channels</th></tr>
              <tr><td>SNR</td><td>Uncorrectables</td><td>Channel</td><td>Power</td><td>Corrected</td></tr>
              <tr><td>38.2 dB</td><td>7</td><td>2</td><td>-1.5 dBmV</td><td>99</td></tr>
            </table>
            <table class="simpleTable">
              <tr><th>Upstream Bonded Channels</th></tr>
              <tr><td>Power</td><td>Channel</td></tr>
              <tr><td>44.25 dBmV</td><td>1</td></tr>
            </table>"#;
        let status = parse_status_page(html).unwrap();

        let row = status.downstream.get(2).unwrap();
        assert_eq!(row.snr, Some(38.2));
        assert_eq!(row.power, Some(-1.5));
        assert_eq!(row.corrected, Some(99));
        assert_eq!(row.uncorrected, Some(7));
        assert_eq!(status.upstream.get(1).unwrap().power, Some(44.25));
    }

    #[test]
    fn test_untitled_tables_with_heading_cells() {
        let html = r#"
            <table class="simpleTable">
              <tr><th>Channel</th><th>Power</th><th>SNR</th><th>Corrected</th><th>Uncorrectables</th></tr>
              <tr><td>1</td><td>3.2 dBmV</td><td>41.0 dB</td><td>5</td><td>1</td></tr>
              <tr><td>2</td><td>2.9 dBmV</td><td>40.5 dB</td><td>6</td><td>0</td></tr>
            </table>
            <table class="simpleTable">
              <tr><th>Channel</th><th>Power</th></tr>
              <tr><td>1</td><td>45.0 dBmV</td></tr>
            </table>"#;
        let status = parse_status_page(html).unwrap();

        assert_eq!(status.downstream.populated_count(), 2);
        assert_eq!(status.downstream.get(1).unwrap().power, Some(3.2));
        assert_eq!(status.downstream.get(2).unwrap().snr, Some(40.5));
        assert_eq!(status.upstream.populated_count(), 1);
        assert_eq!(status.upstream.get(1).unwrap().power, Some(45.0));
        assert_eq!(status.totals.corrected, 11);
    }

    #[test]
    fn test_negative_counters_reinterpreted() {
        let down = downstream_row(1, "1.0 dBmV", "39.0 dB", "-1", "-2");
        let status = parse_status_page(&page(&down, "")).unwrap();

        let row = status.downstream.get(1).unwrap();
        assert_eq!(row.corrected, Some(4294967295));
        assert_eq!(row.uncorrected, Some(4294967294));
        assert_eq!(status.totals.corrected, 4294967295);
    }

    #[test]
    fn test_unparsable_cells_become_unavailable() {
        let down = downstream_row(3, "----", "n/a", "", "12");
        let status = parse_status_page(&page(&down, "")).unwrap();

        let row = status.downstream.get(3).unwrap();
        assert_eq!(row.power, None);
        assert_eq!(row.snr, None);
        assert_eq!(row.corrected, None);
        assert_eq!(row.uncorrected, Some(12));
    }

    #[test]
    fn test_channel_out_of_range_is_parse_error() {
        let down = downstream_row(17, "1.0 dBmV", "39.0 dB", "0", "0");
        let err = parse_status_page(&page(&down, "")).unwrap_err();
        assert!(err.is_parse());

        let down = downstream_row(0, "1.0 dBmV", "39.0 dB", "0", "0");
        let err = parse_status_page(&page(&down, "")).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_missing_tables_is_parse_error() {
        let err = parse_status_page("<html><body><p>Login required</p></body></html>").unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("downstream"));
    }

    #[test]
    fn test_strip_scripts_and_comments() {
        let html = "a<script>x < y</script>b<!-- c -->d<SCRIPT type=\"t\">\n</SCRIPT>e";
        assert_eq!(strip_scripts_and_comments(html), "abde");
    }

    #[tokio::test]
    async fn test_unreachable_device_is_fetch_error() {
        let adapter = ModemAdapter::builder()
            .url("http://127.0.0.1:9/RgConnect.asp")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        assert!(adapter.collect().await.unwrap_err().is_fetch());
        assert!(adapter.probe().await.unwrap_err().is_fetch());
    }
}
