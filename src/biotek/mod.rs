//! # Plate-Reader Export Parser
//!
//! Streaming parser for BioTek Gen5 kinetic exports saved as CSV. The export
//! is human-oriented: an instrument preamble, a header describing each read
//! and its filter sets, a plate layout and then one block per read:
//!
//! ```text
//! Reader Serial Number:,268449
//! Read,GFP
//! ,Filter Set 1
//! ,"Excitation: 485/20,  Emission: 528/20"
//! ,"Optics: Top,  Gain: 61"
//! Layout
//! GFP:485,528
//!
//! ,Time,T° GFP:485,528,A1,A2
//! ,0:00:00,37,1517,OVRFLW
//! ,0:15:00,37,1600,
//! ```
//!
//! The scanner moves forward through three states (preamble, header, data
//! blocks) and never rewinds. Rows are produced one data line at a time, so
//! memory stays bounded by the width of one line regardless of file size.

mod block;
mod error;
mod header;
mod iterators;


use std::collections::{HashSet, VecDeque};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{StringRecord, StringRecordsIntoIter};

use crate::calibration::{CalibrationTable, PlateReader};
use crate::channel::ChannelNameResolver;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::metadata::SupplementaryMetadata;
use crate::table::{TidyRow, Units};

pub use block::{BlockHeader, BlockKind, RawReading};
pub use error::ParseError;
pub use header::{ReadSetting, ReadSettings, ENDPOINT_READ_NAME};
pub use iterators::RowIterator;

use block::{parse_block_header, parse_timestamp, FIRST_WELL_COLUMN};
use header::{parse_gain, parse_wavelengths, read_name};

/// Reaction volume assumed when none is given, in microliters
pub const DEFAULT_VOLUME_UL: f64 = 10.0;

const SERIAL_NUMBER_LABEL: &str = "Reader Serial Number:";
const READ_LABEL: &str = "Read";
const LAYOUT_LABEL: &str = "Layout";
const RESULTS_LABEL: &str = "Results";
const FILTER_SET_PREFIX: &str = "Filter Set";

/// Scanner position within the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for the serial number and the first read
    Preamble,
    /// Collecting filter sets until the layout marker
    HeaderBlock {
        /// Read the next filter set belongs to
        read_name: String,
    },
    /// Reading data blocks
    DataBlocks,
    /// Input exhausted
    Finished,
}

/// Everything learned from the header, threaded through the data blocks
#[derive(Debug, Clone, Default)]
pub struct ExportContext {
    /// Serial number as printed, if any
    pub serial: Option<String>,
    /// Resolved reader; `None` disables molar conversion
    pub instrument: Option<PlateReader>,
    /// Filter sets per read name
    pub read_settings: ReadSettings,
}

/// Block currently being read
#[derive(Debug, Clone)]
struct ActiveBlock {
    header: BlockHeader,
    /// Canonical fluorophore for calibration (fluorescence only)
    fluorophore: Option<String>,
    /// Well names per column index
    wells: Vec<String>,
}

/// Running totals for one parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Data blocks read
    pub blocks_read: usize,
    /// Tidy rows produced
    pub rows_emitted: usize,
    /// Readings dropped for lack of metadata
    pub rows_dropped: usize,
}

/// Streaming parser over a plate-reader export
pub struct PlateReaderStreamer<R: Read> {
    records: StringRecordsIntoIter<R>,
    state: ScanState,
    context: ExportContext,
    block: Option<ActiveBlock>,
    pushback: Option<StringRecord>,
    pending: VecDeque<TidyRow>,
    metadata: Option<SupplementaryMetadata>,
    volume_ul: f64,
    calibration: CalibrationTable,
    resolver: ChannelNameResolver,
    diagnostics: Diagnostics,
    warned_wells: HashSet<String>,
    stats: ParseStats,
}

impl PlateReaderStreamer<BufReader<File>> {
    /// Open an export file for streaming
    pub fn open<P: AsRef<Path>>(path: P, volume_ul: f64) -> Result<Self, ParseError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::with_capacity(64 * 1024, file), volume_ul))
    }
}

impl<R: Read> PlateReaderStreamer<R> {
    /// Create a streamer from any reader. `volume_ul` must be positive.
    pub fn new(reader: R, volume_ul: f64) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();

        Self {
            records,
            state: ScanState::Preamble,
            context: ExportContext::default(),
            block: None,
            pushback: None,
            pending: VecDeque::new(),
            metadata: None,
            volume_ul,
            calibration: CalibrationTable,
            resolver: ChannelNameResolver,
            diagnostics: Diagnostics::new(),
            warned_wells: HashSet::new(),
            stats: ParseStats::default(),
        }
    }

    /// Join rows against supplementary metadata, dropping uncovered wells
    pub fn with_metadata(mut self, metadata: SupplementaryMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Supplementary metadata columns, in load order
    pub fn metadata_columns(&self) -> Vec<String> {
        self.metadata
            .as_ref()
            .map(|m| m.columns().to_vec())
            .unwrap_or_default()
    }

    /// Current scanner state
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Header information gathered so far
    pub fn context(&self) -> &ExportContext {
        &self.context
    }

    /// Warnings raised so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Counters so far
    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Consume the streamer, returning its warnings
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Iterate over all tidy rows
    pub fn rows(self) -> RowIterator<R> {
        RowIterator {
            streamer: self,
            failed: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<StringRecord>, ParseError> {
        if let Some(record) = self.pushback.take() {
            return Ok(Some(record));
        }
        match self.records.next() {
            Some(record) => Ok(Some(record?)),
            None => Ok(None),
        }
    }

    /// Scan the preamble and header, stopping at the layout marker.
    ///
    /// Called implicitly by [`next_row`](Self::next_row); call it directly to
    /// inspect the instrument and read settings before any data is read.
    pub fn read_header(&mut self) -> Result<&ExportContext, ParseError> {
        loop {
            if matches!(self.state, ScanState::DataBlocks | ScanState::Finished) {
                break;
            }
            let record = match self.next_record()? {
                Some(record) => record,
                None => {
                    self.state = ScanState::Finished;
                    break;
                }
            };
            let label = record.get(0).unwrap_or("").trim();

            if label == LAYOUT_LABEL {
                log::debug!("Entering data blocks at line {}", header::line_number(&record));
                self.state = ScanState::DataBlocks;
                continue;
            }
            if label == READ_LABEL {
                let name = read_name(record.get(1).unwrap_or(""));
                log::debug!("Found read '{}'", name);
                self.state = ScanState::HeaderBlock { read_name: name };
                continue;
            }

            match self.state.clone() {
                ScanState::Preamble => {
                    if label == SERIAL_NUMBER_LABEL {
                        self.resolve_instrument(record.get(1).unwrap_or(""));
                    }
                }
                ScanState::HeaderBlock { read_name } => {
                    if record.get(1).unwrap_or("").starts_with(FILTER_SET_PREFIX) {
                        self.read_filter_set(read_name)?;
                    }
                }
                ScanState::DataBlocks | ScanState::Finished => {}
            }
        }

        log::info!(
            "Parsed export header: instrument {}, {} filter sets",
            self.context
                .instrument
                .map(|i| i.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            self.context.read_settings.len()
        );
        Ok(&self.context)
    }

    fn resolve_instrument(&mut self, serial: &str) {
        let serial = serial.trim();
        self.context.serial = Some(serial.to_string());
        self.context.instrument = PlateReader::from_serial(serial);
        if self.context.instrument.is_none() {
            self.diagnostics.push(
                DiagnosticKind::UnknownInstrument,
                format!(
                    "Unknown plate reader id '{}'; will not attempt to calculate molar concentrations",
                    serial
                ),
                serial,
            );
        }
    }

    fn read_filter_set(&mut self, read_name: String) -> Result<(), ParseError> {
        let wavelengths = self
            .next_record()?
            .ok_or_else(|| ParseError::UnexpectedEof(format!("filter set of read '{}'", read_name)))?;
        let (excitation, emission) = parse_wavelengths(&wavelengths)?;

        let gain_line = self
            .next_record()?
            .ok_or_else(|| ParseError::UnexpectedEof(format!("gain of read '{}'", read_name)))?;
        let gain = parse_gain(&gain_line)?;

        log::debug!(
            "Read '{}': excitation {} nm, emission {} nm, gain {}",
            read_name,
            excitation,
            emission,
            gain
        );
        self.context.read_settings.push(ReadSetting {
            name: read_name,
            excitation,
            emission,
            gain,
        });
        Ok(())
    }

    /// Find the next block header and consume its separator and title lines.
    fn open_block(&mut self) -> Result<bool, ParseError> {
        let record = loop {
            match self.next_record()? {
                None => return Ok(false),
                Some(record) => {
                    let label = record.get(0).unwrap_or("").trim();
                    if label.is_empty() || label == LAYOUT_LABEL || label == RESULTS_LABEL {
                        continue;
                    }
                    break record;
                }
            }
        };

        let header = parse_block_header(&record, &self.context.read_settings)?;
        let fluorophore = match header.kind {
            BlockKind::Fluorescence => Some(self.resolver.resolve_or_warn(&header.channel, &mut self.diagnostics)),
            BlockKind::Absorbance => None,
        };

        // One separator line precedes the title; the CSV layer drops it when
        // it has no delimiters at all.
        let missing_title = || ParseError::UnexpectedEof(format!("block '{}' has no title line", header.channel));
        let mut title = self.next_record()?.ok_or_else(missing_title)?;
        if is_blank_line(&title) {
            title = self.next_record()?.ok_or_else(missing_title)?;
        }
        let wells: Vec<String> = title.iter().map(|c| c.trim().to_string()).collect();
        if wells.iter().skip(FIRST_WELL_COLUMN).all(|w| w.is_empty()) {
            return Err(ParseError::structural(&title, "block title line names no wells"));
        }

        log::debug!(
            "Reading block '{}' (gain {}, {}/{} nm)",
            header.channel,
            header.gain,
            header.excitation,
            header.emission
        );
        self.stats.blocks_read += 1;
        self.block = Some(ActiveBlock {
            header,
            fluorophore,
            wells,
        });
        Ok(true)
    }

    /// Turn one data line into rows; returns false at the end of the block.
    fn read_data_line(&mut self, record: StringRecord) -> Result<bool, ParseError> {
        if !record.get(0).unwrap_or("").trim().is_empty() {
            // Next block header, reached without a separator
            self.pushback = Some(record);
            return Ok(false);
        }
        let record = &record;
        let time_cell = record.get(1).unwrap_or("").trim();
        if time_cell.is_empty() {
            return Ok(false);
        }
        let time_sec = parse_timestamp(time_cell)
            .ok_or_else(|| ParseError::structural(record, "time must be HH:MM:SS"))?;
        let time_hr = time_sec as f64 / 3600.0;

        let block = match &self.block {
            Some(block) => block,
            None => return Ok(false),
        };

        for (i, cell) in record.iter().enumerate().skip(FIRST_WELL_COLUMN) {
            if cell.trim().is_empty() {
                continue;
            }
            let well = block
                .wells
                .get(i)
                .filter(|w| !w.is_empty())
                .ok_or_else(|| ParseError::structural(record, "reading has no well in the title line"))?;
            let raw = RawReading::parse(cell)
                .ok_or_else(|| ParseError::structural(record, "reading is not numeric"))?
                .as_f64();

            let extra = match &self.metadata {
                Some(metadata) => match metadata.for_well(well) {
                    Some(extra) => extra,
                    None => {
                        self.stats.rows_dropped += 1;
                        if self.warned_wells.insert(well.clone()) {
                            self.diagnostics.push(
                                DiagnosticKind::MissingMetadata,
                                format!(
                                    "No supplementary data for well {}; throwing out data for that well",
                                    well
                                ),
                                well.clone(),
                            );
                        }
                        continue;
                    }
                },
                None => Default::default(),
            };

            let (measurement, units) = match (&block.header.kind, &block.fluorophore) {
                (BlockKind::Absorbance, _) => (raw, Units::Absorbance),
                (BlockKind::Fluorescence, fluorophore) => {
                    let converted = fluorophore.as_deref().and_then(|name| {
                        self.calibration.convert(
                            raw,
                            name,
                            self.context.instrument,
                            block.header.gain,
                            self.volume_ul,
                        )
                    });
                    match converted {
                        Some(um) => (um, Units::Micromolar),
                        None => (raw, Units::Afu),
                    }
                }
            };

            self.pending.push_back(TidyRow {
                channel: block.header.channel.clone(),
                gain: block.header.gain,
                time_sec: time_sec as f64,
                time_hr,
                well: well.clone(),
                measurement,
                units: units.as_str().to_string(),
                excitation: block.header.excitation,
                emission: block.header.emission,
                extra,
            });
        }
        Ok(true)
    }

    /// Get the next tidy row, or `None` at the end of the export
    pub fn next_row(&mut self) -> Result<Option<TidyRow>, ParseError> {
        if matches!(self.state, ScanState::Preamble | ScanState::HeaderBlock { .. }) {
            self.read_header()?;
        }

        loop {
            if let Some(row) = self.pending.pop_front() {
                self.stats.rows_emitted += 1;
                return Ok(Some(row));
            }
            if self.state == ScanState::Finished {
                return Ok(None);
            }

            if self.block.is_none() && !self.open_block()? {
                log::info!(
                    "Finished export: {} blocks, {} rows",
                    self.stats.blocks_read,
                    self.stats.rows_emitted
                );
                self.state = ScanState::Finished;
                continue;
            }

            match self.next_record()? {
                Some(record) => {
                    if !self.read_data_line(record)? {
                        self.block = None;
                    }
                }
                None => {
                    self.block = None;
                    self.state = ScanState::Finished;
                }
            }
        }
    }
}

/// Separator lines that still carry delimiters
fn is_blank_line(record: &StringRecord) -> bool {
    record.iter().all(|c| c.trim().is_empty())
}
